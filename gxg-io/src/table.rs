//! Delimited table loader.
//!
//! Reads a phenotype, SNV, covariate or ancestry-PC file into a
//! [`RawTable`]. The separator and the header layout are resolved by
//! ordered lists of named strategies; the strategy that wins is logged
//! so a surprising parse can be traced back without a debugger.
//!
//! The first column of every table is treated as its row identifier.
//! It stays in `columns` (callers decide whether to skip it) and its raw
//! text is kept in `row_ids` for sample auditing.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info};

use gxg_linalg::DenseMatrix;

use crate::error::InputError;

/// Tokens treated as a missing value.
const MISSING_TOKENS: &[&str] = &["NA", "na", "Na", "NaN", "nan", ".", "-", ""];

/// Separators tried, in order, when no delimiter is given.
const CANDIDATE_DELIMITERS: &[u8] = b",\t;|";

/// Number of lines sampled for delimiter detection.
const SNIFF_LINES: usize = 5;

/// Name given to an unnamed identifier column, as written by
/// `DataFrame.to_csv()` and `write.csv`.
pub const UNNAMED_INDEX_COLUMN: &str = "Unnamed: 0";

/// A single parsed cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    fn parse(s: &str) -> Cell {
        let s = s.trim();
        if MISSING_TOKENS.contains(&s) {
            return Cell::Missing;
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Cell::Number(v),
            _ => Cell::Text(s.to_string()),
        }
    }
}

/// Field separator of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// A single-byte separator, parsed with quoting rules.
    Char(u8),
    /// Runs of spaces and tabs.
    Whitespace,
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Char(b'\t') => write!(f, "tab"),
            Delimiter::Char(c) => write!(f, "'{}'", *c as char),
            Delimiter::Whitespace => write!(f, "whitespace"),
        }
    }
}

impl FromStr for Delimiter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "\t" | "\\t" | "tab" => Ok(Delimiter::Char(b'\t')),
            " " | "whitespace" | "\\s+" => Ok(Delimiter::Whitespace),
            _ if s.len() == 1 && s.is_ascii() => Ok(Delimiter::Char(s.as_bytes()[0])),
            _ => Err(format!(
                "unsupported separator '{}': expected a single character, 'tab' or 'whitespace'",
                s
            )),
        }
    }
}

/// How the delimiter of a table was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterStrategy {
    /// Supplied by the caller.
    Explicit,
    /// First candidate splitting the sampled lines into one consistent
    /// field count greater than one.
    ConsistentSplit,
    /// Nothing else matched.
    Whitespace,
}

/// Where the header of a table was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLayout {
    /// Names on line one, a `#` line directly below it.
    CommentSecondLine,
    /// Names on line one.
    FirstLine,
    /// Line one is a title; names on line two.
    SecondLine,
}

impl HeaderLayout {
    /// Layouts in the order they are attempted.
    pub const ORDER: [HeaderLayout; 3] = [
        HeaderLayout::CommentSecondLine,
        HeaderLayout::FirstLine,
        HeaderLayout::SecondLine,
    ];

    /// Number of lines preceding the header line.
    pub fn header_offset(self) -> usize {
        match self {
            HeaderLayout::CommentSecondLine | HeaderLayout::FirstLine => 0,
            HeaderLayout::SecondLine => 1,
        }
    }
}

/// A loaded delimited table. Never mutated after loading.
#[derive(Debug, Clone)]
pub struct RawTable {
    path: PathBuf,
    delimiter: Delimiter,
    layout: HeaderLayout,
    columns: Vec<String>,
    row_ids: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    pub fn layout(&self) -> HeaderLayout {
        self.layout
    }

    pub fn header_offset(&self) -> usize {
        self.layout.header_offset()
    }

    /// Column names in file order, identifier column included.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Raw text of the first column for every row.
    pub fn row_ids(&self) -> &[String] {
        &self.row_ids
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.rows[row][col]
    }

    /// Whether every cell of a column holds a number.
    pub fn is_numeric_column(&self, col: usize) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(|r| matches!(r[col], Cell::Number(_)))
    }

    /// Extract a column as numbers, failing on the first missing or
    /// non-numeric cell.
    pub fn numeric_column(&self, col: usize) -> Result<Vec<f64>, InputError> {
        let name = &self.columns[col];
        self.rows
            .iter()
            .enumerate()
            .map(|(i, r)| match &r[col] {
                Cell::Number(v) => Ok(*v),
                Cell::Missing => Err(InputError::MissingValue {
                    column: name.clone(),
                    row: i + 1,
                }),
                Cell::Text(s) => Err(InputError::NonNumeric {
                    column: name.clone(),
                    row: i + 1,
                    value: s.clone(),
                }),
            })
            .collect()
    }

    /// Extract the given columns, in the given order, as an n_rows x k matrix.
    pub fn numeric_matrix(&self, cols: &[usize]) -> Result<DenseMatrix, InputError> {
        let columns = cols
            .iter()
            .map(|&c| self.numeric_column(c))
            .collect::<Result<Vec<_>, _>>()?;
        if columns.is_empty() {
            return Ok(DenseMatrix::zeros(self.n_rows(), 0));
        }
        Ok(DenseMatrix::from_columns(&columns))
    }
}

/// Load a delimited table, detecting the separator when `delimiter` is
/// `None` and the header layout always.
///
/// Files ending in `.gz` are decompressed first. The file handle is
/// released before parsing starts.
pub fn load_table(path: &Path, delimiter: Option<Delimiter>) -> Result<RawTable, InputError> {
    let text = read_text(path)?;
    let lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .collect();
    if lines.is_empty() {
        return Err(InputError::EmptyTable {
            path: path.display().to_string(),
        });
    }

    let (delimiter, strategy) = match delimiter {
        Some(d) => (d, DelimiterStrategy::Explicit),
        None => detect_delimiter(&lines),
    };
    info!(
        "{}: delimiter {} ({:?})",
        path.display(),
        delimiter,
        strategy
    );

    let mut last_failure = String::new();
    for layout in HeaderLayout::ORDER {
        match try_layout(layout, &lines, delimiter) {
            Ok((columns, records)) => {
                info!(
                    "{}: header layout {:?}, {} columns x {} rows",
                    path.display(),
                    layout,
                    columns.len(),
                    records.len()
                );
                let row_ids = records.iter().map(|r| r[0].trim().to_string()).collect();
                let rows = records
                    .iter()
                    .map(|r| r.iter().map(|f| Cell::parse(f)).collect())
                    .collect();
                return Ok(RawTable {
                    path: path.to_path_buf(),
                    delimiter,
                    layout,
                    columns,
                    row_ids,
                    rows,
                });
            }
            Err(reason) => {
                debug!("{}: layout {:?} rejected: {}", path.display(), layout, reason);
                last_failure = reason;
            }
        }
    }

    Err(InputError::data_load(path, last_failure))
}

fn read_text(path: &Path) -> Result<String, InputError> {
    let file = std::fs::File::open(path).map_err(|e| InputError::data_load(path, e))?;
    let mut text = String::new();
    let is_gz = path.extension().is_some_and(|ext| ext == "gz");
    let read = if is_gz {
        flate2::read::MultiGzDecoder::new(file).read_to_string(&mut text)
    } else {
        std::io::BufReader::new(file).read_to_string(&mut text)
    };
    read.map_err(|e| InputError::data_load(path, e))?;
    Ok(text)
}

fn detect_delimiter(lines: &[&str]) -> (Delimiter, DelimiterStrategy) {
    let content: Vec<&str> = lines.iter().copied().filter(|l| !l.starts_with('#')).collect();
    // Skip the first line when possible: it may be a free-text title.
    let sample: &[&str] = if content.len() > 1 {
        &content[1..content.len().min(1 + SNIFF_LINES)]
    } else {
        &content[..]
    };

    for &c in CANDIDATE_DELIMITERS {
        let delim = Delimiter::Char(c);
        if let Ok(records) = split_records(sample, delim) {
            let first = records.first().map_or(0, Vec::len);
            if first > 1 && records.iter().all(|r| r.len() == first) {
                return (delim, DelimiterStrategy::ConsistentSplit);
            }
        }
    }
    (Delimiter::Whitespace, DelimiterStrategy::Whitespace)
}

fn split_records(lines: &[&str], delimiter: Delimiter) -> Result<Vec<Vec<String>>, csv::Error> {
    match delimiter {
        Delimiter::Whitespace => Ok(lines
            .iter()
            .map(|l| l.split_whitespace().map(str::to_string).collect())
            .collect()),
        Delimiter::Char(c) => {
            let joined = lines.join("\n");
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .delimiter(c)
                .flexible(true)
                .trim(csv::Trim::All)
                .from_reader(joined.as_bytes());
            reader
                .records()
                .map(|rec| rec.map(|r| r.iter().map(str::to_string).collect()))
                .collect()
        }
    }
}

type Parsed = (Vec<String>, Vec<Vec<String>>);

fn try_layout(layout: HeaderLayout, lines: &[&str], delimiter: Delimiter) -> Result<Parsed, String> {
    let header_idx = match layout {
        HeaderLayout::CommentSecondLine => {
            if lines.len() < 2 || !lines[1].starts_with('#') {
                return Err("second line is not a comment".to_string());
            }
            0
        }
        HeaderLayout::FirstLine => 0,
        HeaderLayout::SecondLine => {
            if lines.len() < 2 {
                return Err("no second line".to_string());
            }
            1
        }
    };

    let mut header = split_records(&lines[header_idx..=header_idx], delimiter)
        .map_err(|e| e.to_string())?
        .into_iter()
        .next()
        .unwrap_or_default();
    if layout == HeaderLayout::SecondLine {
        if let Some(value) = header.iter().find(|f| matches!(Cell::parse(f), Cell::Number(_))) {
            return Err(format!("line 2 holds data ('{}'), not column names", value));
        }
    }
    if header.first().is_some_and(|name| name.is_empty()) {
        header[0] = UNNAMED_INDEX_COLUMN.to_string();
    }
    validate_header(&header)?;

    let body: Vec<&str> = lines[header_idx + 1..]
        .iter()
        .copied()
        .filter(|l| !l.starts_with('#'))
        .collect();
    let records = split_records(&body, delimiter).map_err(|e| e.to_string())?;
    for (i, rec) in records.iter().enumerate() {
        if rec.len() != header.len() {
            return Err(format!(
                "data row {} has {} fields, header has {}",
                i + 1,
                rec.len(),
                header.len()
            ));
        }
    }
    Ok((header, records))
}

fn validate_header(header: &[String]) -> Result<(), String> {
    if header.is_empty() {
        return Err("empty header".to_string());
    }
    for (i, name) in header.iter().enumerate() {
        if name.is_empty() {
            return Err(format!("header field {} is empty", i + 1));
        }
        if header[..i].contains(name) {
            return Err(format!("duplicate column name '{}'", name));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_cell_parse() {
        assert_eq!(Cell::parse("1.5"), Cell::Number(1.5));
        assert_eq!(Cell::parse(" 2 "), Cell::Number(2.0));
        assert_eq!(Cell::parse("NA"), Cell::Missing);
        assert_eq!(Cell::parse("."), Cell::Missing);
        assert_eq!(Cell::parse(""), Cell::Missing);
        assert_eq!(Cell::parse("S1"), Cell::Text("S1".into()));
        assert_eq!(Cell::parse("inf"), Cell::Text("inf".into()));
    }

    #[test]
    fn test_delimiter_from_str() {
        assert_eq!("\\t".parse::<Delimiter>().unwrap(), Delimiter::Char(b'\t'));
        assert_eq!("tab".parse::<Delimiter>().unwrap(), Delimiter::Char(b'\t'));
        assert_eq!(",".parse::<Delimiter>().unwrap(), Delimiter::Char(b','));
        assert_eq!(" ".parse::<Delimiter>().unwrap(), Delimiter::Whitespace);
        assert!("::".parse::<Delimiter>().is_err());
    }

    #[test]
    fn test_load_tsv_first_line_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "pheno.tsv", "IID\tPhenotype(binary)\nS1\t1\nS2\t0\nS3\tNA\n");
        let table = load_table(&path, None).unwrap();

        assert_eq!(table.delimiter(), Delimiter::Char(b'\t'));
        assert_eq!(table.layout(), HeaderLayout::FirstLine);
        assert_eq!(table.header_offset(), 0);
        assert_eq!(table.columns(), &["IID", "Phenotype(binary)"]);
        assert_eq!(table.row_ids(), &["S1", "S2", "S3"]);
        assert_eq!(table.cell(0, 1), &Cell::Number(1.0));
        assert_eq!(table.cell(2, 1), &Cell::Missing);
    }

    #[test]
    fn test_comment_second_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "pcs.csv",
            "id,PC1,PC2\n# generated by lanc\nA,0.1,0.2\nB,0.3,0.4\n",
        );
        let table = load_table(&path, None).unwrap();
        assert_eq!(table.layout(), HeaderLayout::CommentSecondLine);
        assert_eq!(table.header_offset(), 0);
        assert_eq!(table.columns(), &["id", "PC1", "PC2"]);
        assert_eq!(table.n_rows(), 2);
    }

    #[test]
    fn test_title_line_falls_back_to_second_line_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "pcs.csv",
            "local ancestry pcs\nid,PC1,PC2\nA,0.1,0.2\nB,0.3,0.4\nC,0.5,0.6\n",
        );
        let table = load_table(&path, None).unwrap();
        assert_eq!(table.delimiter(), Delimiter::Char(b','));
        assert_eq!(table.layout(), HeaderLayout::SecondLine);
        assert_eq!(table.header_offset(), 1);
        assert_eq!(table.columns(), &["id", "PC1", "PC2"]);
        assert_eq!(table.numeric_column(2).unwrap(), vec![0.2, 0.4, 0.6]);
    }

    #[test]
    fn test_unnamed_index_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "pcs.csv",
            ",id,PC1,PC2\n0,A,0.1,0.2\n1,B,0.3,0.4\n2,C,0.5,0.7\n",
        );
        let table = load_table(&path, None).unwrap();
        assert_eq!(table.layout(), HeaderLayout::FirstLine);
        assert_eq!(table.columns(), &[UNNAMED_INDEX_COLUMN, "id", "PC1", "PC2"]);
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.row_ids(), &["0", "1", "2"]);
        assert_eq!(table.numeric_column(3).unwrap(), vec![0.2, 0.4, 0.7]);
    }

    #[test]
    fn test_empty_name_after_first_column_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "pcs.csv", "id,,PC2\nA,0.1,0.2\nB,0.3,0.4\n");
        assert!(matches!(
            load_table(&path, None),
            Err(InputError::DataLoad { .. })
        ));
    }

    #[test]
    fn test_duplicate_column_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "pcs.csv", "id,PC1,PC1\nA,0.1,0.2\nB,0.3,0.4\n");
        match load_table(&path, None) {
            Err(InputError::DataLoad { .. }) => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_data_row_never_promoted_to_header() {
        let lines = ["id,PC1,PC1", "A,0.1,0.2", "B,0.3,0.4"];
        let err = try_layout(HeaderLayout::SecondLine, &lines, Delimiter::Char(b',')).unwrap_err();
        assert!(err.contains("'0.1'"), "{err}");
    }

    #[test]
    fn test_whitespace_delimited() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "snv.txt", "IID  rs1\nS1   0\nS2   2\n");
        let table = load_table(&path, None).unwrap();
        assert_eq!(table.delimiter(), Delimiter::Whitespace);
        assert_eq!(table.numeric_column(1).unwrap(), vec![0.0, 2.0]);
    }

    #[test]
    fn test_explicit_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "cov.txt", "IID;age\nS1;40\nS2;50\n");
        let table = load_table(&path, Some(Delimiter::Char(b';'))).unwrap();
        assert_eq!(table.columns(), &["IID", "age"]);
    }

    #[test]
    fn test_gzip_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pheno.tsv.gz");
        let file = std::fs::File::create(&path).unwrap();
        let mut enc = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        enc.write_all(b"IID\ty\nS1\t1.5\nS2\t2.5\n").unwrap();
        enc.finish().unwrap();

        let table = load_table(&path, None).unwrap();
        assert_eq!(table.numeric_column(1).unwrap(), vec![1.5, 2.5]);
    }

    #[test]
    fn test_missing_file_is_data_load_error() {
        let err = load_table(Path::new("/nonexistent/pheno.tsv"), None).unwrap_err();
        match err {
            InputError::DataLoad { path, .. } => assert!(path.contains("pheno.tsv")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ragged_file_is_data_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "bad.csv", "a,b,c\n1,2,3\n4,5\n6,7,8,9\n");
        assert!(matches!(
            load_table(&path, Some(Delimiter::Char(b','))),
            Err(InputError::DataLoad { .. })
        ));
    }

    #[test]
    fn test_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "empty.csv", "\n\n");
        assert!(matches!(
            load_table(&path, None),
            Err(InputError::EmptyTable { .. })
        ));
    }

    #[test]
    fn test_numeric_column_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "p.csv", "id,y,z\nA,1,x\nB,NA,2\n");
        let table = load_table(&path, None).unwrap();
        assert!(matches!(
            table.numeric_column(1),
            Err(InputError::MissingValue { row: 2, .. })
        ));
        match table.numeric_column(2) {
            Err(InputError::NonNumeric { column, row, value }) => {
                assert_eq!(column, "z");
                assert_eq!(row, 1);
                assert_eq!(value, "x");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(!table.is_numeric_column(0));
    }

    #[test]
    fn test_column_names_keep_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "p.csv", "ID,Phenotype,pc1\nA,1,2\n");
        let table = load_table(&path, None).unwrap();
        assert_eq!(table.column_index("Phenotype"), Some(1));
        assert_eq!(table.column_index("phenotype"), None);
    }
}
