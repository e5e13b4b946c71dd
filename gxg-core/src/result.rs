//! The result record and its writers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::CoreError;

/// Outcome of one interaction test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub p_value: f64,
    pub n_samples: usize,
    /// Background dimensionality K.
    pub n_pcs: usize,
    pub phenotype: String,
    pub phenotype_mean: f64,
    pub phenotype_std: f64,
    /// Absent when the engine does not expose both log-likelihoods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variance_explained: Option<f64>,
}

impl ResultRecord {
    pub fn header(&self) -> Vec<&'static str> {
        let mut h = vec![
            "p_value",
            "n_samples",
            "n_pcs",
            "phenotype",
            "phenotype_mean",
            "phenotype_std",
        ];
        if self.variance_explained.is_some() {
            h.push("variance_explained");
        }
        h
    }

    pub fn values(&self) -> Vec<String> {
        let mut v = vec![
            self.p_value.to_string(),
            self.n_samples.to_string(),
            self.n_pcs.to_string(),
            self.phenotype.clone(),
            self.phenotype_mean.to_string(),
            self.phenotype_std.to_string(),
        ];
        if let Some(ve) = self.variance_explained {
            v.push(ve.to_string());
        }
        v
    }

    /// Header line then one value line.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), CoreError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.header())?;
        wtr.write_record(self.values())?;
        wtr.flush()?;
        Ok(())
    }

    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<(), CoreError> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        Ok(())
    }

    /// Header and values as right-aligned columns.
    pub fn to_table(&self) -> String {
        let header = self.header();
        let values = self.values();
        let widths: Vec<usize> = header
            .iter()
            .zip(&values)
            .map(|(h, v)| h.len().max(v.len()))
            .collect();

        let line = |cells: Vec<String>| {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:>w$}", c, w = w))
                .collect::<Vec<_>>()
                .join("  ")
        };
        format!(
            "{}\n{}\n",
            line(header.iter().map(|h| h.to_string()).collect()),
            line(values)
        )
    }

    /// The human-readable lines printed before the table.
    pub fn summary(&self) -> String {
        let mut s = format!("P-value: {:.8e}\n", self.p_value);
        if let Some(ve) = self.variance_explained {
            s.push_str(&format!("Variance explained: {:.4}\n", ve));
        }
        s
    }

    /// Write to `path`: JSON for a `.json` suffix, comma-separated otherwise.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let writer = BufWriter::new(File::create(path)?);
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            self.write_json(writer)?;
        } else {
            self.write_csv(writer)?;
        }
        info!("Results saved to {}", path.display());
        Ok(())
    }
}
