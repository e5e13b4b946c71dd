//! End-to-end tests of the gxg binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const N: usize = 80;

struct Inputs {
    dir: TempDir,
    pcs: PathBuf,
    snv: PathBuf,
    phenotype: PathBuf,
    covariates: PathBuf,
}

fn pc1(i: usize) -> f64 {
    ((i * 37) % 101) as f64 / 101.0
}

fn pc2(i: usize) -> f64 {
    ((i * 53) % 97) as f64 / 97.0
}

fn genotype(i: usize) -> u8 {
    match i % 10 {
        0..=4 => 0,
        5..=8 => 1,
        _ => 2,
    }
}

fn write_lines(path: &Path, header: &str, rows: impl Iterator<Item = String>) {
    let mut text = String::from(header);
    text.push('\n');
    for row in rows {
        text.push_str(&row);
        text.push('\n');
    }
    fs::write(path, text).unwrap();
}

fn id(i: usize) -> String {
    format!("S{:03}", i)
}

/// Deterministic inputs with a genotype-by-PC1 interaction.
fn inputs() -> Inputs {
    inputs_with(N, id)
}

fn inputs_with(n_pheno: usize, pheno_id: impl Fn(usize) -> String) -> Inputs {
    let dir = tempfile::tempdir().unwrap();
    let pcs = dir.path().join("pcs.tsv");
    let snv = dir.path().join("snv.tsv");
    let phenotype = dir.path().join("pheno.tsv");
    let covariates = dir.path().join("covar.tsv");

    write_lines(
        &pcs,
        "id\tPC1\tPC2\tsource",
        (0..N).map(|i| format!("{}\t{:.6}\t{:.6}\tbatch{}", id(i), pc1(i), pc2(i), i % 3)),
    );
    write_lines(
        &snv,
        "id\trs42",
        (0..N).map(|i| format!("{}\t{}", id(i), genotype(i))),
    );
    write_lines(
        &phenotype,
        "id\tphenotype",
        (0..n_pheno).map(|i| {
            let g = genotype(i) as f64;
            let noise = ((i * 71) % 89) as f64 / 89.0 - 0.5;
            let y = 1.0 + 0.3 * g + 1.2 * g * (pc1(i) - 0.5) + noise;
            format!("{}\t{:.6}", pheno_id(i), y)
        }),
    );
    write_lines(
        &covariates,
        "id\tage\tsex",
        (0..N).map(|i| format!("{}\t{}\t{}", id(i), 30 + (i * 7) % 40, i % 2)),
    );

    Inputs {
        dir,
        pcs,
        snv,
        phenotype,
        covariates,
    }
}

fn gxg(inputs: &Inputs) -> Command {
    let mut cmd = Command::cargo_bin("gxg").unwrap();
    cmd.arg("--pcs")
        .arg(&inputs.pcs)
        .arg("--snv")
        .arg(&inputs.snv)
        .arg("--phenotype")
        .arg(&inputs.phenotype);
    cmd
}

#[test]
fn test_prints_result_to_stdout() {
    let inputs = inputs();
    gxg(&inputs)
        .assert()
        .success()
        .stdout(predicate::str::contains("P-value:"))
        .stdout(predicate::str::contains("p_value"))
        .stdout(predicate::str::contains("phenotype_std"));
}

#[test]
fn test_writes_csv_output() {
    let inputs = inputs();
    let out = inputs.dir.path().join("result.csv");
    gxg(&inputs)
        .arg("--covariates")
        .arg(&inputs.covariates)
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let text = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("p_value,n_samples,n_pcs,phenotype,phenotype_mean,phenotype_std"));
    let values: Vec<&str> = lines[1].split(',').collect();
    let p: f64 = values[0].parse().unwrap();
    assert!((0.0..=1.0).contains(&p));
    assert_eq!(values[1], N.to_string());
    assert_eq!(values[2], "2");
    assert_eq!(values[3], "phenotype");
}

#[test]
fn test_writes_json_output() {
    let inputs = inputs();
    let out = inputs.dir.path().join("result.json");
    gxg(&inputs).arg("--output").arg(&out).assert().success();
    let text = fs::read_to_string(&out).unwrap();
    assert!(text.contains("\"p_value\""));
    assert!(text.contains("\"n_pcs\": 2"));
}

#[test]
fn test_runs_are_deterministic() {
    let inputs = inputs();
    let first = inputs.dir.path().join("first.csv");
    let second = inputs.dir.path().join("second.csv");
    for out in [&first, &second] {
        gxg(&inputs)
            .arg("--covariates")
            .arg(&inputs.covariates)
            .arg("--output")
            .arg(out)
            .assert()
            .success();
    }
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_missing_file_fails() {
    let inputs = inputs();
    Command::cargo_bin("gxg")
        .unwrap()
        .arg("--pcs")
        .arg(inputs.dir.path().join("absent.tsv"))
        .arg("--snv")
        .arg(&inputs.snv)
        .arg("--phenotype")
        .arg(&inputs.phenotype)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load"));
}

#[test]
fn test_missing_required_flag_fails() {
    let inputs = inputs();
    Command::cargo_bin("gxg")
        .unwrap()
        .arg("--pcs")
        .arg(&inputs.pcs)
        .arg("--snv")
        .arg(&inputs.snv)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--phenotype"));
}

#[test]
fn test_unknown_phenotype_column_fails() {
    let inputs = inputs();
    gxg(&inputs)
        .arg("--phenotype-column")
        .arg("height")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Column 'height' not found"));
}

#[test]
fn test_dimension_mismatch_fails() {
    let inputs = inputs_with(N - 1, id);
    let output = gxg(&inputs).assert().code(1).get_output().clone();
    let stderr = String::from_utf8_lossy(&output.stderr);

    let position = |needle: &str| {
        stderr
            .find(needle)
            .unwrap_or_else(|| panic!("'{needle}' missing from stderr:\n{stderr}"))
    };
    let error = position(&format!(
        "Inconsistent data sizes: y: {}, E: {}, M: {}, g: {}",
        N - 1,
        N,
        N - 1,
        N
    ));
    for diagnostic in [
        "Using phenotype column: phenotype",
        "Using these PC columns: PC1, PC2",
        "SNV coding is correct (more 0s than 2s",
    ] {
        assert!(position(diagnostic) < error, "'{diagnostic}' logged after the error");
    }
}

#[test]
fn test_sample_id_mismatch() {
    let inputs = inputs_with(N, |i| if i == 5 { "X999".to_string() } else { id(i) });
    gxg(&inputs)
        .assert()
        .success()
        .stderr(predicate::str::contains("Sample identifiers"));
    gxg(&inputs)
        .arg("--strict-sample-ids")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("row 6"));
}

#[test]
fn test_config_file_with_flag_override() {
    let inputs = inputs();
    let out = inputs.dir.path().join("from_config.csv");
    let config = inputs.dir.path().join("run.toml");
    fs::write(
        &config,
        format!(
            "pcs = {:?}\nsnv = {:?}\nphenotype = {:?}\nphenotype_column = \"missing\"\n",
            inputs.pcs, inputs.snv, inputs.phenotype
        ),
    )
    .unwrap();

    Command::cargo_bin("gxg")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .assert()
        .code(1);

    Command::cargo_bin("gxg")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .arg("--phenotype-column")
        .arg("phenotype")
        .arg("--output")
        .arg(&out)
        .assert()
        .success();
    assert!(fs::read_to_string(&out).unwrap().starts_with("p_value,"));
}
