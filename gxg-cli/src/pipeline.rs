//! The preparation pipeline, in data-flow order:
//! load -> resolve/select -> standardize/recode -> assemble -> validate -> test.

use anyhow::Result;
use tracing::{info, warn};

use gxg_core::lmm::StructLmm;
use gxg_core::prep::{assemble_fixed_effects, normalize_coding, BackgroundMatrix, StandardizedResponse};
use gxg_core::{run_interaction_test, ResultRecord, TestInputs};
use gxg_io::background::select_background;
use gxg_io::columns::resolve_response_column;
use gxg_io::extract::{covariate_matrix, genotype_vector};
use gxg_io::sample::first_mismatch;
use gxg_io::{load_table, RawTable};

use crate::config::Settings;

/// Compare every source's identifier column against the phenotype's.
fn audit_sample_ids(reference: &RawTable, others: &[(&str, &RawTable)], strict: bool) -> Result<()> {
    let ref_name = reference.path().display().to_string();
    for (label, table) in others {
        let Some(mismatch) = first_mismatch(reference.row_ids(), table.row_ids()) else {
            continue;
        };
        let source_name = format!("{} ({})", label, table.path().display());
        let err = mismatch.into_error(&ref_name, &source_name);
        if strict {
            return Err(err.into());
        }
        warn!("{}; samples are aligned by row position", err);
    }
    Ok(())
}

pub fn run(settings: &Settings) -> Result<ResultRecord> {
    info!("Loading data...");
    let pheno_table = load_table(&settings.phenotype, settings.delimiter)?;
    let snv_table = load_table(&settings.snv, settings.delimiter)?;
    let pcs_table = load_table(&settings.pcs, settings.delimiter)?;
    let cov_table = settings
        .covariates
        .as_deref()
        .map(|path| load_table(path, settings.delimiter))
        .transpose()?;

    let mut others = vec![("SNV", &snv_table), ("PCs", &pcs_table)];
    if let Some(cov) = &cov_table {
        others.push(("covariates", cov));
    }
    audit_sample_ids(&pheno_table, &others, settings.strict_sample_ids)?;

    let column = resolve_response_column(&pheno_table, settings.phenotype_column.as_deref())?;
    let y_raw = pheno_table.numeric_column(column.index)?;
    let background = select_background(&pcs_table, &settings.pc_prefix)?;
    let genotype = genotype_vector(&snv_table)?;
    let covariates = cov_table.as_ref().map(covariate_matrix).transpose()?;

    let response = StandardizedResponse::new(&column.name, &y_raw);
    let e = BackgroundMatrix::from_raw(&background.matrix)?;
    let coded = normalize_coding(&genotype);

    let m = assemble_fixed_effects(response.values().len(), covariates.as_ref().map(|c| &c.matrix));

    let record = run_interaction_test::<StructLmm>(&TestInputs {
        phenotype: &column.name,
        response: &response,
        background: &e,
        fixed_effects: &m,
        genotype: &coded.genotypes,
        background_as_fixed: settings.background_as_covariates,
    })?;
    Ok(record)
}
