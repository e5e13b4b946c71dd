//! gxg: structured-LMM test of genotype-by-background interaction.
//!
//! CLI entry point using clap for argument parsing.

mod config;
mod pipeline;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Overrides, RunConfig};

#[derive(Parser)]
#[command(
    name = "gxg",
    version,
    about = "Test whether a variant's effect is modulated by local ancestry",
    long_about = "Prepares phenotype, SNV, covariate and ancestry-PC tables and runs a\n\
                  structured linear mixed model 2-dof interaction test for one variant."
)]
struct Cli {
    /// Local ancestry PC file
    #[arg(long)]
    pcs: Option<PathBuf>,

    /// SNV genotype file (identifier, genotype)
    #[arg(long)]
    snv: Option<PathBuf>,

    /// Phenotype file
    #[arg(long)]
    phenotype: Option<PathBuf>,

    /// Name of the phenotype column (default: auto-detect)
    #[arg(long)]
    phenotype_column: Option<String>,

    /// Covariate file (identifier first, covariates after)
    #[arg(long)]
    covariates: Option<PathBuf>,

    /// Output file; .json writes JSON, anything else comma-separated
    #[arg(long)]
    output: Option<PathBuf>,

    /// Field separator (default: auto-detect; 'tab' and 'whitespace' accepted)
    #[arg(long)]
    sep: Option<String>,

    /// Print debug output
    #[arg(short, long)]
    verbose: bool,

    /// TOML file with any of the options above; flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Prefix of background columns in the PC file [default: PC]
    #[arg(long)]
    pc_prefix: Option<String>,

    /// Also include the background columns as fixed-effect covariates
    #[arg(long)]
    background_as_covariates: bool,

    /// Fail when sample identifiers differ between files
    #[arg(long)]
    strict_sample_ids: bool,
}

impl Cli {
    fn into_parts(self) -> (Option<PathBuf>, Overrides) {
        let overrides = Overrides {
            pcs: self.pcs,
            snv: self.snv,
            phenotype: self.phenotype,
            phenotype_column: self.phenotype_column,
            covariates: self.covariates,
            output: self.output,
            sep: self.sep,
            pc_prefix: self.pc_prefix,
            verbose: self.verbose,
            background_as_covariates: self.background_as_covariates,
            strict_sample_ids: self.strict_sample_ids,
        };
        (self.config, overrides)
    }
}

fn main() -> Result<()> {
    let (config_path, overrides) = Cli::parse().into_parts();

    let mut config = match &config_path {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    config.apply(overrides);
    let settings = config.resolve()?;

    let filter = if settings.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("gxg v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &config_path {
        info!("Configuration: {}", path.display());
    }

    let record = pipeline::run(&settings)?;

    match &settings.output {
        Some(path) => {
            info!("P-value: {:.8e}", record.p_value);
            record.save(path)?;
        }
        None => {
            print!("{}", record.summary());
            print!("{}", record.to_table());
        }
    }
    Ok(())
}
