//! Run configuration: an optional TOML file overlaid with command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use gxg_io::background::DEFAULT_PC_PREFIX;
use gxg_io::Delimiter;

/// Every recognised option. Field defaults apply to options given
/// neither in the file nor on the command line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Ancestry PC table (mandatory).
    pub pcs: Option<PathBuf>,
    /// SNV table, genotype in the second column (mandatory).
    pub snv: Option<PathBuf>,
    /// Phenotype table (mandatory).
    pub phenotype: Option<PathBuf>,
    /// Response column; resolved by name heuristics when unset.
    pub phenotype_column: Option<String>,
    /// Covariate table; intercept only when unset.
    pub covariates: Option<PathBuf>,
    /// Result file; printed to stdout when unset.
    pub output: Option<PathBuf>,
    /// Field separator; auto-detected when unset.
    pub sep: Option<String>,
    /// Debug logging. Default false.
    pub verbose: bool,
    /// Prefix of background columns. Default "PC".
    pub pc_prefix: String,
    /// Also use the background columns as fixed effects. Default false.
    pub background_as_covariates: bool,
    /// Fail instead of warning when sample identifiers differ. Default false.
    pub strict_sample_ids: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            pcs: None,
            snv: None,
            phenotype: None,
            phenotype_column: None,
            covariates: None,
            output: None,
            sep: None,
            verbose: false,
            pc_prefix: DEFAULT_PC_PREFIX.to_string(),
            background_as_covariates: false,
            strict_sample_ids: false,
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid configuration")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Overlay explicitly given command-line values.
    pub fn apply(&mut self, overrides: Overrides) {
        fn set<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }
        set(&mut self.pcs, overrides.pcs);
        set(&mut self.snv, overrides.snv);
        set(&mut self.phenotype, overrides.phenotype);
        set(&mut self.phenotype_column, overrides.phenotype_column);
        set(&mut self.covariates, overrides.covariates);
        set(&mut self.output, overrides.output);
        set(&mut self.sep, overrides.sep);
        if let Some(prefix) = overrides.pc_prefix {
            self.pc_prefix = prefix;
        }
        self.verbose |= overrides.verbose;
        self.background_as_covariates |= overrides.background_as_covariates;
        self.strict_sample_ids |= overrides.strict_sample_ids;
    }

    /// Check mandatory paths and parse the separator.
    pub fn resolve(self) -> Result<Settings> {
        let required = |value: Option<PathBuf>, name: &str| {
            value.ok_or_else(|| anyhow!("Missing required input --{} (flag or config key)", name))
        };
        let delimiter = self
            .sep
            .as_deref()
            .map(|s| s.parse::<Delimiter>().map_err(|e| anyhow!(e)))
            .transpose()?;
        Ok(Settings {
            pcs: required(self.pcs, "pcs")?,
            snv: required(self.snv, "snv")?,
            phenotype: required(self.phenotype, "phenotype")?,
            phenotype_column: self.phenotype_column,
            covariates: self.covariates,
            output: self.output,
            delimiter,
            verbose: self.verbose,
            pc_prefix: self.pc_prefix,
            background_as_covariates: self.background_as_covariates,
            strict_sample_ids: self.strict_sample_ids,
        })
    }
}

/// Values given on the command line; `None`/false means "not given".
#[derive(Debug, Default)]
pub struct Overrides {
    pub pcs: Option<PathBuf>,
    pub snv: Option<PathBuf>,
    pub phenotype: Option<PathBuf>,
    pub phenotype_column: Option<String>,
    pub covariates: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub sep: Option<String>,
    pub pc_prefix: Option<String>,
    pub verbose: bool,
    pub background_as_covariates: bool,
    pub strict_sample_ids: bool,
}

/// A complete, validated configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub pcs: PathBuf,
    pub snv: PathBuf,
    pub phenotype: PathBuf,
    pub phenotype_column: Option<String>,
    pub covariates: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub delimiter: Option<Delimiter>,
    pub verbose: bool,
    pub pc_prefix: String,
    pub background_as_covariates: bool,
    pub strict_sample_ids: bool,
}
