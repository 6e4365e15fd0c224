// src/config.rs

use crate::error::{PipelineError, Result};
use crate::export::csv::DEFAULT_CSV_NAME;
use crate::fetch::query::{DEFAULT_BASE_URL, DEFAULT_DATASET, DEFAULT_YEAR, MARYLAND_FIPS};
use crate::fetch::{Credential, Query};
use clap::Parser;
use serde::Deserialize;
use std::{fs, path::{Path, PathBuf}};

pub const KEY_ENV_VAR: &str = "CENSUS_API_KEY";

/// Median household income by county from the ACS 5-year API.
#[derive(Debug, Parser)]
#[command(name = "acsincome", version, about)]
pub struct Args {
    /// Census API key (falls back to --key-file, then $CENSUS_API_KEY)
    #[arg(long)]
    pub key: Option<String>,

    /// File whose first line is the Census API key
    #[arg(long, value_name = "PATH")]
    pub key_file: Option<PathBuf>,

    /// YAML file with query settings (year, dataset, state, base_url)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// ACS vintage
    #[arg(long)]
    pub year: Option<u16>,

    /// Two-digit state FIPS code
    #[arg(long)]
    pub state: Option<String>,

    /// API root, e.g. a local mirror
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Sort counties by income, highest first
    #[arg(long)]
    pub sort: bool,

    /// CSV output path
    #[arg(long, short, value_name = "PATH", default_value = DEFAULT_CSV_NAME)]
    pub out: PathBuf,

    /// Also write the table as Parquet
    #[arg(long, value_name = "PATH")]
    pub parquet: Option<PathBuf>,

    /// Skip the terminal bar chart
    #[arg(long)]
    pub no_chart: bool,

    /// Log the raw status and body, and print the body on failure
    #[arg(long)]
    pub debug: bool,
}

/// Query settings. Built-in defaults < YAML file < command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    pub base_url: String,
    pub year: u16,
    pub dataset: String,
    pub state: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            year: DEFAULT_YEAR,
            dataset: DEFAULT_DATASET.to_string(),
            state: MARYLAND_FIPS.to_string(),
        }
    }
}

impl QueryConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| PipelineError::Config(format!("invalid query config: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("reading {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Defaults, then `--config`, then individual flags.
    pub fn from_args(args: &Args) -> Result<Self> {
        let base = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        Ok(base.with_overrides(args))
    }

    pub fn with_overrides(mut self, args: &Args) -> Self {
        if let Some(year) = args.year {
            self.year = year;
        }
        if let Some(state) = &args.state {
            self.state = state.clone();
        }
        if let Some(base_url) = &args.base_url {
            self.base_url = base_url.clone();
        }
        self
    }

    pub fn query(&self, credential: Credential) -> Query {
        Query::new(credential)
            .with_base_url(&self.base_url)
            .with_year(self.year)
            .with_dataset(&self.dataset)
            .with_state(&self.state)
    }
}

/// Pick the key from `--key`, then `--key-file`, then the environment.
///
/// Returns `Ok(None)` when nothing is configured; emptiness is judged later
/// by [`Credential`].
pub fn resolve_key(
    flag: Option<&str>,
    key_file: Option<&Path>,
    env_value: Option<String>,
) -> Result<Option<String>> {
    if let Some(k) = flag {
        return Ok(Some(k.to_string()));
    }
    if let Some(path) = key_file {
        let text = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("reading key file {}: {}", path.display(), e))
        })?;
        return Ok(Some(text.lines().next().unwrap_or("").trim().to_string()));
    }
    Ok(env_value)
}
