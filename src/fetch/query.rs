// src/fetch/query.rs

use crate::error::{PipelineError, Result};
use std::fmt;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.census.gov/data";
pub const DEFAULT_YEAR: u16 = 2022;
pub const DEFAULT_DATASET: &str = "acs/acs5";
pub const MARYLAND_FIPS: &str = "24";

/// Census variable holding the geography's display name.
pub const NAME_VARIABLE: &str = "NAME";
/// Census variable for median household income in the past 12 months.
pub const INCOME_VARIABLE: &str = "B19013_001E";

/// First ACS 5-year vintage the API serves.
const FIRST_ACS5_YEAR: u16 = 2009;

/// Census API key. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let key = raw.trim();
        if key.is_empty() {
            return Err(PipelineError::Config(
                "Census API key is empty".to_string(),
            ));
        }
        Ok(Self(key.to_string()))
    }

    /// Missing and empty keys are the same configuration error.
    pub fn from_option(raw: Option<&str>) -> Result<Self> {
        match raw {
            Some(k) => Self::new(k),
            None => Err(PipelineError::Config(
                "no Census API key provided; pass --key, --key-file or set CENSUS_API_KEY"
                    .to_string(),
            )),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// One ACS request: county-level name + median income for a single state.
#[derive(Debug, Clone)]
pub struct Query {
    base_url: String,
    year: u16,
    dataset: String,
    state: String,
    county: String,
    credential: Credential,
}

impl Query {
    pub fn new(credential: Credential) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            year: DEFAULT_YEAR,
            dataset: DEFAULT_DATASET.to_string(),
            state: MARYLAND_FIPS.to_string(),
            county: "*".to_string(),
            credential,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_year(mut self, year: u16) -> Self {
        self.year = year;
        self
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = dataset.into();
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    /// Full request URL, key included.
    pub fn url(&self) -> Result<Url> {
        let mut url = self.url_without_key()?;
        url.query_pairs_mut()
            .append_pair("key", self.credential.expose());
        Ok(url)
    }

    /// Same URL with the key left off; safe to log or embed in artifacts.
    pub fn redacted_url(&self) -> Result<Url> {
        self.url_without_key()
    }

    fn url_without_key(&self) -> Result<Url> {
        if self.year < FIRST_ACS5_YEAR {
            return Err(PipelineError::Config(format!(
                "year {} predates the first ACS 5-year release ({})",
                self.year, FIRST_ACS5_YEAR
            )));
        }
        if self.state.len() != 2 || !self.state.chars().all(|c| c.is_ascii_digit()) {
            return Err(PipelineError::Config(format!(
                "state must be a two-digit FIPS code, got {:?}",
                self.state
            )));
        }
        let dataset = self.dataset.trim_matches('/');
        if dataset.is_empty() {
            return Err(PipelineError::Config("dataset is empty".to_string()));
        }

        let raw = format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.year,
            dataset
        );
        let mut url = Url::parse(&raw)
            .map_err(|e| PipelineError::Config(format!("invalid API URL {}: {}", raw, e)))?;
        // set_query leaves `,` `:` `*` unescaped, which is what the API documents.
        url.set_query(Some(&format!(
            "get={},{}&for=county:{}&in=state:{}",
            NAME_VARIABLE, INCOME_VARIABLE, self.county, self.state
        )));
        Ok(url)
    }
}
