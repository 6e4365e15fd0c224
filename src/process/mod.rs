// src/process/mod.rs
use crate::config::QueryConfig;
use crate::error::{PipelineError, Result};
use crate::fetch::{Credential, Fetcher};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

pub mod convert;
pub mod normalize;
pub mod sort;
pub mod utils;
pub mod validate;

pub use normalize::normalize;
pub use sort::sort_by_income_desc;
pub use validate::validate;

pub const COUNTY_COLUMN: &str = "County";
pub const INCOME_COLUMN: &str = "Median_Household_Income";

/// One county. `None` income means the API had no usable number for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeRow {
    #[serde(rename = "County")]
    pub county: String,
    #[serde(rename = "Median_Household_Income")]
    pub median_household_income: Option<f64>,
}

impl IncomeRow {
    pub fn new(county: impl Into<String>, income: Option<f64>) -> Self {
        Self {
            county: county.into(),
            median_household_income: income,
        }
    }
}

/// Normalized result of one fetch, in fetch order unless sorted.
/// County names are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    rows: Vec<IncomeRow>,
}

impl Table {
    pub fn from_rows(rows: Vec<IncomeRow>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(rows.len());
        for row in &rows {
            if !seen.insert(row.county.as_str()) {
                return Err(PipelineError::Shape(format!(
                    "county {:?} appears more than once",
                    row.county
                )));
            }
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[IncomeRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.median_household_income.is_none())
            .count()
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<IncomeRow> {
        &mut self.rows
    }
}

/// Build the query, fetch once, validate, normalize and optionally sort.
///
/// A missing or empty key fails before `fetcher` is touched.
#[instrument(level = "info", skip_all, fields(year = config.year, state = %config.state))]
pub fn run<F: Fetcher + ?Sized>(
    key: Option<&str>,
    config: &QueryConfig,
    fetcher: &F,
    sort: bool,
) -> Result<Table> {
    let credential = Credential::from_option(key)?;
    let query = config.query(credential);
    let url = query.url()?;
    info!(url = %query.redacted_url()?, "fetching");

    let resp = fetcher.get(&url)?;
    debug!(status = resp.status, body = %resp.body, "raw response");

    let rows = validate(&resp)?;
    let mut table = normalize(rows)?;
    if sort {
        sort_by_income_desc(&mut table);
    }
    info!(
        rows = table.len(),
        missing = table.missing_count(),
        sorted = sort,
        "table ready"
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RawResponse;
    use std::cell::{Cell, RefCell};
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    use url::Url;

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,acsincome=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    /// Canned response plus a record of every call.
    struct MockFetcher {
        response: RawResponse,
        calls: Cell<usize>,
        last_url: RefCell<Option<Url>>,
    }

    impl MockFetcher {
        fn new(status: u16, body: &str) -> Self {
            Self {
                response: RawResponse::new(status, body),
                calls: Cell::new(0),
                last_url: RefCell::new(None),
            }
        }
    }

    impl Fetcher for MockFetcher {
        fn get(&self, url: &Url) -> Result<RawResponse> {
            self.calls.set(self.calls.get() + 1);
            *self.last_url.borrow_mut() = Some(url.clone());
            Ok(self.response.clone())
        }
    }

    struct FailingFetcher;

    impl Fetcher for FailingFetcher {
        fn get(&self, _url: &Url) -> Result<RawResponse> {
            Err(PipelineError::Transport("connection refused".to_string()))
        }
    }

    const BODY: &str = r#"[["NAME","B19013_001E","state","county"],
        ["Allegany County, Maryland","50000","24","001"],
        ["Howard County, Maryland","90000","24","027"],
        ["Garrett County, Maryland","N/A","24","023"],
        ["Anne Arundel County, Maryland","70000","24","003"]]"#;

    #[test]
    fn test_run_unsorted_keeps_fetch_order() {
        init_test_logging();
        let fetcher = MockFetcher::new(200, BODY);
        let table = run(Some("abc"), &QueryConfig::default(), &fetcher, false).unwrap();

        assert_eq!(fetcher.calls.get(), 1);
        let counties: Vec<_> = table.rows().iter().map(|r| r.county.as_str()).collect();
        assert_eq!(
            counties,
            vec![
                "Allegany County, Maryland",
                "Howard County, Maryland",
                "Garrett County, Maryland",
                "Anne Arundel County, Maryland"
            ]
        );
        assert_eq!(table.missing_count(), 1);

        let url = fetcher.last_url.borrow().clone().unwrap();
        assert!(url.as_str().ends_with("in=state:24&key=abc"));
    }

    #[test]
    fn test_run_sorted() {
        init_test_logging();
        let fetcher = MockFetcher::new(200, BODY);
        let table = run(Some("abc"), &QueryConfig::default(), &fetcher, true).unwrap();
        let incomes: Vec<_> = table
            .rows()
            .iter()
            .map(|r| r.median_household_income)
            .collect();
        assert_eq!(
            incomes,
            vec![Some(90000.0), Some(70000.0), Some(50000.0), None]
        );
    }

    #[test]
    fn test_empty_credential_never_fetches() {
        init_test_logging();
        let fetcher = MockFetcher::new(200, BODY);

        let err = run(Some(""), &QueryConfig::default(), &fetcher, false).unwrap_err();
        assert!(err.is_config());
        let err = run(None, &QueryConfig::default(), &fetcher, false).unwrap_err();
        assert!(err.is_config());

        assert_eq!(fetcher.calls.get(), 0);
    }

    #[test]
    fn test_forbidden_status_halts() {
        init_test_logging();
        let fetcher = MockFetcher::new(403, "<html>Invalid Key</html>");
        let err = run(Some("abc"), &QueryConfig::default(), &fetcher, false).unwrap_err();

        assert!(matches!(err, PipelineError::Status { status: 403, .. }));
        assert!(err.to_string().contains("403"));
        assert_eq!(err.raw_body(), Some("<html>Invalid Key</html>"));
    }

    #[test]
    fn test_non_json_body_halts() {
        init_test_logging();
        let fetcher = MockFetcher::new(200, "not json");
        let err = run(Some("abc"), &QueryConfig::default(), &fetcher, false).unwrap_err();

        assert!(matches!(err, PipelineError::Parse { .. }));
        assert!(err.to_string().contains("could not parse"));
        assert_eq!(err.raw_body(), Some("not json"));
    }

    #[test]
    fn test_transport_error_surfaces() {
        init_test_logging();
        let err = run(Some("abc"), &QueryConfig::default(), &FailingFetcher, false).unwrap_err();
        assert!(matches!(err, PipelineError::Transport(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_table_rejects_duplicate_county() {
        let err = Table::from_rows(vec![
            IncomeRow::new("Kent County, Maryland", Some(1.0)),
            IncomeRow::new("Kent County, Maryland", Some(2.0)),
        ])
        .unwrap_err();
        assert!(matches!(err, PipelineError::Shape(_)));
    }
}
