use crate::error::{PipelineError, Result};
use crate::fetch::query::{INCOME_VARIABLE, NAME_VARIABLE};
use crate::process::utils::income_from_cell;
use crate::process::{IncomeRow, Table};
use serde_json::Value;
use tracing::{debug, instrument};

/// Turn `[header, row, row, ...]` into a [`Table`].
///
/// The header may list `NAME` and `B19013_001E` in any order, next to other
/// columns (the API appends `state` and `county` codes); those are dropped.
/// Income cells that do not parse become missing instead of failing the row.
#[instrument(level = "debug", skip_all, fields(rows = rows.len().saturating_sub(1)))]
pub fn normalize(rows: Vec<Vec<Value>>) -> Result<Table> {
    let mut rows = rows.into_iter();
    let header = rows
        .next()
        .ok_or_else(|| PipelineError::Shape("response contained no header row".to_string()))?;

    let headers = header
        .iter()
        .map(|cell| {
            cell.as_str().map(str::to_owned).ok_or_else(|| {
                PipelineError::Shape(format!("header cell {} is not text", cell))
            })
        })
        .collect::<Result<Vec<String>>>()?;

    let column = |name: &str| {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            PipelineError::Shape(format!("header {:?} has no {} column", headers, name))
        })
    };
    let name_idx = column(NAME_VARIABLE)?;
    let income_idx = column(INCOME_VARIABLE)?;

    let mut out = Vec::with_capacity(rows.len());
    for (i, row) in rows.enumerate() {
        let line = i + 1;
        if row.len() != headers.len() {
            return Err(PipelineError::Shape(format!(
                "row {} has {} cells, header has {}",
                line,
                row.len(),
                headers.len()
            )));
        }

        let county = match &row[name_idx] {
            Value::String(s) => s.clone(),
            other => {
                return Err(PipelineError::Shape(format!(
                    "row {}: county name {} is not text",
                    line, other
                )))
            }
        };

        let income = income_from_cell(&row[income_idx]);
        if income.is_none() {
            debug!(county = %county, raw = %row[income_idx], "income not numeric, recorded as missing");
        }
        out.push(IncomeRow::new(county, income));
    }

    Table::from_rows(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: &str) -> Vec<Vec<Value>> {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_rename_and_coerce() {
        let table = normalize(parse(
            r#"[["NAME","B19013_001E"],["Some County, Maryland","65000"],["Other County, Maryland","N/A"]]"#,
        ))
        .unwrap();

        assert_eq!(
            table.rows(),
            &[
                IncomeRow::new("Some County, Maryland", Some(65000.0)),
                IncomeRow::new("Other County, Maryland", None),
            ]
        );
    }

    #[test]
    fn test_header_order_and_extra_columns() {
        let table = normalize(vec![
            vec![json!("state"), json!("B19013_001E"), json!("county"), json!("NAME")],
            vec![json!("24"), json!("123456"), json!("031"), json!("Montgomery County, Maryland")],
        ])
        .unwrap();
        assert_eq!(
            table.rows(),
            &[IncomeRow::new("Montgomery County, Maryland", Some(123456.0))]
        );
    }

    #[test]
    fn test_bad_cells_do_not_abort_table() {
        let table = normalize(vec![
            vec![json!("NAME"), json!("B19013_001E")],
            vec![json!("A"), json!(null)],
            vec![json!("B"), json!("")],
            vec![json!("C"), json!("-666666666")],
            vec![json!("D"), json!(" 42000 ")],
        ])
        .unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.missing_count(), 3);
        assert_eq!(table.rows()[3].median_household_income, Some(42000.0));
    }

    #[test]
    fn test_header_only_is_empty_table() {
        let table = normalize(vec![vec![json!("NAME"), json!("B19013_001E")]]).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_missing_header_column() {
        let err = normalize(vec![
            vec![json!("NAME"), json!("B01003_001E")],
            vec![json!("A"), json!("1")],
        ])
        .unwrap_err();
        assert!(err.to_string().contains("B19013_001E"));
    }

    #[test]
    fn test_ragged_row() {
        let err = normalize(vec![
            vec![json!("NAME"), json!("B19013_001E")],
            vec![json!("A")],
        ])
        .unwrap_err();
        assert!(matches!(err, PipelineError::Shape(_)));
    }

    #[test]
    fn test_non_text_county() {
        let err = normalize(vec![
            vec![json!("NAME"), json!("B19013_001E")],
            vec![json!(7), json!("1")],
        ])
        .unwrap_err();
        assert!(matches!(err, PipelineError::Shape(_)));
    }

    #[test]
    fn test_duplicate_county() {
        let err = normalize(vec![
            vec![json!("NAME"), json!("B19013_001E")],
            vec![json!("A"), json!("1")],
            vec![json!("A"), json!("2")],
        ])
        .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }
}
