use crate::process::{IncomeRow, Table, COUNTY_COLUMN, INCOME_COLUMN};
use anyhow::{anyhow, Result};
use arrow::{
    array::{Array, ArrayRef, Float64Array, Float64Builder, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

/// `County: Utf8` (non-null), `Median_Household_Income: Float64` (nullable).
pub fn table_schema() -> Schema {
    Schema::new(vec![
        Field::new(COUNTY_COLUMN, DataType::Utf8, false),
        Field::new(INCOME_COLUMN, DataType::Float64, true),
    ])
}

/// Columnar copy of the table; missing incomes become nulls.
pub fn to_record_batch(table: &Table) -> Result<RecordBatch> {
    let counties = StringArray::from_iter_values(table.rows().iter().map(|r| r.county.as_str()));

    let mut incomes = Float64Builder::with_capacity(table.len());
    for row in table.rows() {
        incomes.append_option(row.median_household_income);
    }

    RecordBatch::try_new(
        Arc::new(table_schema()),
        vec![
            Arc::new(counties) as ArrayRef,
            Arc::new(incomes.finish()) as ArrayRef,
        ],
    )
    .map_err(Into::into)
}

/// Inverse of [`to_record_batch`]. Columns are looked up by name.
pub fn from_record_batches(batches: &[RecordBatch]) -> Result<Table> {
    let mut rows = Vec::new();
    for batch in batches {
        let counties = batch
            .column_by_name(COUNTY_COLUMN)
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .ok_or_else(|| anyhow!("batch has no Utf8 {} column", COUNTY_COLUMN))?;
        let incomes = batch
            .column_by_name(INCOME_COLUMN)
            .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
            .ok_or_else(|| anyhow!("batch has no Float64 {} column", INCOME_COLUMN))?;

        for i in 0..batch.num_rows() {
            let income = if incomes.is_null(i) {
                None
            } else {
                Some(incomes.value(i))
            };
            rows.push(IncomeRow::new(counties.value(i), income));
        }
    }
    Ok(Table::from_rows(rows)?)
}
