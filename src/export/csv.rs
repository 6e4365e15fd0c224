// src/export/csv.rs

use crate::process::{IncomeRow, Table, COUNTY_COLUMN, INCOME_COLUMN};
use anyhow::{Context, Result};
use std::{
    io::{Read, Write},
    path::Path,
};
use tracing::info;

pub const DEFAULT_CSV_NAME: &str = "MD_Median_Household_Income_by_County.csv";

/// `County,Median_Household_Income`, comma-separated, no index column.
/// Missing incomes are empty fields. The header is written even for an
/// empty table.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut wtr = ::csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record([COUNTY_COLUMN, INCOME_COLUMN])?;
    for row in table.rows() {
        wtr.serialize(row)
            .with_context(|| format!("serializing row for {}", row.county))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn to_csv_string(table: &Table) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf)?;
    String::from_utf8(buf).context("CSV output is not UTF-8")
}

pub fn write_csv_file(table: &Table, path: &Path) -> Result<()> {
    super::write_atomically(path, |w| write_csv(table, w))?;
    info!(path = %path.display(), rows = table.len(), "wrote CSV");
    Ok(())
}

/// Read back a file produced by [`write_csv`].
pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = ::csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    if headers.iter().ne([COUNTY_COLUMN, INCOME_COLUMN]) {
        anyhow::bail!("unexpected CSV header {:?}", headers);
    }
    let rows = rdr
        .deserialize::<IncomeRow>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("parsing CSV rows")?;
    Ok(Table::from_rows(rows)?)
}
