// src/export/parquet.rs

use crate::process::{convert, Table};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ::parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use ::parquet::arrow::ArrowWriter;
use ::parquet::basic::Compression;
use ::parquet::file::metadata::KeyValue;
use ::parquet::file::properties::WriterProperties;
use std::{fs::File, path::Path, sync::Arc};
use tracing::info;

pub const FETCHED_AT_KEY: &str = "fetched_at";
pub const SOURCE_URL_KEY: &str = "source_url";

/// Where and when the table came from; stored as file key-value metadata.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub fetched_at: DateTime<Utc>,
    /// Request URL with the key removed.
    pub source_url: String,
}

pub fn write_parquet_file(table: &Table, path: &Path, provenance: &Provenance) -> Result<()> {
    let batch = convert::to_record_batch(table).context("building income record batch")?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_key_value_metadata(Some(vec![
            KeyValue::new(
                FETCHED_AT_KEY.to_string(),
                provenance.fetched_at.to_rfc3339(),
            ),
            KeyValue::new(SOURCE_URL_KEY.to_string(), provenance.source_url.clone()),
        ]))
        .build();

    super::write_atomically(path, |w| {
        let mut writer = ArrowWriter::try_new(w, Arc::new(convert::table_schema()), Some(props))
            .context("creating ArrowWriter for income table")?;
        writer.write(&batch).context("writing income batch")?;
        writer.close().context("closing income writer")?;
        Ok(())
    })?;
    info!(path = %path.display(), rows = table.len(), "wrote Parquet");
    Ok(())
}

/// Load a file written by [`write_parquet_file`], with its metadata.
pub fn read_parquet_file(path: &Path) -> Result<(Table, Vec<(String, Option<String>)>)> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let metadata = builder
        .metadata()
        .file_metadata()
        .key_value_metadata()
        .map(|kvs| {
            kvs.iter()
                .map(|kv| (kv.key.clone(), kv.value.clone()))
                .collect()
        })
        .unwrap_or_default();

    let batches = builder
        .build()?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("reading income batches")?;
    Ok((convert::from_record_batches(&batches)?, metadata))
}
