//! File writers
//!
//! CSV and Parquet files share the flat projection from `records_to_batch`;
//! JSON files hold the raw records unchanged.

use super::schema::records_to_batch;
use crate::config::OutputConfig;
use crate::error::{Error, Result, ResultExt};
use crate::types::{ExportFormat, Record};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration for Parquet writer
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    compression: Compression,
    row_group_size: usize,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: 1024 * 1024, // 1M rows
        }
    }
}

impl ParquetWriterConfig {
    /// Create a new config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn build_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }
}

fn create_file(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("Failed to create '{}'", path.display()))
}

/// Write a batch as CSV with a header row
///
/// A batch without columns produces an empty file.
pub fn write_csv(path: impl AsRef<Path>, batch: &RecordBatch) -> Result<usize> {
    let file = create_file(path.as_ref())?;
    if batch.num_columns() == 0 {
        return Ok(0);
    }

    let mut writer = arrow::csv::WriterBuilder::new()
        .with_header(true)
        .build(BufWriter::new(file));
    writer.write(batch)?;
    writer.into_inner().flush().context("Failed to flush CSV")?;

    Ok(batch.num_rows())
}

/// Write raw records as a pretty-printed JSON array
pub fn write_json(path: impl AsRef<Path>, records: &[Record]) -> Result<usize> {
    let mut writer = BufWriter::new(create_file(path.as_ref())?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush().context("Failed to flush JSON")?;
    Ok(records.len())
}

/// Write a batch to a Parquet file
pub fn write_parquet(
    path: impl AsRef<Path>,
    batch: &RecordBatch,
    config: &ParquetWriterConfig,
) -> Result<usize> {
    let file = create_file(path.as_ref())?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(config.build_properties()))
        .context("Failed to create Parquet writer")?;
    writer.write(batch).context("Failed to write Parquet batch")?;
    writer.close().context("Failed to close Parquet writer")?;

    Ok(batch.num_rows())
}

/// File name for an export, e.g. `people_data_250_20240131_093000.csv`
pub fn export_file_name(
    prefix: &str,
    count: usize,
    timestamp: &NaiveDateTime,
    format: ExportFormat,
) -> String {
    format!(
        "{prefix}_{count}_{}.{}",
        timestamp.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Write `records` in every configured format
///
/// Returns the paths written. Parquet is skipped when there are no
/// records, since there is no schema to write.
pub fn export_records(
    records: &[Record],
    config: &OutputConfig,
    timestamp: &NaiveDateTime,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(&config.dir).map_err(|e| {
        Error::output(format!(
            "Failed to create output directory '{}': {e}",
            config.dir.display()
        ))
    })?;

    let needs_batch = config
        .formats
        .iter()
        .any(|f| matches!(f, ExportFormat::Csv | ExportFormat::Parquet));
    let batch = if needs_batch {
        Some(records_to_batch(records)?)
    } else {
        None
    };

    let mut written = Vec::new();
    for format in &config.formats {
        let path = config.dir.join(export_file_name(
            &config.file_prefix,
            records.len(),
            timestamp,
            *format,
        ));

        let rows = match (format, &batch) {
            (ExportFormat::Json, _) => write_json(&path, records)?,
            (ExportFormat::Csv, Some(batch)) => write_csv(&path, batch)?,
            (ExportFormat::Parquet, Some(batch)) => {
                if records.is_empty() {
                    warn!("No records to write, skipping Parquet output");
                    continue;
                }
                write_parquet(&path, batch, &ParquetWriterConfig::new())?
            }
            (_, None) => return Err(Error::output("Tabular batch missing")),
        };

        info!("Wrote {rows} records to {}", path.display());
        written.push(path);
    }

    Ok(written)
}
