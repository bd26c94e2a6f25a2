//! Output module
//!
//! Writes fetched records to disk.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Projecting records into a flat Arrow table (one column per field)
//! - Writing CSV, JSON and Parquet files
//! - Naming export files with a record count and timestamp

mod schema;
mod writer;

pub use schema::{infer_schema, records_to_batch};
pub use writer::{
    export_file_name, export_records, write_csv, write_json, write_parquet, ParquetWriterConfig,
};
