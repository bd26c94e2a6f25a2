//! Common types used throughout fub-export
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// A single record as returned by the API
///
/// The fetcher treats records as opaque field maps. Field order is the
/// order the API sent them in.
pub type Record = JsonObject;

// ============================================================================
// Fetch Mode
// ============================================================================

/// Default cap for a full bulk export
pub const BULK_TARGET_COUNT: usize = 200_000;

/// Default cap for a sampling run
pub const SAMPLE_TARGET_COUNT: usize = 100;

/// How many records a run aims to collect by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Full bulk export
    #[default]
    Bulk,
    /// Small sample, used when streaming events
    Sample,
}

impl FetchMode {
    /// Record cap used when no explicit target is configured
    pub fn default_target(self) -> usize {
        match self {
            FetchMode::Bulk => BULK_TARGET_COUNT,
            FetchMode::Sample => SAMPLE_TARGET_COUNT,
        }
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMode::Bulk => write!(f, "bulk"),
            FetchMode::Sample => write!(f, "sample"),
        }
    }
}

// ============================================================================
// Export Format
// ============================================================================

/// File format for exported records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Comma-separated values, one row per record
    Csv,
    /// Pretty-printed JSON array of raw records
    Json,
    /// Parquet file with the same columns as the CSV
    Parquet,
}

impl ExportFormat {
    /// File extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Parquet => "parquet",
        }
    }
}
