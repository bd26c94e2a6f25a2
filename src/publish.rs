//! Event publishing
//!
//! Formatted contacts are handed to an [`EventPublisher`]. The only
//! implementation writes JSON documents to a writer; the CLI points it at
//! stdout.

use crate::error::{Error, Result};
use crate::format::ContactRecord;
use crate::types::Record;
use async_trait::async_trait;
use std::io::Write;

/// Sink for formatted contacts
#[async_trait]
pub trait EventPublisher: Send {
    /// Publish one contact
    async fn publish(&mut self, contact: &ContactRecord) -> Result<()>;

    /// Flush anything buffered
    async fn flush(&mut self) -> Result<()>;
}

/// Writes one JSON document per contact
#[derive(Debug)]
pub struct JsonLinesPublisher<W> {
    writer: W,
    pretty: bool,
    published: usize,
}

impl<W: Write + Send> JsonLinesPublisher<W> {
    /// Pretty-printed documents
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: true,
            published: 0,
        }
    }

    /// Single-line documents
    pub fn compact(writer: W) -> Self {
        Self {
            writer,
            pretty: false,
            published: 0,
        }
    }

    /// Number of contacts published so far
    pub fn published(&self) -> usize {
        self.published
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W: Write + Send> EventPublisher for JsonLinesPublisher<W> {
    async fn publish(&mut self, contact: &ContactRecord) -> Result<()> {
        let encoded = if self.pretty {
            serde_json::to_string_pretty(contact)
        } else {
            serde_json::to_string(contact)
        }
        .map_err(|e| Error::publish(format!("Failed to encode contact {}: {e}", contact.id)))?;

        writeln!(self.writer, "{encoded}")
            .map_err(|e| Error::publish(format!("Failed to write contact: {e}")))?;
        self.published += 1;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| Error::publish(format!("Failed to flush publisher: {e}")))
    }
}

/// Format each record and hand it to the publisher, then flush
pub async fn publish_records<P: EventPublisher + ?Sized>(
    publisher: &mut P,
    records: &[Record],
) -> Result<usize> {
    for record in records {
        publisher
            .publish(&ContactRecord::from_record(record))
            .await?;
    }
    publisher.flush().await?;
    Ok(records.len())
}
