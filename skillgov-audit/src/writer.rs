use crate::record::AuditRecord;
use skillgov_core::{GovError, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Destination for audit records. Single-writer: the simulator funnels all
/// broker output through one sink per run.
pub trait AuditSink: Send {
    /// Append one record and return its handle. The record must be durable
    /// when this returns.
    fn append(&mut self, record: &AuditRecord) -> Result<String>;
}

/// Newline-delimited JSON file writer. Each append serializes one record,
/// writes one line, and flushes before returning; a crash can lose at most
/// the decision currently in flight.
pub struct JsonlAuditWriter {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonlAuditWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonlAuditWriter {
    fn append(&mut self, record: &AuditRecord) -> Result<String> {
        let line = serde_json::to_string(record)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        debug!(handle = %record.handle(), outcome = ?record.outcome, "audit record flushed");
        Ok(record.handle())
    }
}

/// In-memory sink for tests and replay tooling.
#[derive(Debug, Default)]
pub struct MemoryAuditWriter {
    records: Vec<AuditRecord>,
}

impl MemoryAuditWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }
}

impl AuditSink for MemoryAuditWriter {
    fn append(&mut self, record: &AuditRecord) -> Result<String> {
        self.records.push(record.clone());
        Ok(record.handle())
    }
}

/// Load every record from a JSONL audit file, in write order.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<AuditRecord>> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: AuditRecord = serde_json::from_str(&line).map_err(|e| {
            GovError::Audit(format!(
                "malformed audit record at line {}: {e}",
                line_no + 1
            ))
        })?;
        records.push(record);
    }
    Ok(records)
}
