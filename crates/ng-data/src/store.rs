//! Keyed store of uploaded files and derived summary tables

use ng_core::config::DEFAULT_MAX_UPLOAD_BYTES;
use ng_core::{Error, Result};
use serde_json::{json, Value};
use std::fmt::Write;
use tracing::info;
use uuid::Uuid;

use crate::table::Table;

fn short_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// An uploaded file. Immutable after creation.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub file_id: String,
    pub name: String,
    pub size: usize,
    pub table: Table,
}

impl FileRecord {
    pub fn to_meta(&self) -> Value {
        json!({
            "file_id": self.file_id,
            "name": self.name,
            "size": self.size,
            "n_rows": self.table.n_rows(),
            "n_cols": self.table.n_cols(),
            "columns": self.table.columns(),
        })
    }
}

/// A table derived from a file or another summary
#[derive(Debug, Clone)]
pub struct SummaryRecord {
    pub summary_id: String,
    pub source_file_id: String,
    pub kind: String,
    pub table: Table,
    pub note: Option<String>,
}

impl SummaryRecord {
    pub fn to_meta(&self) -> Value {
        json!({
            "summary_id": self.summary_id,
            "source_file_id": self.source_file_id,
            "kind": self.kind,
            "n_rows": self.table.n_rows(),
            "n_cols": self.table.n_cols(),
            "columns": self.table.columns(),
            "note": self.note,
        })
    }
}

/// Files and summaries, listed in insertion order
#[derive(Debug, Clone)]
pub struct TableStore {
    files: Vec<FileRecord>,
    summaries: Vec<SummaryRecord>,
    max_bytes: usize,
}

impl Default for TableStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl TableStore {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            files: Vec::new(),
            summaries: Vec::new(),
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Parse and store an uploaded CSV. Returns the file metadata.
    pub fn add_file(&mut self, name: &str, raw: &[u8]) -> Result<Value> {
        if raw.len() > self.max_bytes {
            return Err(Error::capacity(format!(
                "File too large ({} bytes > {})",
                raw.len(),
                self.max_bytes
            )));
        }
        let table = Table::from_csv_bytes(raw)?;
        let record = FileRecord {
            file_id: short_id(),
            name: name.to_string(),
            size: raw.len(),
            table,
        };
        info!(
            "Stored file {} ({}, {} rows)",
            record.file_id,
            record.name,
            record.table.n_rows()
        );
        let meta = record.to_meta();
        self.files.push(record);
        Ok(meta)
    }

    pub fn list_files(&self) -> Vec<Value> {
        self.files.iter().map(FileRecord::to_meta).collect()
    }

    pub fn file(&self, file_id: &str) -> Result<&FileRecord> {
        self.files
            .iter()
            .find(|f| f.file_id == file_id)
            .ok_or_else(|| Error::not_found(format!("Unknown file_id: {}", file_id)))
    }

    pub fn summary(&self, summary_id: &str) -> Result<&SummaryRecord> {
        self.summaries
            .iter()
            .find(|s| s.summary_id == summary_id)
            .ok_or_else(|| Error::not_found(format!("Unknown summary_id: {}", summary_id)))
    }

    /// Store a derived table. `source_file_id` must name an existing file.
    pub fn add_summary(
        &mut self,
        source_file_id: &str,
        kind: &str,
        table: Table,
        note: Option<String>,
    ) -> Result<Value> {
        self.file(source_file_id)?;
        let record = SummaryRecord {
            summary_id: short_id(),
            source_file_id: source_file_id.to_string(),
            kind: kind.to_string(),
            table,
            note,
        };
        let meta = record.to_meta();
        self.summaries.push(record);
        Ok(meta)
    }

    pub fn list_summaries(&self) -> Vec<Value> {
        self.summaries.iter().map(SummaryRecord::to_meta).collect()
    }

    /// Resolve a `file_id | summary_id` pair to a table and the id of the
    /// file it ultimately derives from. A summary id wins when both are
    /// given; the returned warning says so.
    pub fn resolve(
        &self,
        file_id: Option<&str>,
        summary_id: Option<&str>,
    ) -> Result<(&Table, String, Option<String>)> {
        match (file_id, summary_id) {
            (_, Some(sid)) => {
                let warning = file_id.map(|fid| {
                    format!(
                        "Both file_id ({}) and summary_id ({}) given; using summary_id",
                        fid, sid
                    )
                });
                let summary = self.summary(sid)?;
                Ok((&summary.table, summary.source_file_id.clone(), warning))
            }
            (Some(fid), None) => {
                let file = self.file(fid)?;
                Ok((&file.table, file.file_id.clone(), None))
            }
            (None, None) => Err(Error::validation("Provide file_id or summary_id")),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.summaries.is_empty()
    }

    /// Compact listing for the model preface
    pub fn describe_for_prompt(&self) -> String {
        let mut out = String::new();
        if self.is_empty() {
            out.push_str("Data: no files uploaded.\n");
            return out;
        }
        let _ = writeln!(out, "Uploaded files:");
        for f in &self.files {
            let _ = writeln!(
                out,
                "- {} {} ({} rows x {} cols: {})",
                f.file_id,
                f.name,
                f.table.n_rows(),
                f.table.n_cols(),
                f.table.columns().join(", ")
            );
        }
        if !self.summaries.is_empty() {
            let _ = writeln!(out, "Summaries:");
            for s in &self.summaries {
                let _ = writeln!(
                    out,
                    "- {} kind={} from {} ({} rows: {})",
                    s.summary_id,
                    s.kind,
                    s.source_file_id,
                    s.table.n_rows(),
                    s.table.columns().join(", ")
                );
            }
        }
        out
    }
}
