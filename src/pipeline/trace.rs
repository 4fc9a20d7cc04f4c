// Decision trace
// Append-only JSONL record of regime selection, cluster decisions, and final counts

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::clustering::Regime;
use crate::events::{ClusterDecision, EventCount};
use crate::pipeline::batch::BatchReport;

/// Errors that can occur during trace operations
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// What a trace line describes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceRecord {
    Regime {
        regime: Regime,
        max_run_length: usize,
    },
    Cluster(ClusterDecision),
    Summary {
        cluster_count: usize,
        counts: EventCount,
    },
}

/// A single line in the trace file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// RFC 3339 time the entry was written
    pub timestamp: String,

    /// Identifies the analyzed input (e.g. its SHA-256)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(flatten)]
    pub record: TraceRecord,
}

impl TraceEntry {
    pub fn new(source: Option<String>, record: TraceRecord) -> Self {
        TraceEntry {
            timestamp: Utc::now().to_rfc3339(),
            source,
            record,
        }
    }

    /// Serialize to JSON line (with newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

/// Expand a batch report into trace entries: regime, one per cluster, summary
pub fn report_entries(report: &BatchReport, source: Option<&str>) -> Vec<TraceEntry> {
    let source = source.map(str::to_string);
    let mut entries = Vec::with_capacity(report.decisions.len() + 2);

    entries.push(TraceEntry::new(
        source.clone(),
        TraceRecord::Regime {
            regime: report.regime,
            max_run_length: report.max_run_length,
        },
    ));
    entries.extend(
        report
            .decisions
            .iter()
            .map(|d| TraceEntry::new(source.clone(), TraceRecord::Cluster(d.clone()))),
    );
    entries.push(TraceEntry::new(
        source,
        TraceRecord::Summary {
            cluster_count: report.cluster_count,
            counts: report.counts.clone(),
        },
    ));

    entries
}

/// Decision trace writer
/// Manages an append-only JSONL trace file
pub struct DecisionTrace {
    file_path: PathBuf,
}

impl DecisionTrace {
    pub fn new(file_path: PathBuf) -> Self {
        DecisionTrace { file_path }
    }

    /// Append entries to the file, creating it if needed
    pub fn append(&self, entries: &[TraceEntry]) -> Result<(), TraceError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        for entry in entries {
            file.write_all(entry.to_json_line()?.as_bytes())?;
        }

        file.flush()?;
        Ok(())
    }

    /// Append the full decision trail of a batch report
    pub fn append_report(
        &self,
        report: &BatchReport,
        source: Option<&str>,
    ) -> Result<(), TraceError> {
        self.append(&report_entries(report, source))
    }
}

/// Read trace entries from a JSONL file
pub fn read_trace_file(path: &Path) -> Result<Vec<TraceEntry>, TraceError> {
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();

    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let entry: TraceEntry = serde_json::from_str(line)?;
        entries.push(entry);
    }

    Ok(entries)
}
