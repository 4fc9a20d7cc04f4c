// Commands
// The operations the binary exposes: batch analysis and live replay of frame logs

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::acceptance::PolicyKind;
use crate::config::{ConfigError, EngineConfig};
use crate::events::{AcceptedEvent, DetectionFrame};
use crate::live::{drive_session, LiveFrame, LiveSession, SessionSummary};
use crate::pipeline::{
    decode_frame_log, parse_frame_log, BatchAnalyzer, BatchReport, DecisionTrace,
};

#[derive(Debug, Serialize)]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl<E: std::fmt::Display> From<E> for CommandError {
    fn from(error: E) -> Self {
        CommandError {
            message: error.to_string(),
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Load config from `path`, or fall back to the defaults
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    match path {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}

pub fn calculate_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn read_log(path: &Path) -> CommandResult<(String, Vec<DetectionFrame>)> {
    let bytes = std::fs::read(path).map_err(|e| CommandError {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;
    let sha256 = calculate_sha256(&bytes);
    let frames = parse_frame_log(&decode_frame_log(&bytes))?;
    Ok((sha256, frames))
}

// ==================== BATCH ANALYSIS ====================

#[derive(Debug, Clone)]
pub struct AnalyzeInput {
    pub log_path: PathBuf,
    pub stride: Option<usize>,
    pub trace_path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResult {
    pub source: String,
    pub source_sha256: String,
    pub frame_count: usize,
    pub report: BatchReport,
}

/// Analyze a completed video's frame log
pub fn analyze_log(config: &EngineConfig, input: AnalyzeInput) -> CommandResult<AnalysisResult> {
    let (source_sha256, frames) = read_log(&input.log_path)?;
    log::info!(
        "Analyzing {} ({} frames)",
        input.log_path.display(),
        frames.len()
    );

    let mut analyzer = BatchAnalyzer::new(config);
    if let Some(stride) = input.stride {
        if stride == 0 {
            return Err(CommandError {
                message: "Stride must be at least 1".to_string(),
            });
        }
        analyzer = analyzer.with_stride(stride);
    }

    let report = analyzer.analyze_frames(&frames);

    if let Some(trace_path) = &input.trace_path {
        DecisionTrace::new(trace_path.clone()).append_report(&report, Some(&source_sha256))?;
        log::info!("Wrote decision trace to {}", trace_path.display());
    }

    Ok(AnalysisResult {
        source: input.log_path.display().to_string(),
        source_sha256,
        frame_count: frames.len(),
        report,
    })
}

// ==================== LIVE REPLAY ====================

#[derive(Debug, Clone)]
pub struct ReplayInput {
    pub log_path: PathBuf,
    pub fps: f64,
    pub policy: PolicyKind,
}

#[derive(Debug, Serialize)]
pub struct ReplayResult {
    pub events: Vec<AcceptedEvent>,
    pub summary: SessionSummary,
}

/// Wall-clock time of `frame_index` when frames arrive at `fps` from `start`
fn frame_timestamp(
    start: DateTime<Utc>,
    frame_index: u64,
    fps: f64,
) -> CommandResult<DateTime<Utc>> {
    let out_of_range = || CommandError {
        message: format!("Frame {} at {} fps is out of the time range", frame_index, fps),
    };

    let micros = (frame_index as f64 / fps * 1_000_000.0).round();
    if !micros.is_finite() || micros >= i64::MAX as f64 {
        return Err(out_of_range());
    }
    start
        .checked_add_signed(Duration::microseconds(micros as i64))
        .ok_or_else(out_of_range)
}

/// Replay a frame log through a live session, as if frames arrived at `fps`
pub async fn replay_live(config: &EngineConfig, input: ReplayInput) -> CommandResult<ReplayResult> {
    if !(input.fps.is_finite() && input.fps > 0.0) {
        return Err(CommandError {
            message: format!("Invalid fps: {}", input.fps),
        });
    }

    let (_, frames) = read_log(&input.log_path)?;
    let session = LiveSession::new(config, input.policy.build(config));
    log::info!(
        "Replaying {} frames at {} fps through session {} ({:?})",
        frames.len(),
        input.fps,
        session.id(),
        input.policy
    );

    let (frame_tx, frame_rx) = mpsc::channel(64);
    let (event_tx, mut event_rx) = mpsc::channel(64);

    let driver = tokio::spawn(drive_session(session, frame_rx, event_tx));
    let collector = tokio::spawn(async move {
        let mut events = Vec::new();
        while let Some(event) = event_rx.recv().await {
            events.push(event);
        }
        events
    });

    let start = Utc::now();
    let mut replay_error = None;
    for frame in frames {
        let timestamp = match frame_timestamp(start, frame.frame_index, input.fps) {
            Ok(timestamp) => timestamp,
            Err(e) => {
                replay_error = Some(e);
                break;
            }
        };
        if frame_tx
            .send(LiveFrame::new(frame.detections, timestamp))
            .await
            .is_err()
        {
            break;
        }
    }
    drop(frame_tx);

    let summary = driver.await?;
    let events = collector.await?;
    if let Some(e) = replay_error {
        return Err(e);
    }

    Ok(ReplayResult { events, summary })
}
