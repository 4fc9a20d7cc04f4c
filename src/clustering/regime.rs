// Regime classification
// Decides once per batch whether footage shows short bursts or long noisy ones

use serde::{Deserialize, Serialize};

use crate::events::types::FrameObservation;

/// Footage style of a whole batch, fixing how strict cluster filtering is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    /// Short signal bursts (stock footage style clips)
    Sparse,

    /// Long, noisy bursts (continuously filmed footage)
    Dense,

    /// No signal frames at all
    Unknown,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Sparse => "sparse",
            Regime::Dense => "dense",
            Regime::Unknown => "unknown",
        }
    }

    /// Human-readable name for reports
    pub fn display_name(&self) -> &'static str {
        match self {
            Regime::Sparse => "Sparse (stock footage)",
            Regime::Dense => "Dense (home video)",
            Regime::Unknown => "Unknown (no signal)",
        }
    }
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frame-count thresholds a cluster must meet to count as an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeThresholds {
    /// Minimum frames in a cluster for it to be considered at all
    pub min_cluster_length: usize,

    /// Minimum frames of the winning class inside an eligible cluster
    pub min_majority_count: usize,
}

impl RegimeThresholds {
    pub const fn new(min_cluster_length: usize, min_majority_count: usize) -> Self {
        RegimeThresholds {
            min_cluster_length,
            min_majority_count,
        }
    }

    fn scaled(&self, stride: usize) -> Self {
        RegimeThresholds {
            min_cluster_length: scale_frames(self.min_cluster_length, stride),
            min_majority_count: scale_frames(self.min_majority_count, stride),
        }
    }
}

/// Regime boundaries and per-regime thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    /// Longest run (in analyzed frames at stride 1) still classified as Sparse
    pub sparse_max_run: usize,

    /// Thresholds applied under the Sparse regime
    pub sparse: RegimeThresholds,

    /// Thresholds applied under the Dense regime (and the Unknown fallback)
    pub dense: RegimeThresholds,

    /// Every Nth source frame was analyzed; frame-count thresholds shrink accordingly
    pub frame_stride: usize,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        RegimeConfig {
            sparse_max_run: 6,
            sparse: RegimeThresholds::new(1, 1),
            dense: RegimeThresholds::new(8, 5),
            frame_stride: 1,
        }
    }
}

impl RegimeConfig {
    /// Same boundaries, for observations sampled every `stride` frames
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.frame_stride = stride;
        self
    }

    /// Longest Sparse run after stride scaling
    pub fn sparse_run_limit(&self) -> usize {
        scale_frames(self.sparse_max_run, self.frame_stride)
    }

    /// Thresholds for `regime` after stride scaling
    /// Unknown falls back to the Dense thresholds
    pub fn thresholds(&self, regime: Regime) -> RegimeThresholds {
        let base = match regime {
            Regime::Sparse => self.sparse,
            Regime::Dense | Regime::Unknown => self.dense,
        };
        base.scaled(self.frame_stride)
    }
}

/// max(1, ceil(frames / stride)); a zero stride is treated as 1
fn scale_frames(frames: usize, stride: usize) -> usize {
    frames.div_ceil(stride.max(1)).max(1)
}

/// Outcome of the regime pass over a full observation sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeReport {
    pub regime: Regime,

    /// Longest contiguous run of signal frames (0 when there are none)
    pub max_run_length: usize,

    /// Number of contiguous signal runs
    pub run_count: usize,

    /// Thresholds the cluster pass will apply
    pub thresholds: RegimeThresholds,
}

/// Lengths of all maximal runs of signal frames, class identity ignored
pub fn signal_run_lengths(observations: &[FrameObservation]) -> Vec<usize> {
    let mut runs = Vec::new();
    let mut current = 0usize;

    for observation in observations {
        if observation.is_signal() {
            current += 1;
        } else if current > 0 {
            runs.push(current);
            current = 0;
        }
    }

    if current > 0 {
        runs.push(current);
    }

    runs
}

/// Classify a completed sequence into a regime
///
/// Runs exactly once per batch; the result is fixed for the whole cluster pass.
pub fn classify_regime(observations: &[FrameObservation], config: &RegimeConfig) -> RegimeReport {
    let runs = signal_run_lengths(observations);
    let max_run_length = runs.iter().copied().max().unwrap_or(0);

    let regime = if runs.is_empty() {
        Regime::Unknown
    } else if max_run_length <= config.sparse_run_limit() {
        Regime::Sparse
    } else {
        Regime::Dense
    };

    log::debug!(
        "Regime pass: {} runs, longest {} frames -> {}",
        runs.len(),
        max_run_length,
        regime
    );

    RegimeReport {
        regime,
        max_run_length,
        run_count: runs.len(),
        thresholds: config.thresholds(regime),
    }
}
