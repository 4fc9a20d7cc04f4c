// Explainability module
// Records why each closed cluster was or was not counted

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::clustering::{Cluster, ClusterVerdict};
use crate::events::EventClass;

/// Complete decision information for a single closed cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterDecision {
    pub start_frame: u64,
    pub end_frame: u64,
    pub length: usize,

    /// Frames per class inside the cluster
    pub class_frames: BTreeMap<EventClass, usize>,

    pub verdict: ClusterVerdict,

    // --- Explainability ---
    pub reasoning: String,
}

impl ClusterDecision {
    /// Create a decision record from a cluster and the verdict it received
    pub fn from_verdict(cluster: &Cluster, verdict: ClusterVerdict) -> Self {
        let mut class_frames: BTreeMap<EventClass, usize> = BTreeMap::new();
        for class in cluster.classes() {
            *class_frames.entry(class.clone()).or_insert(0) += 1;
        }

        let breakdown: Vec<String> = class_frames
            .iter()
            .map(|(class, n)| format!("{} x{}", class, n))
            .collect();

        let mut reason_parts = vec![format!(
            "Cluster of {} frames ({}-{}): {}.",
            cluster.len(),
            cluster.start_frame(),
            cluster.end_frame(),
            breakdown.join(", ")
        )];

        match &verdict {
            ClusterVerdict::Counted {
                class,
                majority_count,
                confidence,
            } => reason_parts.push(format!(
                "Counted 1 {} ({} frames, {}% mean confidence).",
                class,
                majority_count,
                (confidence * 100.0).round() as u32
            )),
            ClusterVerdict::TooShort { length, required } => reason_parts.push(format!(
                "Ignored: too short ({} < {} frames).",
                length, required
            )),
            ClusterVerdict::WeakMajority {
                class,
                majority_count,
                required,
            } => reason_parts.push(format!(
                "Ignored: majority {} has {} frames, needs {}.",
                class, majority_count, required
            )),
        }

        ClusterDecision {
            start_frame: cluster.start_frame(),
            end_frame: cluster.end_frame(),
            length: cluster.len(),
            class_frames,
            verdict,
            reasoning: reason_parts.join(" "),
        }
    }
}
