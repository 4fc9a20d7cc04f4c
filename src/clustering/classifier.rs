// Cluster classification
// Applies length and majority thresholds to a closed cluster and names its class

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::clustering::accumulator::Cluster;
use crate::clustering::regime::RegimeThresholds;
use crate::events::types::{EventClass, EventCount};

/// What a closed cluster amounts to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum ClusterVerdict {
    /// The cluster counts as exactly one event of `class`
    Counted {
        class: EventClass,
        majority_count: usize,
        /// Mean confidence over the frames carrying `class`
        confidence: f32,
    },

    /// Fewer frames than the regime's minimum cluster length
    TooShort { length: usize, required: usize },

    /// The winning class did not reach the regime's minimum majority
    WeakMajority {
        class: EventClass,
        majority_count: usize,
        required: usize,
    },
}

impl ClusterVerdict {
    pub fn is_counted(&self) -> bool {
        matches!(self, ClusterVerdict::Counted { .. })
    }

    /// The counted class, if any
    pub fn counted_class(&self) -> Option<&EventClass> {
        match self {
            ClusterVerdict::Counted { class, .. } => Some(class),
            _ => None,
        }
    }
}

/// Majority class of a cluster and how many frames carry it
///
/// Ties go to the class that appears earliest in the cluster.
pub fn majority_class(cluster: &Cluster) -> Option<(&EventClass, usize)> {
    let mut frame_counts: HashMap<&EventClass, usize> = HashMap::new();
    for class in cluster.classes() {
        *frame_counts.entry(class).or_insert(0) += 1;
    }

    let majority_count = frame_counts.values().copied().max()?;
    cluster
        .classes()
        .find(|c| frame_counts.get(c).copied() == Some(majority_count))
        .map(|c| (c, majority_count))
}

/// Per-regime threshold filter deciding whether a cluster is one event
#[derive(Debug, Clone, Copy)]
pub struct ClusterClassifier {
    thresholds: RegimeThresholds,
}

impl ClusterClassifier {
    pub fn new(thresholds: RegimeThresholds) -> Self {
        ClusterClassifier { thresholds }
    }

    /// Classify one closed cluster
    pub fn classify(&self, cluster: &Cluster) -> ClusterVerdict {
        let length = cluster.len();
        if length < self.thresholds.min_cluster_length {
            return ClusterVerdict::TooShort {
                length,
                required: self.thresholds.min_cluster_length,
            };
        }

        let Some((class, majority_count)) = majority_class(cluster) else {
            return ClusterVerdict::TooShort {
                length,
                required: self.thresholds.min_cluster_length,
            };
        };

        if majority_count < self.thresholds.min_majority_count {
            return ClusterVerdict::WeakMajority {
                class: class.clone(),
                majority_count,
                required: self.thresholds.min_majority_count,
            };
        }

        let confidence_sum: f32 = cluster
            .members()
            .iter()
            .filter(|s| &s.class == class)
            .map(|s| s.confidence)
            .sum();

        ClusterVerdict::Counted {
            class: class.clone(),
            majority_count,
            confidence: confidence_sum / majority_count as f32,
        }
    }

    /// Classify and, when counted, add exactly one event to `counts`
    pub fn classify_into(&self, cluster: &Cluster, counts: &mut EventCount) -> ClusterVerdict {
        let verdict = self.classify(cluster);
        if let Some(class) = verdict.counted_class() {
            counts.record(class);
        }
        verdict
    }
}
