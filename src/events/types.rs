// Event detection types
// Event classes, per-frame detections and observations, and event tallies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::EngineConfig;

/// A countable event label such as "straight" or "hook"
/// The valid set comes from configuration, never from the engine itself
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventClass(String);

impl EventClass {
    pub fn new(label: impl Into<String>) -> Self {
        EventClass(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// The set of detector labels that count as events for one deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventVocabulary {
    classes: Vec<EventClass>,
}

impl EventVocabulary {
    /// Build a vocabulary from labels, keeping first-seen order and dropping duplicates
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: Vec<EventClass> = Vec::new();
        for label in labels {
            let class = EventClass::new(label.into().trim());
            if class.as_str().is_empty() {
                continue;
            }
            if !classes
                .iter()
                .any(|c| c.as_str().eq_ignore_ascii_case(class.as_str()))
            {
                classes.push(class);
            }
        }
        EventVocabulary { classes }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.event_classes.iter().cloned())
    }

    /// Map a raw detector label onto its configured class
    /// Matching ignores ASCII case; unknown labels resolve to None
    pub fn resolve(&self, label: &str) -> Option<&EventClass> {
        let label = label.trim();
        self.classes
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(label))
    }

    pub fn contains(&self, label: &str) -> bool {
        self.resolve(label).is_some()
    }

    pub fn classes(&self) -> &[EventClass] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Axis-aligned box in pixel coordinates (top-left, bottom-right)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// One raw detector output for a frame, already past the detector's confidence cutoff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Detector class label
    pub label: String,

    /// Detector confidence [0.0, 1.0]
    pub confidence: f32,

    /// Box location, when the upstream layer keeps it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Detection {
            label: label.into(),
            confidence,
            bbox: None,
        }
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }
}

/// All detections reported for one frame, in detector output order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    pub frame_index: u64,
    pub detections: Vec<Detection>,
}

impl DetectionFrame {
    pub fn new(frame_index: u64, detections: Vec<Detection>) -> Self {
        DetectionFrame {
            frame_index,
            detections,
        }
    }

    pub fn empty(frame_index: u64) -> Self {
        Self::new(frame_index, Vec::new())
    }
}

/// The dominant event class of a frame and its confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub class: EventClass,
    pub confidence: f32,
}

/// A frame reduced to either no signal or one dominant class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameObservation {
    pub frame_index: u64,
    pub signal: Option<Signal>,
}

impl FrameObservation {
    pub fn none(frame_index: u64) -> Self {
        FrameObservation {
            frame_index,
            signal: None,
        }
    }

    pub fn signal(frame_index: u64, class: EventClass, confidence: f32) -> Self {
        FrameObservation {
            frame_index,
            signal: Some(Signal { class, confidence }),
        }
    }

    pub fn is_signal(&self) -> bool {
        self.signal.is_some()
    }
}

/// Per-class event tally with a running total
/// `total` always equals the sum of the per-class counts
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventCount {
    #[serde(flatten)]
    counts: BTreeMap<EventClass, u32>,
    total: u32,
}

impl EventCount {
    /// Zeroed tally holding an entry for every configured class
    pub fn for_vocabulary(vocabulary: &EventVocabulary) -> Self {
        EventCount {
            counts: vocabulary
                .classes()
                .iter()
                .map(|c| (c.clone(), 0))
                .collect(),
            total: 0,
        }
    }

    /// Count one event of `class`
    pub fn record(&mut self, class: &EventClass) {
        *self.counts.entry(class.clone()).or_insert(0) += 1;
        self.total += 1;
    }

    pub fn get(&self, class: &EventClass) -> u32 {
        self.counts.get(class).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn is_zero(&self) -> bool {
        self.total == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EventClass, u32)> {
        self.counts.iter().map(|(c, n)| (c, *n))
    }
}

/// An event accepted by a live acceptance policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedEvent {
    pub class: EventClass,

    /// Confidence of the accepting frame, or the mean over the winning frames of a cluster
    pub confidence: f32,

    /// Wall-clock time the event started
    pub timestamp: DateTime<Utc>,

    /// Frame that started the event
    pub frame_index: u64,
}
