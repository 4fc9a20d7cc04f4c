// Event detection module
// Per-frame data model, observation extraction, and decision records

pub mod explainability;
pub mod extractor;
pub mod types;

pub use explainability::ClusterDecision;
pub use extractor::{extract_observation, extract_observations};
pub use types::{
    AcceptedEvent, BoundingBox, Detection, DetectionFrame, EventClass, EventCount,
    EventVocabulary, FrameObservation, Signal,
};
