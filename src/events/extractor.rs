// Frame observation extraction
// Reduces one frame's detections to its single most confident event class

use crate::events::types::{Detection, DetectionFrame, EventVocabulary, FrameObservation};

/// Pick the dominant event class for one frame
///
/// Only detections whose label is in the vocabulary are considered. Among
/// those, the strictly highest confidence wins, so a tie keeps the detection
/// the detector listed first. Non-finite confidences are ignored.
pub fn extract_observation(
    frame_index: u64,
    detections: &[Detection],
    vocabulary: &EventVocabulary,
) -> FrameObservation {
    let mut best: Option<(&Detection, f32)> = None;

    for detection in detections {
        if !detection.confidence.is_finite() {
            continue;
        }
        if !vocabulary.contains(&detection.label) {
            continue;
        }
        match best {
            Some((_, best_conf)) if detection.confidence <= best_conf => {}
            _ => best = Some((detection, detection.confidence)),
        }
    }

    match best.and_then(|(d, conf)| vocabulary.resolve(&d.label).map(|c| (c, conf))) {
        Some((class, confidence)) => {
            FrameObservation::signal(frame_index, class.clone(), confidence)
        }
        None => FrameObservation::none(frame_index),
    }
}

/// Extract one observation per frame, preserving frame order
pub fn extract_observations(
    frames: &[DetectionFrame],
    vocabulary: &EventVocabulary,
) -> Vec<FrameObservation> {
    frames
        .iter()
        .map(|f| extract_observation(f.frame_index, &f.detections, vocabulary))
        .collect()
}
