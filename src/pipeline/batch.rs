// Batch analysis
// Two passes over a completed video: regime selection, then cluster counting

use serde::{Deserialize, Serialize};

use crate::clustering::{
    classify_regime, ClusterAccumulator, ClusterClassifier, Regime, RegimeConfig,
};
use crate::config::EngineConfig;
use crate::events::{
    extract_observations, ClusterDecision, DetectionFrame, EventCount, EventVocabulary,
    FrameObservation,
};

/// Result of analyzing one completed video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub regime: Regime,

    /// Longest contiguous signal run seen by the regime pass
    pub max_run_length: usize,

    /// Number of closed clusters (counted or not)
    pub cluster_count: usize,

    pub counts: EventCount,

    /// One entry per closed cluster, in frame order
    pub decisions: Vec<ClusterDecision>,
}

/// Stateless batch engine; every call is independent
#[derive(Debug, Clone)]
pub struct BatchAnalyzer {
    vocabulary: EventVocabulary,
    regime_config: RegimeConfig,
}

impl BatchAnalyzer {
    pub fn new(config: &EngineConfig) -> Self {
        BatchAnalyzer {
            vocabulary: EventVocabulary::from_config(config),
            regime_config: config.regime.clone(),
        }
    }

    /// Override the frame stride the observations were sampled at
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.regime_config = self.regime_config.with_stride(stride);
        self
    }

    /// Extract observations from raw detections, then analyze them
    pub fn analyze_frames(&self, frames: &[DetectionFrame]) -> BatchReport {
        let observations = extract_observations(frames, &self.vocabulary);
        self.analyze_observations(&observations)
    }

    /// Analyze a complete, ordered observation sequence
    ///
    /// Algorithm:
    /// 1. Regime pass over all signal runs (fixed for the rest of the run)
    /// 2. Cluster pass with the regime's thresholds, force-closing a trailing cluster
    pub fn analyze_observations(&self, observations: &[FrameObservation]) -> BatchReport {
        let regime_report = classify_regime(observations, &self.regime_config);
        log::info!(
            "Detected regime: {} (longest run {} frames, {} runs)",
            regime_report.regime.display_name(),
            regime_report.max_run_length,
            regime_report.run_count
        );

        let classifier = ClusterClassifier::new(regime_report.thresholds);
        let mut accumulator = ClusterAccumulator::new();
        let mut counts = EventCount::for_vocabulary(&self.vocabulary);
        let mut decisions = Vec::new();

        let closed = observations
            .iter()
            .cloned()
            .filter_map(|o| accumulator.push(o))
            .collect::<Vec<_>>();

        for cluster in closed.into_iter().chain(accumulator.finish()) {
            let verdict = classifier.classify_into(&cluster, &mut counts);
            let decision = ClusterDecision::from_verdict(&cluster, verdict);
            log::debug!("{}", decision.reasoning);
            decisions.push(decision);
        }

        log::info!(
            "Counted {} events from {} clusters",
            counts.total(),
            decisions.len()
        );

        BatchReport {
            regime: regime_report.regime,
            max_run_length: regime_report.max_run_length,
            cluster_count: decisions.len(),
            counts,
            decisions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Detection, EventClass};

    fn analyzer() -> BatchAnalyzer {
        BatchAnalyzer::new(&EngineConfig {
            event_classes: vec!["A".to_string(), "B".to_string()],
            ..EngineConfig::default()
        })
    }

    /// Observations from a pattern like "-AAB-" ('-' = no signal)
    fn pattern(p: &str) -> Vec<FrameObservation> {
        p.chars()
            .enumerate()
            .map(|(i, c)| match c {
                '-' => FrameObservation::none(i as u64),
                other => {
                    FrameObservation::signal(i as u64, EventClass::new(other.to_string()), 0.9)
                }
            })
            .collect()
    }

    fn a() -> EventClass {
        EventClass::new("A")
    }

    fn b() -> EventClass {
        EventClass::new("B")
    }

    #[test]
    fn test_end_to_end_dense_example() {
        let report = analyzer().analyze_observations(&pattern("-AAAAAAAA--"));

        assert_eq!(report.regime, Regime::Dense);
        assert_eq!(report.counts.get(&a()), 1);
        assert_eq!(report.counts.get(&b()), 0);
        assert_eq!(report.counts.total(), 1);
        assert_eq!(report.cluster_count, 1);
    }

    #[test]
    fn test_no_signal_gives_unknown_and_zero_counts() {
        for p in ["", "-", "-------"] {
            let report = analyzer().analyze_observations(&pattern(p));
            assert_eq!(report.regime, Regime::Unknown);
            assert!(report.counts.is_zero());
            assert!(report.decisions.is_empty());
            assert_eq!(report.counts.get(&a()), 0);
        }
    }

    #[test]
    fn test_trailing_cluster_matches_closed_cluster() {
        let open = analyzer().analyze_observations(&pattern("--AAAAAAAAA"));
        let closed = analyzer().analyze_observations(&pattern("--AAAAAAAAA-"));

        assert_eq!(open.counts, closed.counts);
        assert_eq!(open.counts.total(), 1);
        assert_eq!(open.decisions, closed.decisions);
    }

    #[test]
    fn test_sparse_counts_every_cluster() {
        let report = analyzer().analyze_observations(&pattern("A-BB-ABAB--B"));

        assert_eq!(report.regime, Regime::Sparse);
        assert_eq!(report.cluster_count, 4);
        assert_eq!(report.counts.get(&a()), 2);
        assert_eq!(report.counts.get(&b()), 2);
        assert_eq!(report.counts.total(), 4);
    }

    #[test]
    fn test_dense_regime_filters_short_and_weak_clusters() {
        // 8 frames with 4/4 split is weak, 7 frames is too short, 10 with 6 B counts
        let report =
            analyzer().analyze_observations(&pattern("AAAABBBB-AAAAAAA-BBBBBBAAAA-A"));

        assert_eq!(report.regime, Regime::Dense);
        assert_eq!(report.cluster_count, 4);
        assert_eq!(report.counts.get(&b()), 1);
        assert_eq!(report.counts.total(), 1);
        assert_eq!(
            report.decisions.iter().filter(|d| d.verdict.is_counted()).count(),
            1
        );
    }

    #[test]
    fn test_total_is_sum_of_classes() {
        for p in ["A-B-A", "AAAAAAAAB-BBBBBBBBBA", "-", "ABABABAB-BBBBBAAA"] {
            let report = analyzer().analyze_observations(&pattern(p));
            let sum: u32 = report.counts.iter().map(|(_, n)| n).sum();
            assert_eq!(report.counts.total(), sum, "pattern {}", p);
        }
    }

    #[test]
    fn test_rerun_is_identical() {
        let observations = pattern("-AABBA--BBBBBBBBBA-A");
        let engine = analyzer();

        let first = engine.analyze_observations(&observations);
        let second = engine.analyze_observations(&observations);
        assert_eq!(first, second);
    }

    #[test]
    fn test_analyze_frames_uses_vocabulary() {
        let frames = vec![
            DetectionFrame::empty(0),
            DetectionFrame::new(1, vec![Detection::new("bag", 0.9), Detection::new("a", 0.4)]),
            DetectionFrame::new(2, vec![Detection::new("bag", 0.9)]),
            DetectionFrame::new(3, vec![Detection::new("B", 0.5)]),
        ];

        let report = analyzer().analyze_frames(&frames);
        assert_eq!(report.regime, Regime::Sparse);
        assert_eq!(report.counts.get(&a()), 1);
        assert_eq!(report.counts.get(&b()), 1);
    }

    #[test]
    fn test_stride_relaxes_dense_thresholds() {
        // Sampled every 5th frame: dense needs 2 frames with a majority of 1
        let report = analyzer()
            .with_stride(5)
            .analyze_observations(&pattern("-AAB-A-"));

        assert_eq!(report.regime, Regime::Dense);
        assert_eq!(report.counts.get(&a()), 1);
        assert_eq!(report.counts.total(), 1);
    }
}
