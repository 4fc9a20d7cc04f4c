// Cluster-majority acceptance
// Online use of the batch cluster rules: one event per qualifying cluster, emitted on close

use chrono::{DateTime, Utc};

use crate::acceptance::AcceptancePolicy;
use crate::clustering::{
    Cluster, ClusterAccumulator, ClusterClassifier, ClusterVerdict, RegimeThresholds,
};
use crate::events::types::{AcceptedEvent, FrameObservation};

/// Accepts a cluster once it closes, if it meets fixed thresholds
///
/// No regime pass is possible online, so thresholds are supplied up front.
/// Events are reported when the cluster ends, stamped with the time of its
/// first frame.
#[derive(Debug, Clone)]
pub struct ClusterMajorityPolicy {
    accumulator: ClusterAccumulator,
    classifier: ClusterClassifier,
    cluster_started_at: Option<DateTime<Utc>>,
}

impl ClusterMajorityPolicy {
    pub fn new(thresholds: RegimeThresholds) -> Self {
        ClusterMajorityPolicy {
            accumulator: ClusterAccumulator::new(),
            classifier: ClusterClassifier::new(thresholds),
            cluster_started_at: None,
        }
    }

    fn close(&mut self, cluster: Cluster) -> Option<AcceptedEvent> {
        let started_at = self.cluster_started_at.take()?;
        match self.classifier.classify(&cluster) {
            ClusterVerdict::Counted {
                class, confidence, ..
            } => Some(AcceptedEvent {
                class,
                confidence,
                timestamp: started_at,
                frame_index: cluster.start_frame(),
            }),
            other => {
                log::debug!(
                    "Dropped live cluster at frames {}-{}: {:?}",
                    cluster.start_frame(),
                    cluster.end_frame(),
                    other
                );
                None
            }
        }
    }
}

impl AcceptancePolicy for ClusterMajorityPolicy {
    fn offer(
        &mut self,
        observation: FrameObservation,
        timestamp: DateTime<Utc>,
    ) -> Option<AcceptedEvent> {
        let was_accumulating = self.accumulator.is_accumulating();
        let closed = self.accumulator.push(observation);

        if !was_accumulating && self.accumulator.is_accumulating() {
            self.cluster_started_at = Some(timestamp);
        }

        closed.and_then(|cluster| self.close(cluster))
    }

    fn finish(&mut self) -> Option<AcceptedEvent> {
        let cluster = self.accumulator.finish()?;
        self.close(cluster)
    }

    fn reset(&mut self) {
        self.accumulator.reset();
        self.cluster_started_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::EventClass;
    use chrono::{Duration, TimeZone};

    fn t(frame: u64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::milliseconds(frame as i64 * 33)
    }

    fn feed(policy: &mut ClusterMajorityPolicy, pattern: &str) -> Vec<AcceptedEvent> {
        let mut events: Vec<AcceptedEvent> = pattern
            .chars()
            .enumerate()
            .filter_map(|(i, c)| {
                let obs = match c {
                    '-' => FrameObservation::none(i as u64),
                    other => {
                        FrameObservation::signal(i as u64, EventClass::new(other.to_string()), 0.5)
                    }
                };
                policy.offer(obs, t(i as u64))
            })
            .collect();
        events.extend(policy.finish());
        events
    }

    #[test]
    fn test_emits_on_cluster_close() {
        let mut policy = ClusterMajorityPolicy::new(RegimeThresholds::new(1, 1));
        let events = feed(&mut policy, "-ABA-");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].class, EventClass::new("A"));
        assert_eq!(events[0].frame_index, 1);
        assert_eq!(events[0].timestamp, t(1));
    }

    #[test]
    fn test_trailing_cluster_emitted_on_finish() {
        let mut policy = ClusterMajorityPolicy::new(RegimeThresholds::new(8, 5));
        let events = feed(&mut policy, "--AAAAAAAA");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].frame_index, 2);
    }

    #[test]
    fn test_short_clusters_are_dropped() {
        let mut policy = ClusterMajorityPolicy::new(RegimeThresholds::new(8, 5));
        assert!(feed(&mut policy, "AAAAAAA-AAA-").is_empty());
    }

    #[test]
    fn test_reset_discards_open_cluster() {
        let mut policy = ClusterMajorityPolicy::new(RegimeThresholds::new(1, 1));
        policy.offer(
            FrameObservation::signal(0, EventClass::new("hook"), 0.9),
            t(0),
        );
        policy.reset();
        assert!(policy.finish().is_none());
    }
}
