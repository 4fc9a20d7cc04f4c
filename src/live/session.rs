// Live session
// One streaming user: per-frame extraction, an acceptance policy, and a running tally

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::acceptance::{AcceptancePolicy, CooldownGate};
use crate::config::EngineConfig;
use crate::events::{extract_observation, AcceptedEvent, Detection, EventCount, EventVocabulary};

/// Final tally of a live session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub frames_processed: u64,
    pub counts: EventCount,
}

/// Session-scoped streaming engine
///
/// Owns all of its state; sessions never share anything, so one instance per
/// connection can run concurrently without coordination. Frames must arrive
/// in order with non-decreasing timestamps.
pub struct LiveSession<P: AcceptancePolicy = CooldownGate> {
    id: Uuid,
    vocabulary: EventVocabulary,
    policy: P,
    counts: EventCount,
    frames_processed: u64,
}

impl LiveSession<CooldownGate> {
    /// Session using the cooldown gate from `config`
    pub fn with_cooldown(config: &EngineConfig) -> Self {
        Self::new(config, CooldownGate::new(&config.cooldown))
    }
}

impl<P: AcceptancePolicy> LiveSession<P> {
    pub fn new(config: &EngineConfig, policy: P) -> Self {
        let vocabulary = EventVocabulary::from_config(config);
        let counts = EventCount::for_vocabulary(&vocabulary);
        let id = Uuid::new_v4();
        log::info!("Live session {} started", id);

        LiveSession {
            id,
            vocabulary,
            policy,
            counts,
            frames_processed: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn counts(&self) -> &EventCount {
        &self.counts
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Process one frame's detections; returns the event it produced, if any
    pub fn process_frame(
        &mut self,
        detections: &[Detection],
        timestamp: DateTime<Utc>,
    ) -> Option<AcceptedEvent> {
        let observation = extract_observation(self.frames_processed, detections, &self.vocabulary);
        self.frames_processed += 1;

        let event = self.policy.offer(observation, timestamp)?;
        self.record(&event);
        Some(event)
    }

    fn record(&mut self, event: &AcceptedEvent) {
        self.counts.record(&event.class);
        log::debug!(
            "Session {}: {} ({:.2}) at frame {}",
            self.id,
            event.class,
            event.confidence,
            event.frame_index
        );
    }

    /// Flush anything the policy still holds without ending the session
    pub fn flush(&mut self) -> Option<AcceptedEvent> {
        let event = self.policy.finish()?;
        self.record(&event);
        Some(event)
    }

    /// End the session, force-closing pending state, and return its tally
    pub fn end(mut self) -> (Option<AcceptedEvent>, SessionSummary) {
        let last = self.flush();
        self.policy.reset();

        log::info!(
            "Live session {} ended: {} events over {} frames",
            self.id,
            self.counts.total(),
            self.frames_processed
        );

        let summary = SessionSummary {
            session_id: self.id,
            frames_processed: self.frames_processed,
            counts: self.counts,
        };
        (last, summary)
    }
}
