// Cooldown gate
// Live-mode suppression of repeat events inside a minimum time gap

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::acceptance::AcceptancePolicy;
use crate::events::types::{AcceptedEvent, FrameObservation};

/// Configuration for the live cooldown gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    /// Minimum gap between two accepted events in milliseconds
    /// One strike plus its retraction usually fits inside ~0.8-1.0 s
    pub cooldown_ms: u64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        CooldownConfig { cooldown_ms: 900 }
    }
}

impl CooldownConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::milliseconds(i64::try_from(self.cooldown_ms).unwrap_or(i64::MAX))
    }
}

/// Session-scoped memory of the last accepted event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CooldownState {
    pub last_accepted: Option<DateTime<Utc>>,
}

/// Single-frame acceptance with a minimum separation between events
///
/// Any signal frame is a candidate. It is accepted when nothing was accepted
/// yet or at least the cooldown has elapsed since the last acceptance.
/// Timestamps are assumed monotonic; one that goes backwards reads as
/// negative elapsed time and is suppressed.
#[derive(Debug, Clone)]
pub struct CooldownGate {
    cooldown: Duration,
    state: CooldownState,
}

impl CooldownGate {
    pub fn new(config: &CooldownConfig) -> Self {
        CooldownGate {
            cooldown: config.cooldown(),
            state: CooldownState::default(),
        }
    }

    pub fn state(&self) -> CooldownState {
        self.state
    }

    /// Whether an event at `now` would pass the gate
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        match self.state.last_accepted {
            None => true,
            Some(last) => now.signed_duration_since(last) >= self.cooldown,
        }
    }
}

impl AcceptancePolicy for CooldownGate {
    fn offer(
        &mut self,
        observation: FrameObservation,
        timestamp: DateTime<Utc>,
    ) -> Option<AcceptedEvent> {
        let signal = observation.signal?;

        if !self.is_open(timestamp) {
            log::debug!(
                "Suppressed {} at frame {} (inside {} ms cooldown)",
                signal.class,
                observation.frame_index,
                self.cooldown.num_milliseconds()
            );
            return None;
        }

        self.state.last_accepted = Some(timestamp);
        Some(AcceptedEvent {
            class: signal.class,
            confidence: signal.confidence,
            timestamp,
            frame_index: observation.frame_index,
        })
    }

    fn finish(&mut self) -> Option<AcceptedEvent> {
        None
    }

    fn reset(&mut self) {
        self.state = CooldownState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::EventClass;
    use chrono::TimeZone;

    fn at_ms(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
    }

    fn punch(frame: u64) -> FrameObservation {
        FrameObservation::signal(frame, EventClass::new("straight"), 0.9)
    }

    fn gate(ms: u64) -> CooldownGate {
        CooldownGate::new(&CooldownConfig { cooldown_ms: ms })
    }

    #[test]
    fn test_first_event_is_accepted() {
        let mut gate = gate(900);
        let event = gate.offer(punch(0), at_ms(0)).unwrap();

        assert_eq!(event.class, EventClass::new("straight"));
        assert_eq!(event.timestamp, at_ms(0));
        assert_eq!(gate.state().last_accepted, Some(at_ms(0)));
    }

    #[test]
    fn test_event_inside_cooldown_is_suppressed() {
        let mut gate = gate(900);
        assert!(gate.offer(punch(0), at_ms(0)).is_some());
        assert!(gate.offer(punch(1), at_ms(899)).is_none());

        // Suppression does not move the window
        assert_eq!(gate.state().last_accepted, Some(at_ms(0)));
    }

    #[test]
    fn test_event_at_cooldown_boundary_is_accepted() {
        let mut gate = gate(900);
        assert!(gate.offer(punch(0), at_ms(0)).is_some());
        assert!(gate.offer(punch(27), at_ms(900)).is_some());
        assert!(gate.offer(punch(60), at_ms(2000)).is_some());
    }

    #[test]
    fn test_empty_frames_pass_through() {
        let mut gate = gate(900);
        assert!(gate.offer(FrameObservation::none(0), at_ms(0)).is_none());
        assert_eq!(gate.state(), CooldownState::default());
        assert!(gate.offer(punch(1), at_ms(10)).is_some());
    }

    #[test]
    fn test_backwards_timestamp_is_suppressed() {
        let mut gate = gate(900);
        assert!(gate.offer(punch(0), at_ms(5000)).is_some());
        assert!(gate.offer(punch(1), at_ms(1000)).is_none());
    }

    #[test]
    fn test_reset_clears_state() {
        let mut gate = gate(900);
        gate.offer(punch(0), at_ms(0));
        gate.reset();
        assert!(gate.offer(punch(1), at_ms(1)).is_some());
    }

    #[test]
    fn test_default_cooldown() {
        assert_eq!(CooldownConfig::default().cooldown(), Duration::milliseconds(900));
    }
}
