// Event acceptance policies
// Two strategies against double counting one physical action:
// full-cluster hindsight and a myopic live cooldown

pub mod cluster_majority;
pub mod cooldown;

pub use cluster_majority::ClusterMajorityPolicy;
pub use cooldown::{CooldownConfig, CooldownGate, CooldownState};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::clustering::Regime;
use crate::events::types::{AcceptedEvent, FrameObservation};

/// Decides, frame by frame, which observations become events
pub trait AcceptancePolicy {
    /// Offer the next observation; returns an event when one is accepted
    fn offer(
        &mut self,
        observation: FrameObservation,
        timestamp: DateTime<Utc>,
    ) -> Option<AcceptedEvent>;

    /// End of session: flush anything still pending
    fn finish(&mut self) -> Option<AcceptedEvent>;

    /// Forget all session state
    fn reset(&mut self);
}

impl<P: AcceptancePolicy + ?Sized> AcceptancePolicy for Box<P> {
    fn offer(
        &mut self,
        observation: FrameObservation,
        timestamp: DateTime<Utc>,
    ) -> Option<AcceptedEvent> {
        (**self).offer(observation, timestamp)
    }

    fn finish(&mut self) -> Option<AcceptedEvent> {
        (**self).finish()
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Which acceptance strategy a live session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Accept single frames, separated by at least the cooldown
    #[default]
    Cooldown,

    /// Accept whole clusters under the Sparse regime thresholds
    ClusterMajority,
}

impl PolicyKind {
    /// Build a fresh policy instance for one session
    pub fn build(&self, config: &EngineConfig) -> Box<dyn AcceptancePolicy + Send> {
        match self {
            PolicyKind::Cooldown => Box::new(CooldownGate::new(&config.cooldown)),
            PolicyKind::ClusterMajority => Box::new(ClusterMajorityPolicy::new(
                config.regime.thresholds(Regime::Sparse),
            )),
        }
    }
}
