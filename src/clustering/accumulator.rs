// Cluster accumulation
// Groups consecutive signal frames into clusters, closing on the first empty frame

use crate::events::types::{EventClass, FrameObservation, Signal};

/// A closed, maximal run of signal frames
/// Never empty; members are in frame order
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    start_frame: u64,
    end_frame: u64,
    members: Vec<Signal>,
}

impl Cluster {
    fn open(frame_index: u64, signal: Signal) -> Self {
        Cluster {
            start_frame: frame_index,
            end_frame: frame_index,
            members: vec![signal],
        }
    }

    fn extend(&mut self, frame_index: u64, signal: Signal) {
        self.end_frame = frame_index;
        self.members.push(signal);
    }

    /// Build a cluster directly from classes, one per frame starting at `start_frame`
    pub fn from_classes<I>(start_frame: u64, classes: I) -> Option<Self>
    where
        I: IntoIterator<Item = EventClass>,
    {
        let members: Vec<Signal> = classes
            .into_iter()
            .map(|class| Signal {
                class,
                confidence: 1.0,
            })
            .collect();
        if members.is_empty() {
            return None;
        }
        Some(Cluster {
            start_frame,
            end_frame: start_frame + members.len() as u64 - 1,
            members,
        })
    }

    pub fn start_frame(&self) -> u64 {
        self.start_frame
    }

    pub fn end_frame(&self) -> u64 {
        self.end_frame
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Signal] {
        &self.members
    }

    pub fn classes(&self) -> impl Iterator<Item = &EventClass> {
        self.members.iter().map(|s| &s.class)
    }
}

/// Accumulator state: outside a cluster, or inside one
#[derive(Debug, Clone, PartialEq, Default)]
enum AccumulatorState {
    #[default]
    Idle,
    Accumulating(Cluster),
}

/// State machine turning an ordered observation stream into closed clusters
///
/// One instance per video or session. `finish` must be called at end of
/// stream so a trailing cluster is closed exactly like one followed by an
/// empty frame.
#[derive(Debug, Clone, Default)]
pub struct ClusterAccumulator {
    state: AccumulatorState,
}

impl ClusterAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next observation; returns a cluster when this frame closes one
    pub fn push(&mut self, observation: FrameObservation) -> Option<Cluster> {
        let FrameObservation {
            frame_index,
            signal,
        } = observation;

        match (std::mem::take(&mut self.state), signal) {
            (AccumulatorState::Idle, Some(signal)) => {
                self.state = AccumulatorState::Accumulating(Cluster::open(frame_index, signal));
                None
            }
            (AccumulatorState::Accumulating(mut cluster), Some(signal)) => {
                cluster.extend(frame_index, signal);
                self.state = AccumulatorState::Accumulating(cluster);
                None
            }
            (AccumulatorState::Accumulating(cluster), None) => Some(cluster),
            (AccumulatorState::Idle, None) => None,
        }
    }

    /// End of stream: force-close any open cluster
    pub fn finish(&mut self) -> Option<Cluster> {
        match std::mem::take(&mut self.state) {
            AccumulatorState::Accumulating(cluster) => Some(cluster),
            AccumulatorState::Idle => None,
        }
    }

    /// Whether a cluster is currently open
    pub fn is_accumulating(&self) -> bool {
        matches!(self.state, AccumulatorState::Accumulating(_))
    }

    /// Frames held by the open cluster (0 when idle)
    pub fn pending_len(&self) -> usize {
        match &self.state {
            AccumulatorState::Accumulating(cluster) => cluster.len(),
            AccumulatorState::Idle => 0,
        }
    }

    /// Drop any open cluster without closing it
    pub fn reset(&mut self) {
        self.state = AccumulatorState::Idle;
    }
}

/// Split a whole sequence into clusters, force-closing a trailing one
pub fn collect_clusters<I>(observations: I) -> Vec<Cluster>
where
    I: IntoIterator<Item = FrameObservation>,
{
    let mut accumulator = ClusterAccumulator::new();
    let mut clusters: Vec<Cluster> = observations
        .into_iter()
        .filter_map(|o| accumulator.push(o))
        .collect();
    clusters.extend(accumulator.finish());
    clusters
}
