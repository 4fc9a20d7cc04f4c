// Clustering module
// Regime selection, cluster accumulation, and per-cluster classification

pub mod accumulator;
pub mod classifier;
pub mod regime;

pub use accumulator::{collect_clusters, Cluster, ClusterAccumulator};
pub use classifier::{majority_class, ClusterClassifier, ClusterVerdict};
pub use regime::{
    classify_regime, signal_run_lengths, Regime, RegimeConfig, RegimeReport, RegimeThresholds,
};
