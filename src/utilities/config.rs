//! Engine configuration scalars.
//!
//! The engine consumes these values but does not own their loading; the
//! process wiring injects them (or takes the defaults).

use serde::{Deserialize, Serialize};

/// Plain scalars injected into the magnitude function and snapshot handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base update rate: the largest single-evidence opinion shift before
    /// quality/novelty/dampening scaling.
    pub base_rate: f64,
    /// Interaction count below which updates are dampened to half strength.
    pub bootstrap_threshold: u64,
    /// Absolute character budget for the personality snapshot; enforced by
    /// the caller before a rewrite is proposed.
    pub max_snapshot_chars: usize,
    /// Minimum evidence score worth acting on at all.
    pub min_evidence_score: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_rate: 0.10,
            bootstrap_threshold: 10,
            max_snapshot_chars: 1200,
            min_evidence_score: 0.2,
        }
    }
}
