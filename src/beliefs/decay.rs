//! Power-law confidence decay for unreinforced beliefs.
//!
//! Ebbinghaus-style forgetting with a reinforcement floor: beliefs fade when
//! neglected, but well-evidenced beliefs stay sticky and are never dropped by
//! decay alone.

use serde::{Deserialize, Serialize};

use crate::beliefs::store::BeliefStore;

/// Beliefs reinforced within this many interactions are untouched.
const MIN_DECAY_GAP: u64 = 5;

/// Floor contribution per piece of evidence beyond the first.
const EVIDENCE_FLOOR_STEP: f64 = 0.04;

/// Ceiling on the evidence floor.
const EVIDENCE_FLOOR_CAP: f64 = 0.6;

/// Tunables for the decay pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecayParams {
    /// Exponent of the power-law retention curve.
    pub decay_rate: f64,
    /// Topics whose decayed confidence falls strictly below this are dropped.
    pub min_confidence: f64,
}

impl Default for DecayParams {
    fn default() -> Self {
        Self {
            decay_rate: 0.15,
            min_confidence: 0.05,
        }
    }
}

impl BeliefStore {
    /// Decay every topic left unreinforced for at least five interactions.
    ///
    /// `retention = (1 + gap) ^ (-decay_rate)`;
    /// `floor = min(0.6, (evidence_count - 1) * 0.04)`;
    /// `new_confidence = max(floor, confidence * retention)`.
    ///
    /// A topic whose new confidence falls strictly below `min_confidence`
    /// is deleted from the opinion vector and its metadata together (the two
    /// maps never diverge). Equality keeps the topic. Returns the dropped
    /// topics.
    pub fn decay_stale(&mut self, params: &DecayParams) -> Vec<String> {
        let now = self.interaction_count;
        let mut dropped = Vec::new();

        let topics: Vec<String> = self.belief_meta.keys().cloned().collect();
        for topic in topics {
            let meta = match self.belief_meta.get_mut(&topic) {
                Some(m) => m,
                None => continue,
            };
            let gap = now.saturating_sub(meta.last_reinforced);
            if gap < MIN_DECAY_GAP {
                continue;
            }
            let retention = (1.0 + gap as f64).powf(-params.decay_rate);
            let floor = (f64::from(meta.evidence_count.saturating_sub(1)) * EVIDENCE_FLOOR_STEP)
                .max(0.0)
                .min(EVIDENCE_FLOOR_CAP);
            let new_confidence = (meta.confidence * retention).max(floor);

            if new_confidence < params.min_confidence {
                self.belief_meta.remove(&topic);
                self.opinion_vectors.remove(&topic);
                log::debug!(
                    "belief '{}' dropped after {} unreinforced interactions",
                    topic,
                    gap
                );
                dropped.push(topic);
            } else {
                meta.confidence = new_confidence;
            }
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(topic: &str, reinforcements: u32) -> BeliefStore {
        let mut store = BeliefStore::seed();
        store.begin_interaction();
        for _ in 0..reinforcements {
            store.update_opinion(topic, 1.0, 0.05, "test", 1);
        }
        store
    }

    #[test]
    fn test_fresh_beliefs_are_untouched() {
        let mut store = store_with("t", 1);
        store.interaction_count += 4; // gap of 4, below the minimum
        let before = store.meta("t").unwrap().confidence;
        let dropped = store.decay_stale(&DecayParams {
            decay_rate: 5.0,
            min_confidence: 0.05,
        });
        assert!(dropped.is_empty());
        assert_eq!(store.meta("t").unwrap().confidence, before);
    }

    #[test]
    fn test_once_reinforced_belief_can_be_dropped() {
        let mut store = store_with("t", 1);
        store.interaction_count += 500;
        let dropped = store.decay_stale(&DecayParams {
            decay_rate: 0.5,
            min_confidence: 0.05,
        });
        assert_eq!(dropped, vec!["t".to_string()]);
        // Joint deletion: both maps, never one without the other.
        assert!(store.opinion("t").is_none());
        assert!(store.meta("t").is_none());
    }

    #[test]
    fn test_well_evidenced_belief_keeps_its_floor() {
        let mut store = store_with("t", 4);
        store.interaction_count += 500;
        let dropped = store.decay_stale(&DecayParams {
            decay_rate: 0.5,
            min_confidence: 0.05,
        });
        assert!(dropped.is_empty());
        let floor = 3.0 * 0.04;
        assert!((store.meta("t").unwrap().confidence - floor).abs() < 1e-12);
        assert!(store.opinion("t").is_some());
    }

    #[test]
    fn test_default_rate_shrinks_confidence_gradually() {
        let mut store = store_with("t", 2);
        let before = store.meta("t").unwrap().confidence;
        store.interaction_count += 20;
        store.decay_stale(&DecayParams::default());
        let after = store.meta("t").unwrap().confidence;
        assert!(after < before);
        assert!(after > 0.05);
    }

    #[test]
    fn test_boundary_equality_is_not_dropped() {
        // Floor of a 4-evidence belief is exactly 0.12; with min_confidence
        // set to the same value the strict comparison keeps the topic.
        let mut store = store_with("t", 4);
        store.interaction_count += 10_000;
        let dropped = store.decay_stale(&DecayParams {
            decay_rate: 3.0,
            min_confidence: 0.12,
        });
        assert!(dropped.is_empty());
        assert!((store.meta("t").unwrap().confidence - 0.12).abs() < 1e-12);
    }

    #[test]
    fn test_decay_only_touches_stale_topics() {
        let mut store = BeliefStore::seed();
        store.begin_interaction();
        store.update_opinion("old", 1.0, 0.1, "", 1);
        store.interaction_count += 100;
        store.update_opinion("new", 1.0, 0.1, "", 1);
        let fresh_conf = store.meta("new").unwrap().confidence;
        store.decay_stale(&DecayParams::default());
        assert_eq!(store.meta("new").unwrap().confidence, fresh_conf);
        assert!(store.meta("old").unwrap().confidence < fresh_conf);
    }
}
