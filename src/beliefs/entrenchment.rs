//! Entrenchment detection.
//!
//! Flags beliefs whose recent updates are statistically predictable from the
//! opinion's current sign — a symptom of self-reinforcing rather than
//! evidence-seeking behavior. Read-only: detection never alters state.

use crate::beliefs::store::BeliefStore;

/// Minimum recent signed deltas before a topic is considered.
pub const DEFAULT_MIN_UPDATES: usize = 4;

/// Topics with weaker opinions than this are ignored.
const MIN_OPINION_STRENGTH: f64 = 0.2;

/// Fraction of sign-agreeing deltas above which a topic is entrenched.
const AGREEMENT_THRESHOLD: f64 = 0.75;

impl BeliefStore {
    /// Topics whose recent updates overwhelmingly agree with the opinion's
    /// current sign.
    ///
    /// Considers topics with at least `min_updates` recorded deltas and
    /// `|opinion| >= 0.2`; flags those where more than 75% of the deltas
    /// share the opinion's sign.
    pub fn entrenched_topics(&self, min_updates: usize) -> Vec<String> {
        let mut flagged = Vec::new();
        for (topic, meta) in &self.belief_meta {
            if meta.recent_updates.len() < min_updates {
                continue;
            }
            let opinion = match self.opinion_vectors.get(topic) {
                Some(v) if v.abs() >= MIN_OPINION_STRENGTH => *v,
                _ => continue,
            };
            let agreeing = meta
                .recent_updates
                .iter()
                .filter(|delta| delta.signum() == opinion.signum() && **delta != 0.0)
                .count();
            let fraction = agreeing as f64 / meta.recent_updates.len() as f64;
            if fraction > AGREEMENT_THRESHOLD {
                flagged.push(topic.clone());
            }
        }
        flagged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_sided_updates_are_flagged() {
        let mut store = BeliefStore::seed();
        for _ in 0..6 {
            store.update_opinion("pet_theory", 1.0, 0.08, "", 1);
        }
        assert_eq!(
            store.entrenched_topics(DEFAULT_MIN_UPDATES),
            vec!["pet_theory".to_string()]
        );
    }

    #[test]
    fn test_mixed_updates_are_not_flagged() {
        let mut store = BeliefStore::seed();
        for i in 0..8 {
            let direction = if i % 2 == 0 { 1.0 } else { -1.0 };
            store.update_opinion("contested", direction, 0.08, "", 1);
        }
        // Keep the opinion strong enough to qualify, then check the mix.
        store.update_opinion("contested", 1.0, 0.5, "", 1);
        assert!(store.entrenched_topics(DEFAULT_MIN_UPDATES).is_empty());
    }

    #[test]
    fn test_weak_opinions_are_ignored() {
        let mut store = BeliefStore::seed();
        for _ in 0..6 {
            store.update_opinion("mild", 1.0, 0.02, "", 1);
        }
        assert!(store.opinion("mild").unwrap().abs() < 0.2);
        assert!(store.entrenched_topics(DEFAULT_MIN_UPDATES).is_empty());
    }

    #[test]
    fn test_too_few_updates_are_ignored() {
        let mut store = BeliefStore::seed();
        for _ in 0..3 {
            store.update_opinion("young", 1.0, 0.2, "", 1);
        }
        assert!(store.entrenched_topics(DEFAULT_MIN_UPDATES).is_empty());
    }

    #[test]
    fn test_detection_is_read_only() {
        let mut store = BeliefStore::seed();
        for _ in 0..6 {
            store.update_opinion("t", 1.0, 0.1, "", 1);
        }
        let before = serde_json::to_string(&store).unwrap();
        let _ = store.entrenched_topics(DEFAULT_MIN_UPDATES);
        let after = serde_json::to_string(&store).unwrap();
        assert_eq!(before, after);
    }
}
