//! Cooling-off (staged) opinion updates.
//!
//! A caller can delay an opinion shift so that contradictory signals inside
//! the cooling window cancel instead of causing oscillation. Staged updates
//! are immutable after creation and are consumed, merged per topic, once
//! their due interaction arrives.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::beliefs::store::BeliefStore;

/// Below this |direction * magnitude| a staging request is a no-op.
const STAGE_NOOP_EPSILON: f64 = 1e-9;

/// A merged per-topic net below this is dropped entirely — equal and
/// opposite staged pressures cancel without touching the store.
const NET_CANCEL_EPSILON: f64 = 1e-4;

/// A delayed opinion change awaiting its due interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedOpinionUpdate {
    /// Topic the update targets.
    pub topic: String,
    /// Signed magnitude (direction folded in at staging time).
    pub signed_magnitude: f64,
    /// Interaction index at which the update was staged.
    pub staged_at: u64,
    /// Interaction index at which the update becomes applicable.
    pub due_interaction: u64,
    /// Where the evidence came from.
    pub provenance: String,
}

impl BeliefStore {
    /// Stage an opinion update behind a cooling-off delay.
    ///
    /// Returns the due interaction. A vanishing `|direction * magnitude|`
    /// stages nothing and returns the current interaction unchanged.
    pub fn stage_opinion_update(
        &mut self,
        topic: &str,
        direction: f64,
        magnitude: f64,
        cooling_period: u64,
        provenance: &str,
    ) -> u64 {
        let signed_magnitude = direction * magnitude;
        if signed_magnitude.abs() < STAGE_NOOP_EPSILON {
            return self.interaction_count;
        }
        let due_interaction = self.interaction_count + cooling_period.max(1);
        self.staged_opinion_updates.push(StagedOpinionUpdate {
            topic: topic.to_string(),
            signed_magnitude,
            staged_at: self.interaction_count,
            due_interaction,
            provenance: provenance.to_string(),
        });
        log::debug!(
            "staged {:+.4} on '{}' until interaction {}",
            signed_magnitude,
            topic,
            due_interaction
        );
        due_interaction
    }

    /// Apply every staged update whose due interaction has arrived.
    ///
    /// Due updates are merged per topic into a net signed magnitude. A net
    /// below the cancellation epsilon drops the whole group (no opinion
    /// change, no evidence-count increment); otherwise the immediate-update
    /// path runs once per topic with the contributing count as the evidence
    /// increment and the most recently staged provenance.
    ///
    /// Returns a description per applied topic.
    pub fn apply_due_staged_updates(&mut self) -> Vec<String> {
        let now = self.interaction_count;
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.staged_opinion_updates)
            .into_iter()
            .partition(|u| u.due_interaction <= now);
        self.staged_opinion_updates = pending;

        let mut groups: BTreeMap<String, Vec<StagedOpinionUpdate>> = BTreeMap::new();
        for update in due {
            groups.entry(update.topic.clone()).or_default().push(update);
        }

        let mut applied = Vec::new();
        for (topic, group) in groups {
            let net: f64 = group.iter().map(|u| u.signed_magnitude).sum();
            if net.abs() < NET_CANCEL_EPSILON {
                log::debug!(
                    "staged updates on '{}' net-cancelled ({} contributions)",
                    topic,
                    group.len()
                );
                continue;
            }
            let provenance = group
                .iter()
                .max_by_key(|u| u.staged_at)
                .map(|u| u.provenance.clone())
                .unwrap_or_default();
            let count = group.len() as u32;
            self.update_opinion(&topic, net.signum(), net.abs(), &provenance, count);
            applied.push(format!(
                "applied staged shift {:+.4} on '{}' from {} contribution(s)",
                net, topic, count
            ));
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vanishing_magnitude_is_a_noop() {
        let mut store = BeliefStore::seed();
        store.begin_interaction();
        let due = store.stage_opinion_update("t", 1.0, 0.0, 3, "x");
        assert_eq!(due, store.interaction_count);
        assert!(store.staged_opinion_updates.is_empty());
    }

    #[test]
    fn test_cooling_period_has_a_floor_of_one() {
        let mut store = BeliefStore::seed();
        store.begin_interaction();
        let due = store.stage_opinion_update("t", 1.0, 0.1, 0, "x");
        assert_eq!(due, store.interaction_count + 1);
    }

    #[test]
    fn test_not_yet_due_updates_stay_staged() {
        let mut store = BeliefStore::seed();
        store.begin_interaction();
        store.stage_opinion_update("t", 1.0, 0.1, 5, "x");
        let applied = store.apply_due_staged_updates();
        assert!(applied.is_empty());
        assert_eq!(store.staged_opinion_updates.len(), 1);
        assert!(store.opinion("t").is_none());
    }

    #[test]
    fn test_equal_and_opposite_staged_updates_cancel() {
        let mut store = BeliefStore::seed();
        store.begin_interaction();
        store.stage_opinion_update("t", 1.0, 0.08, 2, "pro");
        store.stage_opinion_update("t", -1.0, 0.08, 2, "con");
        for _ in 0..3 {
            store.begin_interaction();
        }
        let applied = store.apply_due_staged_updates();
        assert!(applied.is_empty());
        // No opinion change and no metadata creation.
        assert!(store.opinion("t").is_none());
        assert!(store.meta("t").is_none());
        assert!(store.staged_opinion_updates.is_empty());
    }

    #[test]
    fn test_merged_group_applies_once_with_contribution_count() {
        let mut store = BeliefStore::seed();
        store.begin_interaction();
        store.stage_opinion_update("t", 1.0, 0.05, 1, "first");
        store.begin_interaction();
        store.stage_opinion_update("t", 1.0, 0.03, 1, "second");
        store.begin_interaction();
        let applied = store.apply_due_staged_updates();
        assert_eq!(applied.len(), 1);
        let opinion = store.opinion("t").unwrap();
        assert!((opinion - 0.08).abs() < 1e-12);
        let meta = store.meta("t").unwrap();
        assert_eq!(meta.evidence_count, 2);
        // Most recently staged provenance wins.
        assert_eq!(meta.provenance, "second");
    }

    #[test]
    fn test_net_opposing_updates_apply_the_difference() {
        let mut store = BeliefStore::seed();
        store.begin_interaction();
        store.stage_opinion_update("t", 1.0, 0.10, 1, "pro");
        store.stage_opinion_update("t", -1.0, 0.04, 1, "con");
        store.begin_interaction();
        store.apply_due_staged_updates();
        let opinion = store.opinion("t").unwrap();
        assert!((opinion - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_due_partition_leaves_other_topics_alone() {
        let mut store = BeliefStore::seed();
        store.begin_interaction();
        store.stage_opinion_update("soon", 1.0, 0.05, 1, "a");
        store.stage_opinion_update("later", 1.0, 0.05, 10, "b");
        store.begin_interaction();
        let applied = store.apply_due_staged_updates();
        assert_eq!(applied.len(), 1);
        assert!(store.opinion("soon").is_some());
        assert!(store.opinion("later").is_none());
        assert_eq!(store.staged_opinion_updates.len(), 1);
        assert_eq!(store.staged_opinion_updates[0].topic, "later");
    }
}
