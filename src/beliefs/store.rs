//! The belief store — the authoritative mutable state for one agent identity.
//!
//! Owns the per-topic opinion scalars and their metadata, the free-text
//! personality snapshot, behavioral aggregates, and the audit ring of recent
//! shifts. All mutation rules live here or in the sibling modules that extend
//! this type (staging, decay, entrenchment).
//!
//! Single-threaded by design: callers serialize interactions per agent
//! identity. One `BeliefStore` per conversation, never shared across
//! concurrent requests without external locking.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::beliefs::snapshot::SnapshotGuard;
use crate::beliefs::staged::StagedOpinionUpdate;

/// Most recent signed deltas kept per topic (oldest evicted).
pub const MAX_RECENT_UPDATES: usize = 8;

/// Most recent audit shifts kept on the store (oldest evicted).
pub const MAX_RECENT_SHIFTS: usize = 10;

/// Evidence count at which confidence saturates at 1.0.
const CONFIDENCE_SATURATION_COUNT: f64 = 20.0;

/// Canned snapshot text for a freshly seeded identity.
const SEED_SNAPSHOT: &str = "I am still forming my views. I hold no strong \
opinions yet and I am curious about almost everything; my positions will \
settle as I encounter evidence worth keeping.";

/// Per-topic belief metadata.
///
/// `confidence` is a deterministic function of `evidence_count` immediately
/// after any reinforcement; only [`BeliefStore::update_opinion`] and the
/// decay pass may write it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeliefMeta {
    /// Confidence in [0, 1], log-scaled from accumulated evidence.
    pub confidence: f64,
    /// Pieces of evidence that have reinforced this topic (>= 1).
    pub evidence_count: u32,
    /// Interaction index of the last reinforcement.
    pub last_reinforced: u64,
    /// Free-text note on where the belief last came from.
    #[serde(default)]
    pub provenance: String,
    /// Bounded ring of recent signed deltas, newest last.
    #[serde(default)]
    pub recent_updates: Vec<f64>,
}

/// Append-only audit record of one opinion shift. Observability only;
/// decision logic never reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    /// Interaction index at which the shift happened.
    pub interaction: u64,
    /// RFC 3339 wall-clock timestamp.
    pub timestamp: String,
    /// Human-readable description of what moved and why.
    pub description: String,
    /// Absolute size of the applied change.
    pub magnitude: f64,
}

/// Behavioral aggregates maintained across interactions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BehavioralSignature {
    /// Running mean of per-interaction disagreement samples.
    #[serde(default)]
    pub disagreement_rate: f64,
    /// Number of samples folded into the running mean.
    #[serde(default)]
    pub disagreement_samples: u64,
    /// Per-topic engagement counters.
    #[serde(default)]
    pub engagement: BTreeMap<String, u64>,
}

impl BehavioralSignature {
    /// Fold one disagreement sample into the running mean.
    pub fn record_disagreement(&mut self, sample: f64) {
        self.disagreement_samples += 1;
        let n = self.disagreement_samples as f64;
        self.disagreement_rate += (sample - self.disagreement_rate) / n;
    }

    /// Bump the engagement counter for each topic touched.
    pub fn record_engagement<S: AsRef<str>>(&mut self, topics: &[S]) {
        for topic in topics {
            *self
                .engagement
                .entry(topic.as_ref().to_string())
                .or_insert(0) += 1;
        }
    }
}

/// Confidence as a log-scaled function of accumulated evidence.
///
/// `min(1, log2(count + 1) / log2(20))`: one piece of evidence lands around
/// 0.23, nineteen or more saturate at 1.0.
pub fn confidence_from_count(evidence_count: u32) -> f64 {
    let raw = ((evidence_count as f64) + 1.0).log2() / CONFIDENCE_SATURATION_COUNT.log2();
    raw.min(1.0)
}

/// The aggregate root: one agent identity's complete belief state.
///
/// Every field uses a serde default so that older persisted versions remain
/// loadable after the migration pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeliefStore {
    /// Persisted version, bumped on every save.
    #[serde(default = "default_version")]
    pub version: u64,
    /// Monotonic interaction clock.
    #[serde(default)]
    pub interaction_count: u64,
    /// Per-topic opinion scalars in [-1, 1]; in lockstep with `belief_meta`.
    #[serde(default)]
    pub opinion_vectors: BTreeMap<String, f64>,
    /// Per-topic metadata; in lockstep with `opinion_vectors`.
    #[serde(default)]
    pub belief_meta: BTreeMap<String, BeliefMeta>,
    /// Free-text personality summary, guarded against lossy rewrites.
    #[serde(default)]
    pub snapshot: String,
    /// Free-text tone descriptor used by prompt assembly.
    #[serde(default = "default_tone")]
    pub tone: String,
    /// Behavioral aggregates.
    #[serde(default)]
    pub behavioral_signature: BehavioralSignature,
    /// Bounded audit ring of recent opinion shifts.
    #[serde(default)]
    pub recent_shifts: Vec<Shift>,
    /// Free-text insight queue consumed by the reflection process.
    #[serde(default)]
    pub pending_insights: Vec<String>,
    /// Cooling-off updates awaiting their due interaction.
    #[serde(default)]
    pub staged_opinion_updates: Vec<StagedOpinionUpdate>,
    /// Interaction index of the last reflection pass.
    #[serde(default)]
    pub last_reflection_at: u64,
}

fn default_version() -> u64 {
    1
}

fn default_tone() -> String {
    "curious".to_string()
}

impl Default for BeliefStore {
    fn default() -> Self {
        Self::seed()
    }
}

impl BeliefStore {
    /// The fixed seed state used when no persisted state exists.
    pub fn seed() -> Self {
        Self {
            version: 1,
            interaction_count: 0,
            opinion_vectors: BTreeMap::new(),
            belief_meta: BTreeMap::new(),
            snapshot: SEED_SNAPSHOT.to_string(),
            tone: default_tone(),
            behavioral_signature: BehavioralSignature::default(),
            recent_shifts: Vec::new(),
            pending_insights: Vec::new(),
            staged_opinion_updates: Vec::new(),
            last_reflection_at: 0,
        }
    }

    /// Advance the interaction clock. Returns the new interaction index.
    pub fn begin_interaction(&mut self) -> u64 {
        self.interaction_count += 1;
        self.interaction_count
    }

    /// Current opinion scalar for a topic, if held.
    pub fn opinion(&self, topic: &str) -> Option<f64> {
        self.opinion_vectors.get(topic).copied()
    }

    /// Metadata for a topic, if held.
    pub fn meta(&self, topic: &str) -> Option<&BeliefMeta> {
        self.belief_meta.get(topic)
    }

    /// Commit one opinion update immediately.
    ///
    /// The new scalar is `clamp(old + direction * magnitude, -1, 1)`.
    /// Metadata is created or reinforced, and confidence is recomputed from
    /// the evidence count — this is the only reinforcement path allowed to
    /// touch `confidence`.
    ///
    /// # Arguments
    /// * `direction` - Signed direction, usually -1/0/+1.
    /// * `magnitude` - Non-negative update size from the magnitude function.
    /// * `provenance` - Where the evidence came from; empty keeps the old note.
    /// * `evidence_increment` - Evidence pieces this update represents (min 1).
    pub fn update_opinion(
        &mut self,
        topic: &str,
        direction: f64,
        magnitude: f64,
        provenance: &str,
        evidence_increment: u32,
    ) {
        let delta = direction * magnitude;
        let old = self.opinion_vectors.get(topic).copied().unwrap_or(0.0);
        let new = (old + delta).clamp(-1.0, 1.0);
        self.opinion_vectors.insert(topic.to_string(), new);

        let increment = evidence_increment.max(1);
        let interaction = self.interaction_count;
        match self.belief_meta.get_mut(topic) {
            Some(meta) => {
                meta.evidence_count += increment;
                meta.confidence = confidence_from_count(meta.evidence_count);
                meta.last_reinforced = interaction;
                meta.recent_updates.push(delta);
                if meta.recent_updates.len() > MAX_RECENT_UPDATES {
                    let overflow = meta.recent_updates.len() - MAX_RECENT_UPDATES;
                    meta.recent_updates.drain(..overflow);
                }
                if !provenance.is_empty() {
                    meta.provenance = provenance.to_string();
                }
            }
            None => {
                self.belief_meta.insert(
                    topic.to_string(),
                    BeliefMeta {
                        confidence: confidence_from_count(increment),
                        evidence_count: increment,
                        last_reinforced: interaction,
                        provenance: provenance.to_string(),
                        recent_updates: vec![delta],
                    },
                );
            }
        }

        let applied = new - old;
        if applied != 0.0 {
            log::debug!(
                "opinion '{}' moved {:+.4} to {:+.4} ({})",
                topic,
                applied,
                new,
                provenance
            );
            self.record_shift(
                format!("opinion on '{}' shifted {:+.3} ({})", topic, applied, provenance),
                applied.abs(),
            );
        }
    }

    /// Append a shift to the bounded audit ring.
    pub(crate) fn record_shift(&mut self, description: String, magnitude: f64) {
        self.recent_shifts.push(Shift {
            interaction: self.interaction_count,
            timestamp: Utc::now().to_rfc3339(),
            description,
            magnitude,
        });
        if self.recent_shifts.len() > MAX_RECENT_SHIFTS {
            let overflow = self.recent_shifts.len() - MAX_RECENT_SHIFTS;
            self.recent_shifts.drain(..overflow);
        }
    }

    /// Adopt a proposed snapshot rewrite if the guard accepts it.
    ///
    /// A rejected rewrite is discarded and the prior snapshot kept; this is
    /// never an error. Returns whether the rewrite was adopted.
    pub fn adopt_snapshot(&mut self, proposed: &str, guard: &SnapshotGuard) -> bool {
        if guard.validate(&self.snapshot, proposed) {
            self.snapshot = proposed.to_string();
            true
        } else {
            false
        }
    }

    /// Queue an insight for the (external) reflection consumer.
    pub fn push_insight(&mut self, insight: impl Into<String>) {
        self.pending_insights.push(insight.into());
    }

    /// Take all pending insights, leaving the queue empty.
    pub fn drain_insights(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_insights)
    }

    /// Record that a reflection pass ran this interaction.
    pub fn mark_reflection(&mut self) {
        self.last_reflection_at = self.interaction_count;
    }

    /// Sorted (topic, opinion, confidence) view for prompt assembly.
    pub fn describe_opinions(&self) -> Vec<(String, f64, f64)> {
        self.opinion_vectors
            .iter()
            .map(|(topic, value)| {
                let confidence = self
                    .belief_meta
                    .get(topic)
                    .map(|m| m.confidence)
                    .unwrap_or(0.0);
                (topic.clone(), *value, confidence)
            })
            .collect()
    }
}
