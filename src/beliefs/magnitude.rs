//! The magnitude function: evidence record -> bounded update size.
//!
//! Raw classifier score alone overreacts to confidently-worded but
//! low-quality claims; weighting by reasoning type and source reliability
//! approximates quality-aware revision without extra model calls.

use crate::beliefs::store::BeliefStore;
use crate::evidence::record::{EvidenceRecord, ReasoningType, SourceReliability};
use crate::utilities::config::EngineConfig;

/// Multiplier applied when the evidence is internally inconsistent.
const INCONSISTENCY_PENALTY: f64 = 0.75;

/// Novelty floor: already-familiar but strong evidence still moves opinions.
const NOVELTY_FLOOR: f64 = 0.1;

/// Dampening applied while the identity is still bootstrapping.
const BOOTSTRAP_DAMPENING: f64 = 0.5;

/// Quality weight of the argument kind. Empirical, logical, and expert
/// reasoning count fully; anecdotes less; social and emotional pressure
/// least among actual arguments.
pub fn reasoning_weight(reasoning_type: ReasoningType) -> f64 {
    match reasoning_type {
        ReasoningType::EmpiricalData
        | ReasoningType::LogicalArgument
        | ReasoningType::ExpertOpinion => 1.00,
        ReasoningType::Anecdotal => 0.85,
        ReasoningType::SocialPressure | ReasoningType::EmotionalAppeal => 0.65,
        ReasoningType::NoArgument => 0.60,
    }
}

/// Quality weight of the source reliability judgement.
pub fn reliability_weight(source_reliability: SourceReliability) -> f64 {
    match source_reliability {
        SourceReliability::PeerReviewed
        | SourceReliability::EstablishedExpert
        | SourceReliability::InformedOpinion => 1.00,
        SourceReliability::CasualObservation => 0.85,
        SourceReliability::UnverifiedClaim | SourceReliability::NotApplicable => 0.70,
    }
}

/// Bounded update magnitude for one piece of evidence.
///
/// `base_rate * score * max(novelty, 0.1) * dampening * quality`, where
/// quality averages the reasoning and reliability weights (times 0.75 when
/// internally inconsistent) and dampening is a half-strength step while
/// `interaction_count` is below the bootstrap threshold.
///
/// Pure: reads the store's interaction count only.
pub fn magnitude(record: &EvidenceRecord, store: &BeliefStore, config: &EngineConfig) -> f64 {
    let mut quality =
        (reasoning_weight(record.reasoning_type) + reliability_weight(record.source_reliability))
            / 2.0;
    if !record.internal_consistency {
        quality *= INCONSISTENCY_PENALTY;
    }

    let novelty_effective = record.novelty.max(NOVELTY_FLOOR);

    let dampening = if store.interaction_count < config.bootstrap_threshold {
        BOOTSTRAP_DAMPENING
    } else {
        1.0
    };

    config.base_rate * record.score * novelty_effective * dampening * quality
}
