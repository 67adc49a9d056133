//! Evidence record types — the validated, immutable result of classifying
//! one piece of incoming evidence.
//!
//! The record is produced exclusively by [`crate::evidence::parser::EvidenceParser`];
//! everything downstream (magnitude, belief updates) consumes it read-only.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::evidence::coerce::normalize_token;

/// The kind of argument the classifier detected in the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningType {
    LogicalArgument,
    EmpiricalData,
    ExpertOpinion,
    Anecdotal,
    SocialPressure,
    EmotionalAppeal,
    NoArgument,
}

impl ReasoningType {
    /// Canonical tokens, used when restating allowed values to the classifier.
    pub const CANONICAL: [&'static str; 7] = [
        "logical_argument",
        "empirical_data",
        "expert_opinion",
        "anecdotal",
        "social_pressure",
        "emotional_appeal",
        "no_argument",
    ];

    /// Parse a loosely-formatted token ("Logical Argument", "empirical", ...).
    ///
    /// Returns `None` for unrecognized tokens; the caller applies the
    /// per-field default and records the coercion.
    pub fn from_loose(raw: &str) -> Option<Self> {
        match normalize_token(raw).as_str() {
            "logical_argument" | "logical" | "logic" | "argument" => Some(Self::LogicalArgument),
            "empirical_data" | "empirical" | "data" | "evidence" => Some(Self::EmpiricalData),
            "expert_opinion" | "expert" => Some(Self::ExpertOpinion),
            "anecdotal" | "anecdote" | "personal_experience" => Some(Self::Anecdotal),
            "social_pressure" | "social" | "peer_pressure" => Some(Self::SocialPressure),
            "emotional_appeal" | "emotional" | "emotion" | "appeal" => Some(Self::EmotionalAppeal),
            "no_argument" | "none" | "no_arg" => Some(Self::NoArgument),
            _ => None,
        }
    }
}

/// How reliable the classifier judged the message's source to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceReliability {
    PeerReviewed,
    EstablishedExpert,
    InformedOpinion,
    CasualObservation,
    UnverifiedClaim,
    NotApplicable,
}

impl SourceReliability {
    /// Parse a loosely-formatted token ("Peer-Reviewed", "na", ...).
    pub fn from_loose(raw: &str) -> Option<Self> {
        match normalize_token(raw).as_str() {
            "peer_reviewed" | "peer_review" | "reviewed" => Some(Self::PeerReviewed),
            "established_expert" | "expert" => Some(Self::EstablishedExpert),
            "informed_opinion" | "informed" => Some(Self::InformedOpinion),
            "casual_observation" | "casual" | "observation" => Some(Self::CasualObservation),
            "unverified_claim" | "unverified" | "claim" => Some(Self::UnverifiedClaim),
            "not_applicable" | "na" | "n_a" | "none" => Some(Self::NotApplicable),
            _ => None,
        }
    }
}

/// Which way the message pushes on the opinions it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpinionDirection {
    Supports,
    Opposes,
    Neutral,
}

impl OpinionDirection {
    /// Canonical tokens, used when restating allowed values to the classifier.
    pub const CANONICAL: [&'static str; 3] = ["supports", "opposes", "neutral"];

    /// Parse a loosely-formatted token ("Support", "against", ...).
    pub fn from_loose(raw: &str) -> Option<Self> {
        match normalize_token(raw).as_str() {
            "supports" | "support" | "for" | "agree" | "agrees" | "positive" => {
                Some(Self::Supports)
            }
            "opposes" | "oppose" | "against" | "disagree" | "disagrees" | "negative" => {
                Some(Self::Opposes)
            }
            "neutral" | "none" | "mixed" => Some(Self::Neutral),
            _ => None,
        }
    }

    /// Signed direction factor: +1 / -1 / 0.
    pub fn sign(&self) -> f64 {
        match self {
            Self::Supports => 1.0,
            Self::Opposes => -1.0,
            Self::Neutral => 0.0,
        }
    }
}

/// How much trust was lost while coercing the classifier output.
///
/// The ordering matters: when several issues occur the highest severity wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultSeverity {
    /// Every field parsed cleanly.
    None,
    /// At least one field was present but had to be coerced to its default.
    Coercion,
    /// A required field was still absent after the retry.
    Missing,
    /// The classifier call itself failed; the whole record is a fallback.
    Exception,
}

/// Validated, immutable result of classifying one piece of incoming evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRecord {
    /// Argument strength, clamped into [0, 1].
    pub score: f64,
    /// The kind of argument detected.
    pub reasoning_type: ReasoningType,
    /// Source reliability judgement.
    pub source_reliability: SourceReliability,
    /// Whether the message is internally consistent.
    pub internal_consistency: bool,
    /// How novel the evidence is relative to what the agent already holds,
    /// clamped into [0, 1].
    pub novelty: f64,
    /// Topics the evidence touches; may be empty.
    pub topics: Vec<String>,
    /// One-line summary of the evidence.
    pub summary: String,
    /// Which way the evidence pushes.
    pub opinion_direction: OpinionDirection,

    // Provenance metadata.
    /// True when any field had to be defaulted.
    pub used_defaults: bool,
    /// Sorted, deduplicated field tags, prefixed by kind
    /// (`coerced:score`, `missing:reasoning_type`).
    pub defaulted_fields: BTreeSet<String>,
    /// Highest-severity issue encountered while building this record.
    pub default_severity: DefaultSeverity,
    /// Number of classifier calls made (>= 1).
    pub attempt_count: u32,
    /// Prompt tokens spent across all attempts.
    pub prompt_tokens: u32,
    /// Completion tokens spent across all attempts.
    pub completion_tokens: u32,
}

impl EvidenceRecord {
    /// Fixed all-default fallback used when the classifier call itself fails.
    ///
    /// The summary keeps a truncated copy of the original message so the
    /// audit trail still says what was being classified.
    pub fn fallback(original_message: &str, attempt_count: u32) -> Self {
        let summary: String = original_message.chars().take(200).collect();
        let mut defaulted_fields = BTreeSet::new();
        defaulted_fields.insert("exception:classifier".to_string());
        Self {
            score: 0.0,
            reasoning_type: ReasoningType::NoArgument,
            source_reliability: SourceReliability::NotApplicable,
            internal_consistency: true,
            novelty: 0.0,
            topics: Vec::new(),
            summary,
            opinion_direction: OpinionDirection::Neutral,
            used_defaults: true,
            defaulted_fields,
            default_severity: DefaultSeverity::Exception,
            attempt_count: attempt_count.max(1),
            prompt_tokens: 0,
            completion_tokens: 0,
        }
    }
}
