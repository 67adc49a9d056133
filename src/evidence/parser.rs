//! Evidence extraction from an untrusted external classifier.
//!
//! The classifier is an opaque collaborator that returns a loosely-typed
//! JSON object; any key may be absent, wrongly typed, or hold an
//! unrecognized token. The parser is the sole consumer responsible for
//! tolerating that: it coerces what it can, retries once when a required
//! field is unusable, and falls back to a fixed neutral record when the
//! call itself fails. It never returns an error.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::evidence::coerce::{clamp_unit, to_bool, to_float, to_topics};
use crate::evidence::record::{
    DefaultSeverity, EvidenceRecord, OpinionDirection, ReasoningType, SourceReliability,
};

/// Fields that must parse for an attempt to be considered usable.
const REQUIRED_FIELDS: [&str; 3] = ["score", "reasoning_type", "opinion_direction"];

/// Note sent alongside the retry, restating the exact allowed values.
static CLARIFYING_NOTE: Lazy<String> = Lazy::new(|| {
    format!(
        "Respond with a single JSON object. Required fields: \
         \"score\" (number in [0,1]), \"reasoning_type\" (one of: {}), \
         \"opinion_direction\" (one of: {}).",
        ReasoningType::CANONICAL.join(", "),
        OpinionDirection::CANONICAL.join(", "),
    )
});

/// One classifier response: the loosely-typed record plus token usage.
#[derive(Debug, Clone)]
pub struct ClassifierReply {
    /// The raw structured output; expected to be a JSON object but not
    /// trusted to be one.
    pub record: Value,
    /// Prompt tokens consumed by this call.
    pub prompt_tokens: u32,
    /// Completion tokens consumed by this call.
    pub completion_tokens: u32,
}

impl ClassifierReply {
    /// Build a reply with zero token usage.
    pub fn new(record: Value) -> Self {
        Self {
            record,
            prompt_tokens: 0,
            completion_tokens: 0,
        }
    }
}

/// External evidence classifier collaborator.
///
/// Implementations typically wrap a model call; the engine only requires
/// that a call either yields a [`ClassifierReply`] or an error. The
/// optional `clarifying_note` is populated on retries and restates the
/// allowed values for the required fields.
pub trait EvidenceClassifier {
    fn classify(
        &mut self,
        user_message: &str,
        current_snapshot: &str,
        clarifying_note: Option<&str>,
    ) -> Result<ClassifierReply, anyhow::Error>;
}

/// Converts loosely-typed classifier output into a well-typed
/// [`EvidenceRecord`], applying defaults, coercions, and a bounded retry.
#[derive(Debug, Clone)]
pub struct EvidenceParser {
    /// Maximum classifier calls per message (default 2: one call, one retry).
    max_attempts: u32,
}

impl Default for EvidenceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl EvidenceParser {
    /// Create a parser with the default retry budget (2 attempts).
    pub fn new() -> Self {
        Self { max_attempts: 2 }
    }

    /// Classify one message and coerce the output into an `EvidenceRecord`.
    ///
    /// Infallible by contract: classifier failures produce the fixed
    /// exception-severity fallback record, never an error.
    pub fn extract(
        &self,
        classifier: &mut dyn EvidenceClassifier,
        user_message: &str,
        current_snapshot: &str,
    ) -> EvidenceRecord {
        let mut prompt_tokens = 0u32;
        let mut completion_tokens = 0u32;
        let mut last_record = Value::Null;
        let mut attempts = 0u32;

        for attempt in 1..=self.max_attempts {
            attempts = attempt;
            let note = if attempt > 1 {
                Some(CLARIFYING_NOTE.as_str())
            } else {
                None
            };
            match classifier.classify(user_message, current_snapshot, note) {
                Ok(reply) => {
                    prompt_tokens += reply.prompt_tokens;
                    completion_tokens += reply.completion_tokens;
                    let usable = required_fields_usable(&reply.record);
                    last_record = reply.record;
                    if usable {
                        break;
                    }
                    if attempt < self.max_attempts {
                        log::debug!(
                            "classifier attempt {} returned unusable required fields ({:?}), retrying",
                            attempt,
                            REQUIRED_FIELDS
                        );
                    }
                }
                Err(err) => {
                    log::warn!("evidence classifier call failed (attempt {}): {:#}", attempt, err);
                    let mut record = EvidenceRecord::fallback(user_message, attempt);
                    record.prompt_tokens = prompt_tokens;
                    record.completion_tokens = completion_tokens;
                    return record;
                }
            }
        }

        self.build_record(&last_record, attempts, prompt_tokens, completion_tokens)
    }

    /// Coerce the final attempt's output into a well-typed record.
    fn build_record(
        &self,
        value: &Value,
        attempt_count: u32,
        prompt_tokens: u32,
        completion_tokens: u32,
    ) -> EvidenceRecord {
        let empty = serde_json::Map::new();
        // A non-object reply means every required field is absent.
        let map = value.as_object().unwrap_or(&empty);

        let mut tags: BTreeSet<String> = BTreeSet::new();
        let mut severity = DefaultSeverity::None;
        let bump = |severity: &mut DefaultSeverity, level: DefaultSeverity| {
            if level > *severity {
                *severity = level;
            }
        };

        // Required: score.
        let score = match map.get("score") {
            None => {
                tags.insert("missing:score".to_string());
                bump(&mut severity, DefaultSeverity::Missing);
                0.0
            }
            Some(v) => match to_float(v) {
                Some(f) => clamp_unit(f),
                None => {
                    tags.insert("coerced:score".to_string());
                    bump(&mut severity, DefaultSeverity::Coercion);
                    0.0
                }
            },
        };

        // Required: reasoning_type.
        let reasoning_type = match map.get("reasoning_type") {
            None => {
                tags.insert("missing:reasoning_type".to_string());
                bump(&mut severity, DefaultSeverity::Missing);
                ReasoningType::NoArgument
            }
            Some(v) => match v.as_str().and_then(ReasoningType::from_loose) {
                Some(rt) => rt,
                None => {
                    tags.insert("coerced:reasoning_type".to_string());
                    bump(&mut severity, DefaultSeverity::Coercion);
                    ReasoningType::NoArgument
                }
            },
        };

        // Required: opinion_direction.
        let opinion_direction = match map.get("opinion_direction") {
            None => {
                tags.insert("missing:opinion_direction".to_string());
                bump(&mut severity, DefaultSeverity::Missing);
                OpinionDirection::Neutral
            }
            Some(v) => match v.as_str().and_then(OpinionDirection::from_loose) {
                Some(d) => d,
                None => {
                    tags.insert("coerced:opinion_direction".to_string());
                    bump(&mut severity, DefaultSeverity::Coercion);
                    OpinionDirection::Neutral
                }
            },
        };

        // Optional fields default silently when absent and never trigger a
        // retry; a present-but-unusable value is still tracked as coerced.
        let source_reliability = match map.get("source_reliability") {
            None => SourceReliability::NotApplicable,
            Some(v) => match v.as_str().and_then(SourceReliability::from_loose) {
                Some(sr) => sr,
                None => {
                    tags.insert("coerced:source_reliability".to_string());
                    bump(&mut severity, DefaultSeverity::Coercion);
                    SourceReliability::NotApplicable
                }
            },
        };

        let internal_consistency = match map.get("internal_consistency") {
            None => true,
            Some(v) => match to_bool(v) {
                Some(b) => b,
                None => {
                    tags.insert("coerced:internal_consistency".to_string());
                    bump(&mut severity, DefaultSeverity::Coercion);
                    true
                }
            },
        };

        let novelty = match map.get("novelty") {
            None => 0.5,
            Some(v) => match to_float(v) {
                Some(f) => clamp_unit(f),
                None => {
                    tags.insert("coerced:novelty".to_string());
                    bump(&mut severity, DefaultSeverity::Coercion);
                    0.0
                }
            },
        };

        let topics = match map.get("topics") {
            None => Vec::new(),
            Some(v) => match to_topics(v) {
                Some(topics) => topics,
                None => {
                    tags.insert("coerced:topics".to_string());
                    bump(&mut severity, DefaultSeverity::Coercion);
                    Vec::new()
                }
            },
        };

        let summary = match map.get("summary") {
            None => String::new(),
            Some(Value::String(s)) => s.trim().to_string(),
            Some(_) => {
                tags.insert("coerced:summary".to_string());
                bump(&mut severity, DefaultSeverity::Coercion);
                String::new()
            }
        };

        if !tags.is_empty() {
            log::debug!(
                "evidence record built with defaults ({:?}): {:?}",
                severity,
                tags
            );
        }

        EvidenceRecord {
            score,
            reasoning_type,
            source_reliability,
            internal_consistency,
            novelty,
            topics,
            summary,
            opinion_direction,
            used_defaults: !tags.is_empty(),
            defaulted_fields: tags,
            default_severity: severity,
            attempt_count: attempt_count.max(1),
            prompt_tokens,
            completion_tokens,
        }
    }
}

/// True when every required field is present and parses into its target
/// type; anything less triggers the single retry.
fn required_fields_usable(value: &Value) -> bool {
    let Some(map) = value.as_object() else {
        return false;
    };
    let score_ok = map.get("score").and_then(to_float).is_some();
    let reasoning_ok = map
        .get("reasoning_type")
        .and_then(Value::as_str)
        .and_then(ReasoningType::from_loose)
        .is_some();
    let direction_ok = map
        .get("opinion_direction")
        .and_then(Value::as_str)
        .and_then(OpinionDirection::from_loose)
        .is_some();
    score_ok && reasoning_ok && direction_ok
}
