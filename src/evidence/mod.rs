//! Evidence classification intake.
//!
//! This module owns the contract for consuming the external evidence
//! classifier safely: the well-typed [`EvidenceRecord`], the lossy coercion
//! helpers, and the retrying parser that is the record's sole producer.

pub mod coerce;
pub mod parser;
pub mod record;

pub use parser::{ClassifierReply, EvidenceClassifier, EvidenceParser};
pub use record::{
    DefaultSeverity, EvidenceRecord, OpinionDirection, ReasoningType, SourceReliability,
};
