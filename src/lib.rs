//! # sponge
//!
//! A persistent belief-state engine for conversational agents.
//!
//! The engine maintains per-topic opinion scalars with evidence-backed
//! confidence, classifies incoming evidence through an untrusted external
//! classifier (tolerating arbitrarily malformed output), and commits updates
//! either immediately or behind a cooling-off delay. Unreinforced beliefs
//! decay; self-reinforcing ones are flagged; the free-text personality
//! snapshot is guarded against lossy rewrites; and the whole aggregate is
//! persisted atomically with per-version history.
//!
//! The engine is synchronous and single-threaded: one [`BeliefStore`] per
//! agent identity, with the caller serializing interactions. Text
//! generation, prompt assembly, and the classifier's internals are external
//! collaborators.

pub mod beliefs;
pub mod evidence;
pub mod persistence;
pub mod utilities;

pub use beliefs::decay::DecayParams;
pub use beliefs::magnitude::magnitude;
pub use beliefs::snapshot::SnapshotGuard;
pub use beliefs::staged::StagedOpinionUpdate;
pub use beliefs::store::{BehavioralSignature, BeliefMeta, BeliefStore, Shift};
pub use evidence::parser::{ClassifierReply, EvidenceClassifier, EvidenceParser};
pub use evidence::record::{
    DefaultSeverity, EvidenceRecord, OpinionDirection, ReasoningType, SourceReliability,
};
pub use persistence::SpongeStorage;
pub use utilities::config::EngineConfig;
pub use utilities::errors::PersistenceError;
