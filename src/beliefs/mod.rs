//! Belief state: the store, its update rules, and the snapshot guard.
//!
//! The [`BeliefStore`] aggregate lives in [`store`]; staged updates, decay,
//! and entrenchment detection extend it from their own modules. The
//! [`magnitude`] module turns an evidence record into an update size.

pub mod decay;
pub mod entrenchment;
pub mod magnitude;
pub mod snapshot;
pub mod staged;
pub mod store;

pub use decay::DecayParams;
pub use magnitude::magnitude;
pub use snapshot::SnapshotGuard;
pub use staged::StagedOpinionUpdate;
pub use store::{BehavioralSignature, BeliefMeta, BeliefStore, Shift};
