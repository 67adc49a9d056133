//! Utility modules shared across the engine.

pub mod config;
pub mod errors;

pub use config::EngineConfig;
pub use errors::PersistenceError;
