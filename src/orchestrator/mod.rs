//! Query orchestration
//!
//! [`Orchestrator::run`] is the single entry point a host calls per query.

pub mod context;
pub mod machine;

pub use context::RunOutcome;
pub use machine::Orchestrator;
