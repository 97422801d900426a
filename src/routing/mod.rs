//! Routing Infrastructure
//!
//! Decides which handler a query meets first. [`Router`] is the seam; the
//! production implementation is [`LlmRouter`], which classifies with one
//! generation call and defaults to retrieval whenever the answer is not
//! clearly math.

pub mod llm_router;
pub mod router;

pub use llm_router::LlmRouter;
pub use router::{Route, Router};
