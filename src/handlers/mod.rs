//! Query handlers
//!
//! Each handler wraps exactly one kind of work and talks to the outside world
//! only through the capability traits in [`crate::capability`]. Handlers hold no
//! per-run state, so one instance serves any number of concurrent runs.

pub mod math;
pub mod rag;
pub mod search;

pub use math::MathHandler;
pub use rag::{RagHandler, RagOutcome, DEFAULT_TOP_K, INSUFFICIENT_CONTEXT_SENTINEL};
pub use search::SearchHandler;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handler that produced a run's final answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    Math,
    Rag,
    Search,
}

impl HandlerKind {
    pub const ALL: [HandlerKind; 3] = [HandlerKind::Math, HandlerKind::Rag, HandlerKind::Search];

    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerKind::Math => "math",
            HandlerKind::Rag => "rag",
            HandlerKind::Search => "search",
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
