//! Entry routing: Router trait and the closed set of initial routes
//!
//! A query is routed exactly once, before any handler runs. Only math and
//! retrieval are reachable from here; web search is a fallback that the
//! orchestrator reaches through retrieval, never a routing target.
//!
//! # Example
//!
//! ```rust
//! use query_router::routing::Route;
//!
//! assert_eq!(Route::from_classification("math_agent"), Route::Math);
//! assert_eq!(Route::from_classification("rag_agent"), Route::Rag);
//! // Anything unexpected falls through to retrieval
//! assert_eq!(Route::from_classification("search_agent"), Route::Rag);
//! ```

use crate::error::RunError;
use crate::handlers::HandlerKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// First handler chosen for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Math,
    Rag,
}

impl Route {
    /// Decide the route from raw classifier text
    ///
    /// Any output mentioning "math" (case-insensitive) routes to math. Everything
    /// else, including empty or malformed output, routes to retrieval.
    pub fn from_classification(output: &str) -> Self {
        if output.to_lowercase().contains("math") {
            Route::Math
        } else {
            Route::Rag
        }
    }

    /// Handler that runs first on this route
    pub fn handler(self) -> HandlerKind {
        match self {
            Route::Math => HandlerKind::Math,
            Route::Rag => HandlerKind::Rag,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.handler(), f)
    }
}

/// Classifies a query into its initial [`Route`]
///
/// Implementations must not retry, and must surface a classifier failure as
/// [`RunError::ClassificationFailure`] instead of picking a default route.
#[async_trait::async_trait]
pub trait Router: Send + Sync {
    async fn classify(&self, query: &str) -> Result<Route, RunError>;
}
