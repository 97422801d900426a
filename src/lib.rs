//! Query Router
//!
//! Answers a free-text query by routing it to one of three handlers: a math
//! solver, a retrieval-augmented answerer over a local corpus, or web search.
//! Web search is never chosen directly; it runs only when retrieval reports that
//! its context cannot answer the question.
//!
//! # Overview
//!
//! - [`orchestrator::Orchestrator`] drives the routing state machine and is the
//!   one entry point a host calls per query.
//! - [`routing`] classifies a query as math or retrieval.
//! - [`handlers`] holds the math, retrieval and search handlers.
//! - [`capability`] defines the generation, retrieval and search seams that
//!   everything external sits behind.
//! - [`llm`], [`retrieval`], [`search`] and [`tools`] provide the concrete
//!   capabilities the binary wires up.
//!
//! # Quick Start
//!
//! ```rust
//! use query_router::handlers::HandlerKind;
//! use query_router::orchestrator::Orchestrator;
//! use query_router::testing::mocks::{MockGenerator, MockRetriever, MockSearcher};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let generator = MockGenerator::default()
//!     .when("router agent", "math_agent")
//!     .when("Solve this math problem", "5");
//!
//! let orchestrator = Orchestrator::from_capabilities(
//!     Arc::new(generator),
//!     Arc::new(MockRetriever::empty()),
//!     Arc::new(MockSearcher::new("unused")),
//! );
//!
//! let outcome = orchestrator.run("divide ten by two").await.unwrap();
//! assert_eq!(outcome.answer, "5");
//! assert_eq!(outcome.handler_used, HandlerKind::Math);
//! # });
//! ```

pub mod capability;
pub mod config;
pub mod error;
pub mod handlers;
pub mod llm;
pub mod observability;
pub mod orchestrator;
pub mod retrieval;
pub mod routing;
pub mod search;
pub mod testing;
pub mod tools;

pub use capability::{CapabilityError, Excerpt, Generator, Retriever, Searcher};
pub use config::*;
pub use error::{RunError, RunResult, Stage};
pub use handlers::HandlerKind;
pub use orchestrator::{Orchestrator, RunOutcome};
pub use routing::Route;
pub use tools::{Tool, ToolDescription, ToolError, ToolSet};
