//! Testing utilities and mock implementations
//!
//! Mocks for every capability the routing core consumes, so orchestration can
//! be tested without a model, a corpus, or network access.

pub mod mocks;

pub use mocks::*;
