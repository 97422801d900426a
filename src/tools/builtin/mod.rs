//! Builtin tools

pub mod web_search;

pub use web_search::{WebSearchConfig, WebSearchTool};
