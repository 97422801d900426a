//! Web search fallback
//!
//! Reached only after retrieval came up short. Whatever the search capability
//! returns is the final answer, passed through untouched.

use crate::capability::Searcher;
use crate::error::RunError;
use std::sync::Arc;

pub struct SearchHandler {
    searcher: Arc<dyn Searcher>,
}

impl SearchHandler {
    pub fn new(searcher: Arc<dyn Searcher>) -> Self {
        Self { searcher }
    }

    pub async fn search(&self, query: &str) -> Result<String, RunError> {
        self.searcher.search(query).await.map_err(RunError::search)
    }
}
