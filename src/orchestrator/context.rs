//! Per-run state

use crate::error::RunError;
use crate::handlers::HandlerKind;
use serde::{Deserialize, Serialize};

/// Final result of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub answer: String,
    pub handler_used: HandlerKind,
}

/// Mutable state owned by exactly one run
///
/// Created when the run starts and dropped when it ends or is cancelled. It is
/// never shared between runs.
#[derive(Debug)]
pub(crate) struct QueryContext {
    query: String,
    answer: Option<String>,
    handler_used: Option<HandlerKind>,
}

impl QueryContext {
    pub(crate) fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            answer: None,
            handler_used: None,
        }
    }

    pub(crate) fn query(&self) -> &str {
        &self.query
    }

    /// Record the final answer; a later handler overwrites an earlier label
    pub(crate) fn finish(&mut self, handler: HandlerKind, answer: String) {
        self.answer = Some(answer);
        self.handler_used = Some(handler);
    }

    pub(crate) fn into_outcome(self) -> Result<RunOutcome, RunError> {
        match (self.answer, self.handler_used) {
            (Some(answer), Some(handler_used)) => Ok(RunOutcome {
                answer,
                handler_used,
            }),
            _ => Err(RunError::internal("run ended without an answer")),
        }
    }
}
