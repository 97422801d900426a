//! Run-level error types
//!
//! A run either completes with exactly one answer or fails with a [`RunError`]
//! that identifies the stage where it stopped. Insufficient retrieval context is
//! not an error; it never reaches this module.

use crate::capability::CapabilityError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Maximum length of a sanitized error message, including the truncation suffix
const MAX_SANITIZED_LEN: usize = 500;

static SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(password|token|key|secret)[=:]\s*\S+").expect("secret pattern is valid")
});

static SENSITIVE_PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/[a-zA-Z0-9._/-]+/(secrets?|\.ssh|\.aws|\.config)/[a-zA-Z0-9._/-]+")
        .expect("path pattern is valid")
});

/// Pipeline stage in which a run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Router,
    Math,
    RagRetrieve,
    RagGenerate,
    Search,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Router,
        Stage::Math,
        Stage::RagRetrieve,
        Stage::RagGenerate,
        Stage::Search,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Router => "router",
            Stage::Math => "math",
            Stage::RagRetrieve => "rag-retrieve",
            Stage::RagGenerate => "rag-generate",
            Stage::Search => "search",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for a routing run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error("Query is empty")]
    EmptyQuery,

    #[error("Query classification failed: {source}")]
    ClassificationFailure { source: CapabilityError },

    #[error("Generation failed during {stage}: {source}")]
    GenerationFailure {
        stage: Stage,
        source: CapabilityError,
    },

    #[error("Retrieval failed: {source}")]
    RetrievalFailure { source: CapabilityError },

    #[error("Search failed: {source}")]
    SearchFailure { source: CapabilityError },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RunError {
    pub fn classification(source: CapabilityError) -> Self {
        Self::ClassificationFailure { source }
    }

    pub fn generation(stage: Stage, source: CapabilityError) -> Self {
        Self::GenerationFailure { stage, source }
    }

    pub fn retrieval(source: CapabilityError) -> Self {
        Self::RetrievalFailure { source }
    }

    pub fn search(source: CapabilityError) -> Self {
        Self::SearchFailure { source }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stage that failed, if the failure came from a pipeline stage
    pub fn stage(&self) -> Option<Stage> {
        match self {
            RunError::ClassificationFailure { .. } => Some(Stage::Router),
            RunError::GenerationFailure { stage, .. } => Some(*stage),
            RunError::RetrievalFailure { .. } => Some(Stage::RagRetrieve),
            RunError::SearchFailure { .. } => Some(Stage::Search),
            RunError::EmptyQuery | RunError::Internal { .. } => None,
        }
    }

    /// Message safe to hand to a host transport or terminal
    pub fn sanitized_message(&self) -> String {
        sanitize_error_message(&self.to_string())
    }
}

/// Mask credentials and sensitive paths, then cap the length
fn sanitize_error_message(message: &str) -> String {
    let masked = SECRET_PATTERN.replace_all(message, "${1}=***");
    let mut sanitized = SENSITIVE_PATH_PATTERN
        .replace_all(&masked, "/***REDACTED***/")
        .to_string();

    if sanitized.len() > MAX_SANITIZED_LEN {
        let suffix = "...[truncated]";
        let mut cut = MAX_SANITIZED_LEN - suffix.len();
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str(suffix);
    }

    sanitized
}

/// Result type for routing runs
pub type RunResult<T> = Result<T, RunError>;
