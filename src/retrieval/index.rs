//! Read-only lexical document index
//!
//! Built once at startup and shared across concurrent runs behind an `Arc`.
//! Nothing mutates it after [`DocumentIndex::build`] returns, so reads need no
//! locking.

use crate::capability::{CapabilityError, Excerpt, Retriever};
use crate::retrieval::corpus::Document;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// BM25 term-frequency saturation
const K1: f64 = 1.2;
/// BM25 length normalization
const B: f64 = 0.75;

#[derive(Debug)]
struct IndexedDocument {
    content: String,
    term_counts: HashMap<String, u32>,
    length: usize,
}

/// In-memory BM25 index over whole documents
#[derive(Debug)]
pub struct DocumentIndex {
    documents: Vec<IndexedDocument>,
    document_frequency: HashMap<String, u32>,
    average_length: f64,
}

impl DocumentIndex {
    pub fn build(documents: Vec<Document>) -> Self {
        let mut document_frequency: HashMap<String, u32> = HashMap::new();

        let documents: Vec<IndexedDocument> = documents
            .into_iter()
            .map(|document| {
                let tokens = tokenize(&document.content);
                let mut term_counts: HashMap<String, u32> = HashMap::new();
                for token in &tokens {
                    *term_counts.entry(token.clone()).or_default() += 1;
                }
                for term in term_counts.keys() {
                    *document_frequency.entry(term.clone()).or_default() += 1;
                }
                IndexedDocument {
                    content: document.content,
                    term_counts,
                    length: tokens.len(),
                }
            })
            .collect();

        let total_length: usize = documents.iter().map(|d| d.length).sum();
        let average_length = if documents.is_empty() {
            0.0
        } else {
            total_length as f64 / documents.len() as f64
        };

        debug!(
            documents = documents.len(),
            terms = document_frequency.len(),
            "Document index built"
        );

        Self {
            documents,
            document_frequency,
            average_length,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The `k` best-scoring documents for `query`, best first
    ///
    /// Every document is a candidate, so a non-empty corpus always yields
    /// `min(k, len)` excerpts even when nothing overlaps lexically. Deciding
    /// whether they answer the query is left to generation. Equal scores keep
    /// corpus order.
    pub fn search(&self, query: &str, k: usize) -> Vec<Excerpt> {
        let mut terms = tokenize(query);
        terms.sort();
        terms.dedup();

        let mut scored: Vec<(usize, f64)> = self
            .documents
            .iter()
            .enumerate()
            .map(|(position, document)| (position, self.score(document, &terms)))
            .collect();

        // Stable sort keeps corpus order among ties
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        scored
            .into_iter()
            .take(k)
            .map(|(position, _)| Excerpt::new(self.documents[position].content.clone()))
            .collect()
    }

    fn score(&self, document: &IndexedDocument, terms: &[String]) -> f64 {
        let total = self.documents.len() as f64;
        let length_ratio = if self.average_length > 0.0 {
            document.length as f64 / self.average_length
        } else {
            0.0
        };

        terms
            .iter()
            .filter_map(|term| {
                let tf = f64::from(*document.term_counts.get(term)?);
                let df = f64::from(self.document_frequency.get(term).copied().unwrap_or(0));
                let idf = ((total - df + 0.5) / (df + 0.5) + 1.0).ln();
                Some(idf * tf * (K1 + 1.0) / (tf + K1 * (1.0 - B + B * length_ratio)))
            })
            .sum()
    }
}

#[async_trait]
impl Retriever for DocumentIndex {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Excerpt>, CapabilityError> {
        Ok(self.search(query, k))
    }
}

/// Lowercase alphanumeric runs
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}
