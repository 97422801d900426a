//! Retrieval capability: corpus loading and a read-only lexical index

pub mod corpus;
pub mod index;

pub use corpus::{load_corpus, CorpusError, Document};
pub use index::DocumentIndex;
