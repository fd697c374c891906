//! This crate is an academic paper search and exploration engine built on a TF-IDF Vectorizer.
pub mod cluster;
pub mod config;
pub mod index;
pub mod paper;
pub mod search;
pub mod server;
pub mod store;
pub mod utils;
pub mod vectorizer;

/// TF-IDF Vectorizer
/// The fitted model at the centre of this crate.
/// It turns text into sparse, L2-normalized TF-IDF vectors over a fixed
/// vocabulary learned from the paper corpus.
///
/// Internally, it holds:
/// - The vocabulary, alphabetically ordered (index = column)
/// - A smoothed IDF weight per column
/// - The analyzer settings (n-gram range, stop words)
///
/// `TFIDFVectorizer<N, E>` has the following generic parameters:
/// - `N`: Vector element type (f32 or f64)
/// - `E`: TF-IDF calculation engine type (e.g., DefaultTFIDFEngine)
///
/// The model is immutable after `fit_transform`; share it with `Arc`.
///
/// # Serialization
/// Supported. The engine marker is not written.
/// Use `TFIDFData` to deserialize.
pub use vectorizer::TFIDFVectorizer;

/// TF-IDF Vectorizer Data Structure for Deserialization
/// Plain data without type markers.
/// Convert it into `TFIDFVectorizer` with `into_tf_idf_vectorizer`, which
/// checks that vocabulary and IDF line up.
pub use vectorizer::serde::TFIDFData;

/// Corpus-wide term statistics
/// Document count, document frequency and total count per term.
/// It is the base data for IDF and for the `max_features` cut.
pub use vectorizer::stats::CorpusStats;

/// Token Frequency structure
/// Occurrence counts of each term within one document.
pub use vectorizer::token::TokenFrequency;

/// TF-IDF Engine Trait
/// Defines how IDF weights and per-document TF-IDF vectors are computed.
pub use vectorizer::tfidf::{DefaultTFIDFEngine, TFIDFEngine};

/// Document-term matrix
/// One sparse row per paper, row `i` ⇔ metadata row `i`.
pub use vectorizer::matrix::EmbeddingMatrix;

/// Sparse vector with implicit zeros, used for every TF-IDF row.
pub use utils::math::vector::ZeroSpVec;

/// Papers and their loader
pub use paper::{Corpus, CorpusLoader, PaperMeta, PaperRecord};

/// Query-time search
pub use search::{ScoredPaper, SearchEngine, SearchError};

/// Topic clustering
pub use cluster::{ClusterOutput, ClusterSummary, ClusteredPaper};

/// On-disk artifacts
pub use store::{ArtifactError, ArtifactStore};
