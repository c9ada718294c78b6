//! # fabula-embeddings
//!
//! Vector sources for the narrative model: a SIF-weighted word-lexicon
//! averager, a dependency-free hashed TF-IDF fallback, and `VectorEngine`
//! wrapping any source with an L1 cache, normalization, and parallel
//! batching.

pub mod cache;
pub mod engine;
pub mod providers;

pub use engine::VectorEngine;
pub use providers::{HashedTfIdf, SifLexicon};
