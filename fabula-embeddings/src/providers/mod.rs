//! Concrete vector sources.

pub mod hashed_tfidf;
pub mod sif_lexicon;

pub use hashed_tfidf::HashedTfIdf;
pub use sif_lexicon::SifLexicon;
