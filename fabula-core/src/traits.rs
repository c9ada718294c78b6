use crate::errors::NarrativeResult;

/// Phrase vectorization source.
///
/// Implementations map free-text phrases to fixed-dimension vectors. A
/// phrase the source cannot embed is reported through the vector itself:
/// all-zero or non-finite components mark it invalid (see
/// [`crate::vectors::is_valid`]), matching the upstream contract. Transport
/// or I/O failures return an error instead.
pub trait IVectorSource: Send + Sync {
    /// Vectorize a single phrase.
    fn vector(&self, phrase: &str) -> NarrativeResult<Vec<f32>>;

    /// Vectorize a batch of phrases, preserving input order.
    fn vectors(&self, phrases: &[String]) -> NarrativeResult<Vec<Vec<f32>>>;

    /// The fixed dimensionality of vectors produced by this source.
    fn dimensions(&self) -> usize;

    /// Human-readable source name.
    fn name(&self) -> &str;
}
