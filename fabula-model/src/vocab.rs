//! Filler vocabulary extraction.
//!
//! BTreeMap keys give the stable enumeration order the labeler's
//! deterministic tie-break relies on.

use std::collections::BTreeMap;

use fabula_core::{Role, Statement};

/// Distinct fillers for one role with their corpus-wide occurrence counts.
pub fn role_vocabulary(corpus: &[Statement], role: Role) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for statement in corpus {
        if let Some(filler) = statement.get(role) {
            *counts.entry(filler.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// All (statement index, filler) pairs for one role, in corpus order.
pub fn fillers_for_role(corpus: &[Statement], role: Role) -> (Vec<usize>, Vec<String>) {
    let mut indices = Vec::new();
    let mut phrases = Vec::new();
    for (i, statement) in corpus.iter().enumerate() {
        if let Some(filler) = statement.get(role) {
            indices.push(i);
            phrases.push(filler.to_string());
        }
    }
    (indices, phrases)
}

/// Merge `from` into `into`, summing counts.
pub fn merge_counts(into: &mut BTreeMap<String, u64>, from: &BTreeMap<String, u64>) {
    for (phrase, count) in from {
        *into.entry(phrase.clone()).or_insert(0) += count;
    }
}
