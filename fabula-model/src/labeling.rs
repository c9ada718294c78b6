//! Cluster labeling by most frequent member phrase.

use std::collections::BTreeMap;

use tracing::warn;

use crate::cluster::NOISE_ID;

/// Per-cluster phrase frequencies and the chosen labels.
///
/// Frequencies are corpus-wide occurrence counts, not one per training
/// point. The noise cluster always carries the empty label.
#[derive(Debug, Clone, Default)]
pub struct ClusterVocabulary {
    vocab: BTreeMap<i64, BTreeMap<String, u64>>,
    labels: BTreeMap<i64, String>,
}

impl ClusterVocabulary {
    /// Build from training assignments (aligned with `phrases`) and the
    /// corpus-wide phrase counts.
    pub fn build(
        assignments: &[i64],
        phrases: &[String],
        corpus_counts: &BTreeMap<String, u64>,
        has_noise: bool,
    ) -> Self {
        debug_assert_eq!(assignments.len(), phrases.len());

        let mut vocab: BTreeMap<i64, BTreeMap<String, u64>> = BTreeMap::new();
        for (&cluster, phrase) in assignments.iter().zip(phrases) {
            let count = corpus_counts.get(phrase).copied().unwrap_or(1);
            vocab
                .entry(cluster)
                .or_default()
                .insert(phrase.clone(), count);
        }

        let mut labels = BTreeMap::new();
        for (&cluster, counter) in &vocab {
            if cluster == NOISE_ID {
                continue;
            }
            // First phrase reaching the maximum in BTreeMap order wins.
            let mut best: Option<(&str, u64)> = None;
            let mut tied_with: Option<&str> = None;
            for (phrase, &count) in counter {
                match best {
                    None => best = Some((phrase, count)),
                    Some((_, best_count)) if count > best_count => {
                        best = Some((phrase, count));
                        tied_with = None;
                    }
                    Some((_, best_count)) if count == best_count && tied_with.is_none() => {
                        tied_with = Some(phrase);
                    }
                    _ => {}
                }
            }
            if let Some((label, count)) = best {
                if let Some(other) = tied_with {
                    warn!(
                        cluster,
                        label,
                        runner_up = other,
                        frequency = count,
                        "multiple phrases tied for the cluster label; first one picked"
                    );
                }
                labels.insert(cluster, label.to_string());
            }
        }

        if has_noise {
            labels.insert(NOISE_ID, String::new());
            vocab.entry(NOISE_ID).or_default();
        }

        Self { vocab, labels }
    }

    /// The label for a cluster id. Empty string = noise.
    pub fn label(&self, cluster: i64) -> Option<&str> {
        self.labels.get(&cluster).map(String::as_str)
    }

    /// Look up a cluster id by its label.
    pub fn find_by_label(&self, label: &str) -> Option<i64> {
        self.labels
            .iter()
            .find(|(_, l)| l.as_str() == label)
            .map(|(&c, _)| c)
    }

    /// Top `n` phrases of a cluster by frequency, descending; phrase order
    /// breaks ties.
    pub fn top_phrases(&self, cluster: i64, n: usize) -> Vec<(String, u64)> {
        let Some(counter) = self.vocab.get(&cluster) else {
            return Vec::new();
        };
        let mut entries: Vec<(String, u64)> = counter
            .iter()
            .map(|(p, &c)| (p.clone(), c))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(n);
        entries
    }

    /// Cluster ids in ascending order (noise first when present).
    pub fn cluster_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.vocab.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
