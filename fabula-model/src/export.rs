//! Plain-text cluster export for human inspection.
//!
//! The dump is never re-parsed by the model; format stability matters only
//! to human readers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use fabula_core::errors::ModelError;
use fabula_core::NarrativeResult;

use crate::model::NarrativeModel;

impl NarrativeModel {
    /// Write one block per cluster id: the top `top_n` member phrases,
    /// optionally annotated with their corpus frequencies.
    pub fn write_cluster_report<W: Write>(
        &self,
        out: &mut W,
        top_n: usize,
        with_frequencies: bool,
    ) -> NarrativeResult<()> {
        let vocabulary = self.vocabulary().ok_or(ModelError::NotFitted)?;

        for cluster in vocabulary.cluster_ids() {
            writeln!(out, "Cluster {cluster}")?;
            let mut line = String::new();
            for (phrase, count) in vocabulary.top_phrases(cluster, top_n) {
                if with_frequencies {
                    line.push_str(&format!("{phrase} ({count}), "));
                } else {
                    line.push_str(&format!("{phrase}, "));
                }
            }
            writeln!(out, "{line}")?;
            writeln!(out)?;
        }
        Ok(())
    }

    /// Write the cluster report to a file.
    pub fn export_clusters(
        &self,
        path: impl AsRef<Path>,
        top_n: usize,
        with_frequencies: bool,
    ) -> NarrativeResult<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_cluster_report(&mut out, top_n, with_frequencies)?;
        out.flush()?;
        Ok(())
    }

    /// Look a cluster up by its label and return its top `top_n`
    /// (phrase, frequency) pairs.
    pub fn inspect_cluster(&self, label: &str, top_n: usize) -> Option<Vec<(String, u64)>> {
        let vocabulary = self.vocabulary()?;
        let cluster = vocabulary.find_by_label(label)?;
        Some(vocabulary.top_phrases(cluster, top_n))
    }
}
