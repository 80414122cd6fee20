//! Records produced by the enrichment job.

use serde::{Deserialize, Deserializer, Serialize};

/// A contiguous slice of the word list, identified by its starting offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordChunk {
    pub offset: usize,
    pub words: Vec<String>,
}

impl WordChunk {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// One example sentence and its translation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamplePair {
    pub sentence: Option<String>,
    pub translation: Option<String>,
}

/// Enrichment for a single word as returned by the provider.
///
/// Nothing is validated: every field may be absent or `null` (a `null` list
/// reads as empty), and fields the provider adds beyond these are kept in
/// `extra` so they survive into the combined file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,

    #[serde(deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub antonyms: Vec<String>,

    #[serde(deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<ExamplePair>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// What happened to one chunk during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// Records were extracted and persisted
    Written { records: usize },
    /// The reply held no usable JSON array; an empty chunk file was persisted
    Empty,
    /// The provider call failed or timed out; no file was written
    Failed { error: String },
}

/// Progress report passed to the `on_chunk` callback.
#[derive(Debug, Clone)]
pub struct ChunkReport {
    pub offset: usize,
    pub words: usize,
    pub outcome: ChunkOutcome,
}

/// Totals for one job run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSummary {
    /// Offset the run started from
    pub resume_offset: usize,
    /// Chunks planned for this run
    pub planned: usize,
    pub written: usize,
    pub empty: usize,
    pub failed: usize,
    /// Records in the combined file
    pub combined_records: usize,
}
