//! Batch enrichment of a word list.
//!
//! The list is split into fixed-size chunks that are sent to one provider
//! strictly in sequence. Each chunk's JSON reply is persisted as
//! `<offset>.json`, which makes interrupted runs resumable, and all chunks
//! are concatenated into a combined file at the end.

pub mod chunk;
pub mod job;
pub mod prompt;
pub mod store;
pub mod types;

pub use chunk::{load_words, plan_chunks, resume_offset};
pub use job::{EnrichmentJob, JobOptions};
pub use prompt::{build_prompt, PromptStyle};
pub use store::ChunkStore;
pub use types::{ChunkOutcome, ChunkReport, EnrichmentRecord, ExamplePair, JobSummary, WordChunk};
