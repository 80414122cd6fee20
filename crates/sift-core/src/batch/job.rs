//! Sequential chunked enrichment with resume.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;

use super::chunk::{missing_offsets, plan_chunks, resume_offset};
use super::prompt::{build_prompt, PromptStyle};
use super::store::ChunkStore;
use super::types::{ChunkOutcome, ChunkReport, EnrichmentRecord, JobSummary, WordChunk};
use crate::config::Config;
use crate::error::{BatchError, JsonShape, ProviderError};
use crate::extract::extract_json;
use crate::llm::{LlmProvider, LlmRequest};
use crate::output::OutputFormat;

/// Per-run settings for the enrichment job.
#[derive(Debug, Clone)]
pub struct JobOptions {
    pub chunk_size: usize,
    /// Random pause range between chunks; `(0, 0)` disables pausing
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,
    /// Per-chunk provider timeout in milliseconds
    pub timeout_ms: u64,
    pub prompt: PromptStyle,
    pub combined_path: PathBuf,
    pub format: OutputFormat,
}

impl JobOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunk_size: config.batch.chunk_size,
            delay_min_ms: config.batch.delay_min_ms,
            delay_max_ms: config.batch.delay_max_ms,
            timeout_ms: config.limits.llm_timeout_ms,
            prompt: config.batch.prompt.clone().into(),
            combined_path: config.combined_path(),
            format: OutputFormat::Json,
        }
    }

    fn pause(&self) -> Duration {
        let (min, max) = (self.delay_min_ms, self.delay_max_ms.max(self.delay_min_ms));
        let ms = if max == min {
            min
        } else {
            rand::thread_rng().gen_range(min..=max)
        };
        Duration::from_millis(ms)
    }
}

/// Drives one provider over a word list, one chunk at a time.
pub struct EnrichmentJob {
    provider: Arc<dyn LlmProvider>,
    store: ChunkStore,
    options: JobOptions,
}

impl EnrichmentJob {
    pub fn new(provider: Arc<dyn LlmProvider>, store: ChunkStore, options: JobOptions) -> Self {
        Self {
            provider,
            store,
            options,
        }
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// Chunks that a run over `words` would request, given what is on disk.
    pub fn pending(&self, words: &[String]) -> Result<(usize, Vec<WordChunk>), BatchError> {
        let existing = self.store.existing_offsets()?;
        let start = resume_offset(&existing, self.options.chunk_size);

        let gaps = missing_offsets(&existing, self.options.chunk_size, start.min(words.len()));
        if !gaps.is_empty() {
            tracing::warn!(
                missing = ?gaps,
                "Chunks below the resume point have no output and will not be retried"
            );
        }

        Ok((start, plan_chunks(words, self.options.chunk_size, start)))
    }

    /// Enrich every pending chunk, then rebuild the combined file.
    ///
    /// Provider failures skip the chunk; file-system failures abort the run.
    /// `on_chunk` is called once per chunk after its outcome is known.
    pub async fn run<F>(&self, words: &[String], mut on_chunk: F) -> Result<JobSummary, BatchError>
    where
        F: FnMut(&ChunkReport),
    {
        let (start, chunks) = self.pending(words)?;
        let mut summary = JobSummary {
            resume_offset: start,
            planned: chunks.len(),
            ..Default::default()
        };

        if start > 0 {
            tracing::info!(resume_offset = start, remaining = chunks.len(), "Resuming job");
        }

        let last = chunks.len().saturating_sub(1);
        for (i, chunk) in chunks.iter().enumerate() {
            let outcome = self.process_chunk(chunk).await?;
            match &outcome {
                ChunkOutcome::Written { .. } => summary.written += 1,
                ChunkOutcome::Empty => summary.empty += 1,
                ChunkOutcome::Failed { .. } => summary.failed += 1,
            }
            on_chunk(&ChunkReport {
                offset: chunk.offset,
                words: chunk.len(),
                outcome,
            });

            if i < last {
                let pause = self.options.pause();
                if !pause.is_zero() {
                    tracing::debug!(pause_ms = pause.as_millis() as u64, "Sleeping before next chunk");
                    tokio::time::sleep(pause).await;
                }
            }
        }

        summary.combined_records = self
            .store
            .combine(&self.options.combined_path, self.options.format)?;
        Ok(summary)
    }

    async fn process_chunk(&self, chunk: &WordChunk) -> Result<ChunkOutcome, BatchError> {
        let request = LlmRequest::text(build_prompt(&chunk.words, &self.options.prompt));
        let start = Instant::now();

        let reply = match tokio::time::timeout(
            Duration::from_millis(self.options.timeout_ms),
            self.provider.stream(&request),
        )
        .await
        {
            Ok(Ok(response)) => response.text,
            Ok(Err(e)) => return Ok(self.failed(chunk, e)),
            Err(_) => {
                let e = ProviderError::Timeout {
                    provider: self.provider.name().to_string(),
                    timeout_ms: self.options.timeout_ms,
                };
                return Ok(self.failed(chunk, e));
            }
        };

        let records: Vec<EnrichmentRecord> = match extract_json(&reply, JsonShape::Array) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(offset = chunk.offset, "No records in reply: {e}");
                Vec::new()
            }
        };

        self.store.write_chunk(chunk.offset, &records)?;

        tracing::info!(
            offset = chunk.offset,
            words = chunk.len(),
            records = records.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Chunk written"
        );

        if records.is_empty() {
            Ok(ChunkOutcome::Empty)
        } else {
            Ok(ChunkOutcome::Written {
                records: records.len(),
            })
        }
    }

    fn failed(&self, chunk: &WordChunk, error: ProviderError) -> ChunkOutcome {
        tracing::error!(
            offset = chunk.offset,
            provider = self.provider.name(),
            "Chunk failed: {error}"
        );
        ChunkOutcome::Failed {
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with one record per word found in the prompt, unless the
    /// chunk's first word is listed in `fail` or `garble`. Words in `sparse`
    /// get `null` list fields.
    struct EchoProvider {
        fail: Vec<String>,
        garble: Vec<String>,
        sparse: Vec<String>,
        seen: Mutex<Vec<Vec<String>>>,
    }

    impl EchoProvider {
        fn new() -> Self {
            Self {
                fail: Vec::new(),
                garble: Vec::new(),
                sparse: Vec::new(),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn requested_first_words(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|words| words[0].clone())
                .collect()
        }
    }

    #[async_trait]
    impl LlmProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo-v1"
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError> {
            self.stream(request).await
        }

        async fn stream(&self, request: &LlmRequest) -> Result<LlmResponse, ProviderError> {
            let words: Vec<String> = extract_json(&request.prompt, JsonShape::Array).unwrap();
            self.seen.lock().unwrap().push(words.clone());

            if self.fail.contains(&words[0]) {
                return Err(ProviderError::Api {
                    provider: "echo".to_string(),
                    message: "boom".to_string(),
                    status_code: Some(503),
                });
            }
            let text = if self.garble.contains(&words[0]) {
                "Sorry, I can't help with that.".to_string()
            } else {
                let records: Vec<serde_json::Value> = words
                    .iter()
                    .map(|w| {
                        if self.sparse.contains(w) {
                            serde_json::json!({"word": w, "synonyms": null, "antonyms": null})
                        } else {
                            serde_json::json!({"word": w, "translation": format!("t-{w}")})
                        }
                    })
                    .collect();
                format!("Sure!\n```json\n{}\n```", serde_json::to_string(&records).unwrap())
            };

            Ok(LlmResponse {
                text,
                model: "echo-v1".to_string(),
                tokens_used: None,
                latency_ms: 0,
            })
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(1)
        }
    }

    fn words(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("w{i}")).collect()
    }

    fn options(dir: &std::path::Path, chunk_size: usize) -> JobOptions {
        JobOptions {
            chunk_size,
            delay_min_ms: 0,
            delay_max_ms: 0,
            timeout_ms: 5_000,
            prompt: PromptStyle::default(),
            combined_path: dir.join("combined.json"),
            format: OutputFormat::Json,
        }
    }

    fn job(provider: EchoProvider, dir: &std::path::Path, chunk_size: usize) -> (EnrichmentJob, Arc<EchoProvider>) {
        let provider = Arc::new(provider);
        let store = ChunkStore::open(dir).unwrap();
        let job = EnrichmentJob::new(provider.clone(), store, options(dir, chunk_size));
        (job, provider)
    }

    fn combined_words(dir: &std::path::Path) -> Vec<String> {
        let content = std::fs::read_to_string(dir.join("combined.json")).unwrap();
        let records: Vec<EnrichmentRecord> = serde_json::from_str(&content).unwrap();
        records.into_iter().filter_map(|r| r.word).collect()
    }

    #[tokio::test]
    async fn test_full_run_writes_ceil_n_over_c_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let (job, _) = job(EchoProvider::new(), dir.path(), 4);
        let input = words(10);

        let mut reports = Vec::new();
        let summary = job.run(&input, |r| reports.push(r.clone())).await.unwrap();

        assert_eq!(summary.planned, 3);
        assert_eq!(summary.written, 3);
        assert_eq!(summary.combined_records, 10);
        assert_eq!(job.store().existing_offsets().unwrap(), vec![0, 4, 8]);
        assert_eq!(reports.len(), 3);
        assert_eq!(reports[2].words, 2);
        assert_eq!(combined_words(dir.path()), input);
    }

    #[tokio::test]
    async fn test_resume_skips_existing_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::open(dir.path()).unwrap();
        for offset in [0, 3, 6] {
            let records: Vec<EnrichmentRecord> = words(12)[offset..offset + 3]
                .iter()
                .map(|w| EnrichmentRecord {
                    word: Some(w.clone()),
                    ..Default::default()
                })
                .collect();
            store.write_chunk(offset, &records).unwrap();
        }

        let (job, provider) = job(EchoProvider::new(), dir.path(), 3);
        let summary = job.run(&words(12), |_| {}).await.unwrap();

        assert_eq!(summary.resume_offset, 9);
        assert_eq!(summary.planned, 1);
        assert_eq!(provider.requested_first_words(), vec!["w9"]);
        assert_eq!(combined_words(dir.path()), words(12));
    }

    #[tokio::test]
    async fn test_reply_without_array_yields_empty_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = EchoProvider::new();
        provider.garble.push("w2".to_string());
        let (job, _) = job(provider, dir.path(), 2);

        let summary = job.run(&words(6), |_| {}).await.unwrap();

        assert_eq!(summary.written, 2);
        assert_eq!(summary.empty, 1);
        assert!(job.store().read_chunk(2).unwrap().is_empty());
        assert_eq!(combined_words(dir.path()), vec!["w0", "w1", "w4", "w5"]);
    }

    #[tokio::test]
    async fn test_null_list_fields_keep_the_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = EchoProvider::new();
        provider.sparse.push("w1".to_string());
        let (job, _) = job(provider, dir.path(), 3);

        let mut outcomes = Vec::new();
        let summary = job.run(&words(6), |r| outcomes.push(r.outcome.clone())).await.unwrap();

        assert_eq!(summary.written, 2);
        assert_eq!(summary.empty, 0);
        assert!(matches!(outcomes[0], ChunkOutcome::Written { records: 3 }));
        assert_eq!(combined_words(dir.path()), words(6));
        let first = job.store().read_chunk(0).unwrap();
        assert!(first[1].synonyms.is_empty());
        assert!(first[1].translation.is_none());
    }

    #[tokio::test]
    async fn test_failed_chunk_is_skipped_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = EchoProvider::new();
        provider.fail.push("w0".to_string());
        let (job, _) = job(provider, dir.path(), 2);

        let mut outcomes = Vec::new();
        let summary = job.run(&words(4), |r| outcomes.push(r.outcome.clone())).await.unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.written, 1);
        assert!(matches!(outcomes[0], ChunkOutcome::Failed { .. }));
        assert_eq!(job.store().existing_offsets().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_gap_below_resume_point_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let store = ChunkStore::open(dir.path()).unwrap();
        // Offset 2 failed on an earlier run
        store.write_chunk(0, &[]).unwrap();
        store.write_chunk(4, &[]).unwrap();

        let (job, provider) = job(EchoProvider::new(), dir.path(), 2);
        let summary = job.run(&words(8), |_| {}).await.unwrap();

        assert_eq!(summary.resume_offset, 6);
        assert_eq!(provider.requested_first_words(), vec!["w6"]);
    }

    #[tokio::test]
    async fn test_completed_job_only_recombines() {
        let dir = tempfile::tempdir().unwrap();
        let (job, provider) = job(EchoProvider::new(), dir.path(), 5);
        job.run(&words(5), |_| {}).await.unwrap();

        let summary = job.run(&words(5), |_| {}).await.unwrap();
        assert_eq!(summary.planned, 0);
        assert_eq!(summary.combined_records, 5);
        assert_eq!(provider.requested_first_words().len(), 1);
    }

    #[test]
    fn test_pause_within_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path(), 5);
        opts.delay_min_ms = 10;
        opts.delay_max_ms = 20;
        for _ in 0..50 {
            let ms = opts.pause().as_millis();
            assert!((10..=20).contains(&ms));
        }
        opts.delay_max_ms = 0;
        assert_eq!(opts.pause(), Duration::from_millis(10));
    }
}
