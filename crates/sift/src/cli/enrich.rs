//! The `sift enrich` command: chunked word-list enrichment with resume.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use sift_core::batch::{load_words, ChunkOutcome, ChunkReport};
use sift_core::{
    ChunkStore, Config, EnrichmentJob, JobOptions, JobSummary, LlmProviderFactory, OutputFormat,
    ProviderKind,
};

use super::types::{Format, Provider};

/// Arguments for the `enrich` command.
#[derive(Args, Debug)]
pub struct EnrichArgs {
    /// Newline-delimited word list
    #[arg(required_unless_present = "combine_only")]
    pub input: Option<PathBuf>,

    /// Directory for per-chunk files (overrides config)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Combined output file (defaults to <output-dir>/<combined_file>)
    #[arg(long)]
    pub combined: Option<PathBuf>,

    /// Words per provider request
    #[arg(short, long)]
    pub chunk_size: Option<usize>,

    /// Provider to enrich with (overrides config)
    #[arg(short, long, value_enum)]
    pub provider: Option<Provider>,

    /// Model name (provider-specific)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Combined output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: Format,

    /// Skip provider calls and only rebuild the combined file
    #[arg(long)]
    pub combine_only: bool,

    /// Do not pause between chunks
    #[arg(long)]
    pub no_delay: bool,
}

pub async fn execute(args: EnrichArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(dir) = &args.output_dir {
        config.batch.output_dir = dir.clone();
    }
    if let Some(size) = args.chunk_size {
        anyhow::ensure!(size > 0, "--chunk-size must be at least 1");
        config.batch.chunk_size = size;
    }
    if args.no_delay {
        config.batch.delay_min_ms = 0;
        config.batch.delay_max_ms = 0;
    }

    let format: OutputFormat = args.format.into();
    let combined = args
        .combined
        .clone()
        .unwrap_or_else(|| config.combined_path().with_extension(format.extension()));

    let store = ChunkStore::open(config.output_dir())?;

    if args.combine_only {
        let records = store.combine(&combined, format)?;
        println!("Combined {records} records into {}", combined.display());
        return Ok(());
    }

    let kind = match args.provider {
        Some(provider) => ProviderKind::from(provider),
        None => ProviderKind::parse(&config.batch.provider)?,
    };
    let provider = LlmProviderFactory::create(kind, &config.llm, args.model.as_deref())?;
    anyhow::ensure!(
        provider.is_available().await,
        "Provider {kind} is not available; check {}",
        kind.key_var()
    );
    tracing::info!(provider = %kind, model = provider.model(), "Enriching with provider");

    let input = args
        .input
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("A word list is required unless --combine-only is set"))?;
    let words = load_words(input)?;
    tracing::info!(words = words.len(), path = %input.display(), "Loaded word list");

    let mut options = JobOptions::from_config(&config);
    options.combined_path = combined.clone();
    options.format = format;

    let job = EnrichmentJob::new(Arc::from(provider), store, options);
    let (start, pending) = job.pending(&words)?;
    if pending.is_empty() {
        tracing::info!(resume_offset = start, "All chunks already written");
    }

    let progress = create_progress_bar(pending.len() as u64);
    let started = Instant::now();
    let summary = job
        .run(&words, |report| update_progress(&progress, report))
        .await?;
    progress.finish_and_clear();

    print_summary(&summary, started.elapsed());
    println!("Combined output: {}", combined.display());
    Ok(())
}

fn update_progress(progress: &ProgressBar, report: &ChunkReport) {
    progress.inc(1);
    let status = match &report.outcome {
        ChunkOutcome::Written { records } => format!("{records} records"),
        ChunkOutcome::Empty => "empty".to_string(),
        ChunkOutcome::Failed { .. } => "failed".to_string(),
    };
    progress.set_message(format!("offset {}: {status}", report.offset));
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

fn print_summary(summary: &JobSummary, elapsed: std::time::Duration) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Resumed at:   {:>8}", summary.resume_offset);
    eprintln!("    Written:      {:>8}", summary.written);
    if summary.empty > 0 {
        eprintln!("    Empty:        {:>8}", summary.empty);
    }
    if summary.failed > 0 {
        eprintln!("    Failed:       {:>8}", summary.failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Chunks:       {:>8}", summary.planned);
    eprintln!("    Records:      {:>8}", summary.combined_records);
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("  ====================================");
    if summary.failed > 0 {
        eprintln!("  Failed chunks are not retried on resume.");
    }
}
