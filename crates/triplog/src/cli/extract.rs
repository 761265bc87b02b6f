//! The `triplog extract` command.

use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use triplog_core::{
    BatchExtractor, BatchOptions, BatchResult, Config, DocumentKind, Extractor, FileDiscovery,
    OutputFormat as CoreOutputFormat, RecordWriter, RetryConfig,
};

/// Kind of document in the input images.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Kind {
    /// Expense receipts
    Receipt,
    /// Vehicle odometer photos
    Odometer,
}

impl From<Kind> for DocumentKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Receipt => DocumentKind::Receipt,
            Kind::Odometer => DocumentKind::Odometer,
        }
    }
}

/// Supported output formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON object or array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

/// Supported extraction backends.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Provider {
    /// OpenRouter API
    Openrouter,
    /// OpenAI API
    Openai,
}

impl Provider {
    fn as_str(&self) -> &'static str {
        match self {
            Provider::Openrouter => "openrouter",
            Provider::Openai => "openai",
        }
    }
}

/// Arguments for the `extract` command.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// What the images contain
    #[arg(value_enum)]
    pub kind: Kind,

    /// Image file or directory of images
    pub input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Number of concurrent extraction calls (defaults to batch.parallel)
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Extraction backend (defaults to extraction.provider)
    #[arg(long, value_enum)]
    pub provider: Option<Provider>,

    /// Model name (provider-specific)
    #[arg(long)]
    pub model: Option<String>,

    /// API key for the selected backend, overriding the config file
    #[arg(long, env = "TRIPLOG_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Retries after the first attempt for transient failures
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Delay before the first retry, in milliseconds
    #[arg(long)]
    pub initial_delay_ms: Option<u64>,

    /// Upper bound for any retry delay, in milliseconds
    #[arg(long)]
    pub max_delay_ms: Option<u64>,

    /// Multiplier applied to the delay after each retry (>= 1.0)
    #[arg(long)]
    pub backoff_factor: Option<f64>,
}

impl ExtractArgs {
    /// Apply CLI retry overrides on top of the configured policy.
    fn retry_config(&self, base: &RetryConfig) -> anyhow::Result<RetryConfig> {
        let retry = RetryConfig {
            max_retries: self.max_retries.unwrap_or(base.max_retries),
            initial_delay_ms: self.initial_delay_ms.unwrap_or(base.initial_delay_ms),
            max_delay_ms: self.max_delay_ms.unwrap_or(base.max_delay_ms),
            backoff_factor: self.backoff_factor.unwrap_or(base.backoff_factor),
        };
        if !retry.backoff_factor.is_finite() || retry.backoff_factor < 1.0 {
            anyhow::bail!(
                "--backoff-factor must be >= 1.0 (got {})",
                retry.backoff_factor
            );
        }
        Ok(retry)
    }
}

/// Execute the extract command.
pub async fn execute(args: ExtractArgs, config: Config) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input path does not exist: {}", args.input.display());
    }

    let retry = args.retry_config(&config.retry)?;
    let parallel = args.parallel.unwrap_or(config.batch.parallel);
    if parallel == 0 {
        anyhow::bail!("--parallel must be > 0");
    }

    let discovered = FileDiscovery::new(&config.batch.supported_formats).discover(&args.input);
    let total_bytes: u64 = discovered.iter().map(|f| f.size).sum();
    let files: Vec<PathBuf> = discovered.into_iter().map(|f| f.path).collect();
    if files.is_empty() {
        anyhow::bail!(
            "No supported images found at {} (supported: {})",
            args.input.display(),
            config.batch.supported_formats.join(", ")
        );
    }

    let extractor = Extractor::from_config(
        &config,
        args.provider.map(|p| p.as_str()),
        args.model.as_deref(),
        args.api_key.as_deref(),
    )?;
    let kind = DocumentKind::from(args.kind);
    tracing::info!(
        "Extracting {} {kind} image(s) ({:.1} MB) via {}",
        files.len(),
        total_bytes as f64 / (1024.0 * 1024.0),
        extractor.backend_name()
    );

    let sink: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = RecordWriter::new(sink, args.format.into(), args.pretty);

    let progress = (files.len() > 1).then(|| create_progress_bar(files.len() as u64));
    let batch = BatchExtractor::new(
        Arc::new(extractor),
        BatchOptions {
            parallel,
            max_file_bytes: config.batch.max_file_bytes(),
            retry: Some(retry),
        },
    );

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<BatchResult>();
    let batch_handle = tokio::spawn(async move {
        batch
            .extract_batch(kind, &files, move |result| {
                let _ = tx.send(result);
            })
            .await
    });

    while let Some(result) = rx.recv().await {
        match result {
            BatchResult::Success(record) => writer.write(record)?,
            BatchResult::Failure(path, e) => {
                tracing::error!(
                    error_kind = %e.kind(),
                    "Extraction failed: {} - {e}",
                    path.display()
                );
            }
        }
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    let (succeeded, failed) = batch_handle.await?;
    writer.finish()?;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if failed > 0 {
        tracing::warn!("Extraction: {succeeded} succeeded, {failed} failed");
    } else {
        tracing::info!("Extraction: {succeeded} succeeded");
    }
    if succeeded == 0 {
        anyhow::bail!("All {failed} extraction(s) failed");
    }
    Ok(())
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb
}
