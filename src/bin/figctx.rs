//! CLI binary for figctx.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use figctx::pipeline::input::load_document;
use figctx::{
    extract_batch, extract_dir, write_document, BatchOutput, DocumentOutput, ExtractionConfig,
    ExtractionProgressCallback, FsAssetStore, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per
/// document. Documents complete out of order, so timings are keyed by id.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<String, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} documents  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn elapsed_ms(&self, document_id: &str) -> u128 {
        self.start_times
            .lock()
            .unwrap()
            .remove(document_id)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting artifacts from {total_documents} document(s)…"))
        ));
    }

    fn on_document_start(&self, document_id: &str) {
        self.start_times
            .lock()
            .unwrap()
            .insert(document_id.to_string(), Instant::now());
        self.bar.set_message(document_id.to_string());
    }

    fn on_document_complete(&self, document_id: &str, artifact_count: usize) {
        let elapsed_ms = self.elapsed_ms(document_id);
        self.bar.println(format!(
            "  {} {:<24}  {}  {}",
            green("✓"),
            document_id,
            dim(&format!("{artifact_count:>3} artifact(s)")),
            dim(&format!("{:.2}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, document_id: &str, error: &str) {
        let elapsed_ms = self.elapsed_ms(document_id);

        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:<24}  {}  {}",
            red("✗"),
            document_id,
            red(&msg),
            dim(&format!("{:.2}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let failed = total_documents.saturating_sub(success_count);
        self.bar.finish_and_clear();
        if failed == 0 {
            eprintln!(
                "{} {} document(s) extracted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} document(s) extracted  ({} failed)",
                if failed == total_documents {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_documents,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # List figures and tables of one article
  figctx PMC1234567.html

  # Whole corpus, one JSON file per article
  figctx corpus/ -o records/

  # Also save image assets
  figctx corpus/ -o records/ --assets-dir assets/

  # Full batch as JSON on stdout, with a field-fill summary on stderr
  figctx corpus/ --json --summary > batch.json

  # Stricter contextual matching and a custom stop-word list
  figctx corpus/ --min-context-terms 3 --stop-words extra_stop_words.txt

INPUT:
  A single .html/.htm/.xhtml/.xml file, or a directory searched recursively
  for them. The document id is the file name without its extension.

ENVIRONMENT VARIABLES:
  Every flag can be set through FIGCTX_<FLAG> (e.g. FIGCTX_CONCURRENCY=4).
  RUST_LOG overrides the log level chosen by --verbose / --quiet.
"#;

/// Extract figures and tables, with captions and citing paragraphs, from
/// scientific articles.
#[derive(Parser, Debug)]
#[command(
    name = "figctx",
    version,
    about = "Extract figures and tables with their captions and context from scientific articles",
    long_about = "Extract figures and tables from HTML article pages and JATS XML, with captions, \
asset sources, the paragraphs that cite each artifact, and the paragraphs that discuss it.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Article file or directory of articles.
    input: PathBuf,

    /// Write one `{document_id}.json` per document into this directory.
    #[arg(short, long, env = "FIGCTX_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Save image assets under this directory.
    #[arg(long, env = "FIGCTX_ASSETS_DIR")]
    assets_dir: Option<PathBuf>,

    /// Timeout for fetching remote assets, in seconds.
    #[arg(long, env = "FIGCTX_FETCH_TIMEOUT", default_value_t = 30)]
    fetch_timeout: u64,

    /// Shared informative terms needed for a contextual paragraph.
    #[arg(long, env = "FIGCTX_MIN_CONTEXT_TERMS", default_value_t = 2)]
    min_context_terms: usize,

    /// File with extra stop words, one per line.
    #[arg(long, env = "FIGCTX_STOP_WORDS")]
    stop_words: Option<PathBuf>,

    /// Number of documents processed concurrently.
    #[arg(short, long, env = "FIGCTX_CONCURRENCY", default_value_t = 8)]
    concurrency: usize,

    /// Separator between table cells in `body_text`.
    #[arg(long, env = "FIGCTX_CELL_SEPARATOR", default_value = " | ")]
    cell_separator: String,

    /// Drop icons, logos and other decorative images.
    #[arg(long, env = "FIGCTX_SKIP_DECORATIVE")]
    skip_decorative: bool,

    /// Do not keep the serialized markup of tables.
    #[arg(long, env = "FIGCTX_NO_TABLE_MARKUP")]
    no_table_markup: bool,

    /// Print the whole batch as JSON on stdout.
    #[arg(long, env = "FIGCTX_JSON")]
    json: bool,

    /// Print per-field fill counts after the batch.
    #[arg(long, env = "FIGCTX_SUMMARY")]
    summary: bool,

    /// Disable progress bar.
    #[arg(long, env = "FIGCTX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FIGCTX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FIGCTX_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Load and extract ─────────────────────────────────────────────────
    let batch = run(&cli.input, &config).await?;

    // ── Emit ─────────────────────────────────────────────────────────────
    if let Some(ref dir) = cli.output_dir {
        for doc in &batch.documents {
            write_document(doc, dir)
                .await
                .with_context(|| format!("Failed to write records for {}", doc.document_id))?;
        }
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&batch).context("Failed to serialise output")?;
        println!("{json}");
    } else if cli.output_dir.is_none() {
        print_listing(&batch);
    }

    if !cli.quiet {
        let s = &batch.stats;
        eprintln!(
            "{}  {}/{} documents  {} images  {} tables  {} assets saved  {}ms{}",
            if s.failed_documents == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            s.processed_documents,
            s.total_documents,
            s.total_images,
            s.total_tables,
            s.saved_assets,
            s.duration_ms,
            cli.output_dir
                .as_ref()
                .map(|d| format!("  →  {}", bold(&d.display().to_string())))
                .unwrap_or_default(),
        );
    }

    if cli.summary {
        print_summary(&batch);
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let extra_stop_words = if let Some(ref path) = cli.stop_words {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read stop words from {:?}", path))?;
        text.lines()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect()
    } else {
        Vec::new()
    };

    let mut builder = ExtractionConfig::builder()
        .min_context_terms(cli.min_context_terms)
        .extra_stop_words(extra_stop_words)
        .concurrency(cli.concurrency)
        .cell_separator(cli.cell_separator.clone())
        .skip_decorative_images(cli.skip_decorative)
        .keep_table_markup(!cli.no_table_markup);

    if let Some(ref dir) = cli.assets_dir {
        let store = FsAssetStore::with_timeout(dir, Duration::from_secs(cli.fetch_timeout))
            .context("Failed to set up asset store")?;
        builder = builder.asset_store(Arc::new(store));
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// One file, or every document under a directory. A single unreadable file
/// is fatal; inside a directory it becomes a failed document.
async fn run(input: &Path, config: &ExtractionConfig) -> Result<BatchOutput> {
    if input.is_file() {
        let doc = load_document(input)
            .await
            .with_context(|| format!("Failed to read {}", input.display()))?;
        return extract_batch(vec![doc], config)
            .await
            .context("Extraction failed");
    }
    extract_dir(input, config)
        .await
        .with_context(|| format!("Extraction of {} failed", input.display()))
}

fn print_listing(batch: &BatchOutput) {
    for doc in &batch.documents {
        print_document(doc);
    }
}

fn print_document(doc: &DocumentOutput) {
    let title = doc.metadata.title.as_deref().unwrap_or("");
    println!("{}  {}", bold(&doc.document_id), dim(title));
    if let Some(ref e) = doc.error {
        println!("  {} {}", red("✗"), e);
        return;
    }
    if doc.artifacts.is_empty() {
        println!("  {}", dim("no figures or tables"));
    }
    for record in &doc.artifacts {
        let caption = if record.caption.is_empty() {
            dim("(no caption)")
        } else {
            record.caption.clone()
        };
        println!(
            "  {:<28} {}  {}",
            record.artifact_id,
            dim(&format!(
                "{} citing / {} contextual",
                record.citing_paragraphs.len(),
                record.contextual_paragraphs.len()
            )),
            caption
        );
    }
}

fn print_summary(batch: &BatchOutput) {
    let s = batch.summary();
    let pct = |n: usize| {
        if s.records == 0 {
            0.0
        } else {
            n as f64 * 100.0 / s.records as f64
        }
    };
    eprintln!("{}", bold("Field coverage"));
    eprintln!("  records          {:>6}", s.records);
    for (name, n) in [
        ("caption", s.with_caption),
        ("alt_text", s.with_alt_text),
        ("citing", s.with_citing),
        ("contextual", s.with_contextual),
        ("saved_location", s.with_saved_location),
    ] {
        eprintln!("  {:<16} {:>6}  {}", name, n, dim(&format!("{:.1}%", pct(n))));
    }
}
