//! CLI binary for pdf2tif.
//!
//! Queues every PDF given on the command line, converts them one after the
//! other, and reports progress per file.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2tif::{
    convert_batch, default_base_dir, resolve_engine_dir, BatchProgressCallback, BatchReport,
    Binarization, Compression, ConversionConfig, ConversionOutput, ConversionRequest,
    EngineLocation, ErrorPolicy, OverwritePolicy, ProgressCallback, DEFAULT_DPI,
};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One bar for the whole batch, one printed line per file.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.reset_eta();
    }

    fn on_file_start(&self, index: usize, total: usize, source: &Path) {
        self.bar
            .set_message(format!("({index}/{total}) {}", file_label(source)));
    }

    fn on_file_complete(&self, index: usize, total: usize, output: &ConversionOutput) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3} {}  {}  {}",
            green("✓"),
            index,
            total,
            bold(&output.output_file_name()),
            dim(&format!("{} pages, {}", output.page_count, output.compression)),
            dim(&format!("{:.1}s", output.duration_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, _source: &Path, error: &str) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3} {}",
            red("✗"),
            index,
            total,
            red(error)
        ));
        self.bar.inc(1);
    }

    fn on_file_skipped(&self, index: usize, total: usize, source: &Path) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3} {}",
            dim("-"),
            index,
            total,
            dim(&format!("{} (skipped)", file_label(source)))
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _report: &BatchReport) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert into ~/Downloads with LZW
  pdf2tif invoice.pdf contract.pdf

  # Group 4 fax compression into a chosen folder
  pdf2tif --compression "CCITT T.6" -o out/ scans/*.pdf

  # Keep going past broken files, never replace existing TIFFs
  pdf2tif --on-error continue --overwrite suffix *.pdf

  # Machine-readable report
  pdf2tif --json --no-progress a.pdf b.pdf > report.json

ENGINE:
  PDFium is looked up in <base-dir>/config.ini ([Settings] engine_path, or the
  older poppler_path), else in <base-dir>/pdfium/lib (pdfium\bin on Windows).
  <base-dir> defaults to the directory of this executable.
"#;

/// Convert PDF files into multi-page 1-bit fax TIFFs.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2tif",
    version,
    about = "Convert PDF files into multi-page 1-bit fax TIFFs",
    long_about = "Rasterise every page of each PDF with PDFium, reduce it to black and white, \
and write one multi-page TIFF per PDF at fax resolution (204x196 dpi) with CCITT T.6 \
or LZW compression. Files are converted one after the other in the order given.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files to convert. Duplicates are ignored.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory for the TIFFs. Default: your Downloads folder.
    #[arg(short, long, env = "PDF2TIF_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Compression: "CCITT T.6" or "LZW". Unknown values fall back to CCITT T.6.
    #[arg(short, long, env = "PDF2TIF_COMPRESSION", default_value = "LZW")]
    compression: String,

    /// Rasterisation DPI (72–600). The TIFF is always stamped 204x196.
    #[arg(long, env = "PDF2TIF_DPI", default_value_t = DEFAULT_DPI,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Use a fixed threshold (1–255) instead of dithering.
    #[arg(long, env = "PDF2TIF_THRESHOLD",
          value_parser = clap::value_parser!(u8).range(1..))]
    threshold: Option<u8>,

    /// What to do after a file fails.
    #[arg(long, env = "PDF2TIF_ON_ERROR", value_enum, default_value = "abort")]
    on_error: OnErrorArg,

    /// What to do when the output TIFF already exists.
    #[arg(long, env = "PDF2TIF_OVERWRITE", value_enum, default_value = "overwrite")]
    overwrite: OverwriteArg,

    /// PDFium directory. Skips config.ini lookup.
    #[arg(long, env = "PDF2TIF_ENGINE_DIR")]
    engine_dir: Option<PathBuf>,

    /// Directory holding config.ini and the bundled pdfium/ folder.
    #[arg(long, env = "PDF2TIF_BASE_DIR")]
    base_dir: Option<PathBuf>,

    /// Print the batch report as JSON on stdout.
    #[arg(long, env = "PDF2TIF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2TIF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2TIF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2TIF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OnErrorArg {
    Abort,
    Continue,
}

impl From<OnErrorArg> for ErrorPolicy {
    fn from(v: OnErrorArg) -> Self {
        match v {
            OnErrorArg::Abort => ErrorPolicy::AbortOnError,
            OnErrorArg::Continue => ErrorPolicy::ContinueOnError,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OverwriteArg {
    Overwrite,
    Reject,
    Suffix,
}

impl From<OverwriteArg> for OverwritePolicy {
    fn from(v: OverwriteArg) -> Self {
        match v {
            OverwriteArg::Overwrite => OverwritePolicy::Overwrite,
            OverwriteArg::Reject => OverwritePolicy::Reject,
            OverwriteArg::Suffix => OverwritePolicy::Suffix,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
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

    // ── Engine ───────────────────────────────────────────────────────────
    let engine = match cli.engine_dir {
        Some(ref dir) => EngineLocation::explicit(dir),
        None => resolve_engine_dir(&cli.base_dir.clone().unwrap_or_else(default_base_dir)),
    };
    engine.ensure_exists().with_context(|| {
        format!(
            "PDFium not available (location from {})",
            engine.source()
        )
    })?;

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli, engine)?;
    let output_dir = cli.output_dir.clone().unwrap_or_else(default_output_dir);
    let compression = Compression::from_choice(&cli.compression);

    let requests: Vec<ConversionRequest> = dedup_inputs(&cli.inputs)
        .into_iter()
        .map(|src| ConversionRequest::new(src, &output_dir, compression).with_dpi(cli.dpi))
        .collect();

    if !cli.quiet && !cli.json {
        eprintln!(
            "{} {} → {}",
            bold(&format!("{} file(s)", requests.len())),
            compression,
            output_dir.display()
        );
    }

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    // ── Run batch ────────────────────────────────────────────────────────
    let report = convert_batch(requests, &config, cli.on_error.into(), progress_cb)
        .await
        .context("Batch conversion failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        print_summary(&report, show_progress);
    }

    if !report.is_success() {
        anyhow::bail!(
            "{} of {} file(s) not converted",
            report.failed() + report.skipped(),
            report.files.len()
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, engine: EngineLocation) -> Result<ConversionConfig> {
    let binarization = match cli.threshold {
        Some(t) => Binarization::Threshold(t),
        None => Binarization::Dither,
    };

    ConversionConfig::builder(engine)
        .binarization(binarization)
        .overwrite(cli.overwrite.into())
        .build()
        .context("Invalid configuration")
}

fn print_summary(report: &BatchReport, progress_shown: bool) {
    if !progress_shown {
        for file in &report.files {
            match &file.outcome {
                pdf2tif::FileOutcome::Converted(out) => {
                    eprintln!("converted {} → {}", file.source.display(), out.output_path.display())
                }
                pdf2tif::FileOutcome::Failed { message } => eprintln!("failed    {message}"),
                pdf2tif::FileOutcome::Skipped => eprintln!("skipped   {}", file.source.display()),
            }
        }
    }

    let total = report.files.len();
    if report.is_success() {
        eprintln!(
            "{} all {} file(s) converted",
            green("✔"),
            bold(&total.to_string())
        );
    } else {
        eprintln!(
            "{} {}/{} converted  ({} failed, {} skipped)",
            red("✘"),
            bold(&report.converted().to_string()),
            total,
            red(&report.failed().to_string()),
            report.skipped(),
        );
    }
}

/// Downloads folder, else home, else the current directory.
fn default_output_dir() -> PathBuf {
    dirs::download_dir()
        .filter(|d| d.is_dir())
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Drop repeated paths, keeping first occurrences in order.
fn dedup_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    inputs
        .iter()
        .filter(|p| seen.insert((*p).clone()))
        .cloned()
        .collect()
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
