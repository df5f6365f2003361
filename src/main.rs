use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

use ocrmatch::eval::annotations::preprocess_dir;
use ocrmatch::eval::Predictor;
use ocrmatch::locate::Highlighter;
use ocrmatch::ocr::OcrBridge;
use ocrmatch::pipeline::{
    build_report, export_report, locate_page, PipelineConfig, Settings, StoredPredictor,
    TableSelection, TokenPredictor, TokenSource,
};

#[derive(Parser, Debug)]
#[command(name = "ocrmatch")]
#[command(version, about = "Locate sentences in OCR output and score localization quality", long_about = None)]
struct Cli {
    /// Settings file (JSON) with locator and evaluation thresholds
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log progress at info level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress console status lines
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find sentences on one page and print their boxes as JSON
    #[command(group(ArgGroup::new("source").required(true).args(["tokens", "tsv", "image"])))]
    Locate {
        /// Page tokens as JSON ({width, height, tokens})
        #[arg(long)]
        tokens: Option<PathBuf>,

        /// Tesseract TSV output for the page
        #[arg(long)]
        tsv: Option<PathBuf>,

        /// Page image to run through tesseract
        #[arg(long)]
        image: Option<PathBuf>,

        /// Page width in page units (TSV and image sources)
        #[arg(long, required_unless_present = "tokens")]
        page_width: Option<f64>,

        /// Page height in page units (TSV and image sources)
        #[arg(long, required_unless_present = "tokens")]
        page_height: Option<f64>,

        /// Factor from image pixels to page units
        #[arg(long, default_value_t = 1.0)]
        scale: f64,

        /// Tesseract language
        #[arg(long, default_value = "eng")]
        lang: String,

        /// Sentence to locate (repeatable)
        #[arg(short, long = "sentence")]
        sentences: Vec<String>,

        /// File with one sentence per line
        #[arg(long)]
        sentences_file: Option<PathBuf>,

        /// Page number, used to pick tables from metadata
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[command(flatten)]
        search: SearchArgs,

        /// Table metadata JSON from the structure detector
        #[arg(long)]
        tables: Option<PathBuf>,

        /// Write matches here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Score localization against annotated pages
    #[command(group(ArgGroup::new("predictions_source").required(true).args(["predictions", "tokens"])))]
    Evaluate {
        /// Directory of processed annotation files (<document>.json)
        #[arg(long)]
        ground_truth: PathBuf,

        /// Directory of saved predictions (<document>.json)
        #[arg(long)]
        predictions: Option<PathBuf>,

        /// Directory of page tokens (<document>/<page>.json) to localize on the fly
        #[arg(long)]
        tokens: Option<PathBuf>,

        /// Directory of table metadata (<document>/<page>.json)
        #[arg(long, requires = "tokens")]
        tables: Option<PathBuf>,

        #[command(flatten)]
        search: SearchArgs,

        /// Minimum IoU for a prediction to count as a hit
        #[arg(long)]
        iou_threshold: Option<f64>,

        /// Output directory for report.json and report.txt
        #[arg(short, long, default_value = "evaluation_output")]
        output: PathBuf,
    },

    /// Convert raw annotation exports into per-page ground truth files
    Preprocess {
        /// Directory of exported annotation JSON files
        input: PathBuf,

        /// Output directory for cleaned files
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
struct SearchArgs {
    /// Localization back end
    #[arg(long, value_enum, default_value_t = Backend::Ocr)]
    backend: Backend,

    /// Which detected table confines the search
    #[arg(long, default_value_t = 0)]
    table_index: usize,

    /// Drop tokens at or below this OCR confidence
    #[arg(long)]
    min_confidence: Option<i32>,

    /// Word similarity needed for a fuzzy match
    #[arg(long)]
    similarity: Option<f64>,

    /// Fraction of sentence words that must match
    #[arg(long)]
    coverage: Option<f64>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Backend {
    Ocr,
    Search,
}

impl SearchArgs {
    fn highlighter(&self, settings: &Settings) -> Highlighter {
        let mut config = settings.locator;
        if let Some(v) = self.min_confidence {
            config = config.with_min_confidence(v);
        }
        if let Some(v) = self.similarity {
            config = config.with_similarity_threshold(v);
        }
        if let Some(v) = self.coverage {
            config = config.with_min_word_coverage(v);
        }
        match self.backend {
            Backend::Ocr => Highlighter::ocr(config),
            Backend::Search => Highlighter::Search,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    match cli.command {
        Commands::Locate {
            tokens,
            tsv,
            image,
            page_width,
            page_height,
            scale,
            lang,
            sentences,
            sentences_file,
            page,
            search,
            tables,
            output,
        } => {
            let width = page_width.unwrap_or_default();
            let height = page_height.unwrap_or_default();
            let source = match (tokens, tsv, image) {
                (Some(path), _, _) => TokenSource::Json(path),
                (_, Some(path), _) => TokenSource::Tsv {
                    path,
                    width,
                    height,
                    scale,
                },
                (_, _, Some(path)) => TokenSource::Image {
                    path,
                    width,
                    height,
                    bridge: OcrBridge::new(std::env::temp_dir().join("ocrmatch"))
                        .with_lang(lang)
                        .with_scale(scale),
                },
                _ => anyhow::bail!("no token source given"),
            };
            let table = tables.map(|path| TableSelection {
                path,
                index: search.table_index,
            });
            let sentences = collect_sentences(sentences, sentences_file)?;
            let highlighter = search.highlighter(&settings);
            run_locate(&source, &sentences, &highlighter, table.as_ref(), page, output, cli.quiet)
        }
        Commands::Evaluate {
            ground_truth,
            predictions,
            tokens,
            tables,
            search,
            iou_threshold,
            output,
        } => {
            let mut eval = settings.eval;
            if let Some(v) = iou_threshold {
                eval.iou_threshold = v;
            }
            let predictor: Box<dyn Predictor> = match (predictions, tokens) {
                (Some(dir), _) => Box::new(StoredPredictor::load(&dir)?),
                (_, Some(token_dir)) => Box::new(TokenPredictor {
                    token_dir,
                    tables_dir: tables,
                    table_index: search.table_index,
                    highlighter: search.highlighter(&settings),
                }),
                _ => anyhow::bail!("no prediction source given"),
            };
            let config = PipelineConfig::new(ground_truth, output, eval);
            run_evaluate(&config, predictor.as_ref(), cli.quiet)
        }
        Commands::Preprocess { input, output } => {
            if !input.is_dir() {
                anyhow::bail!("Input is not a directory: {}", input.display());
            }
            let count = preprocess_dir(&input, &output)
                .with_context(|| format!("Failed to preprocess {}", input.display()))?;
            if !cli.quiet {
                println!("[✓] Processed {} file(s) into {}", count, output.display());
            }
            Ok(())
        }
    }
}

fn collect_sentences(mut sentences: Vec<String>, file: Option<PathBuf>) -> Result<Vec<String>> {
    if let Some(path) = file {
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read sentences: {}", path.display()))?;
        sentences.extend(
            data.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        );
    }
    if sentences.is_empty() {
        anyhow::bail!("No sentences given");
    }
    Ok(sentences)
}

fn run_locate(
    source: &TokenSource,
    sentences: &[String],
    highlighter: &Highlighter,
    table: Option<&TableSelection>,
    page: u32,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let matches = locate_page(source, sentences, highlighter, table, page)?;
    let data = serde_json::to_string_pretty(&matches)?;

    match output {
        Some(path) => {
            fs::write(&path, data)
                .with_context(|| format!("Failed to write: {}", path.display()))?;
            if !quiet {
                let found = matches.iter().filter(|m| !m.bbox.is_empty()).count();
                println!("[✓] {} box(es) for {} sentence(s) saved to {}", found, sentences.len(), path.display());
            }
        }
        None => println!("{data}"),
    }
    Ok(())
}

fn run_evaluate(config: &PipelineConfig, predictor: &dyn Predictor, quiet: bool) -> Result<()> {
    if !config.ground_truth.is_dir() {
        anyhow::bail!("Ground truth is not a directory: {}", config.ground_truth.display());
    }

    if !quiet {
        println!("[*] Ground truth: {}", config.ground_truth.display());
        println!("[*] Output: {}", config.output.display());
        println!("[*] IoU threshold: {}", config.eval.iou_threshold);
        println!("\n[+] Scoring pages...");
    }

    let report = build_report(config, predictor)
        .with_context(|| format!("Failed to evaluate: {}", config.ground_truth.display()))?;

    export_report(&report, &config.output)
        .with_context(|| format!("Failed to export to: {}", config.output.display()))?;

    if !quiet {
        for doc in &report.per_document_scores {
            println!(
                "  {}: mAP = {:.3} ({} pages)",
                doc.document, doc.mean_average_precision, doc.page_count
            );
        }
        println!(
            "\n[✓] Overall mAP@{:.2}: {:.3} over {} page(s)",
            config.eval.iou_threshold, report.overall_score, report.total_pages
        );
        println!("[✓] Results saved to: {}", config.output.display());
    }

    Ok(())
}
