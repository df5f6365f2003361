use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::geometry::Rect;
use crate::core::model::{Match, PageTokens};
use crate::eval::corpus::{load_predictions_dir, PagePredictions};
use crate::eval::{evaluate_corpus, load_ground_truth_dir, EvalConfig, EvaluationReport, Predictor};
use crate::export::{Exporter, JsonExporter, TextExporter};
use crate::locate::{Highlighter, LocatorConfig};
use crate::ocr::{load_tables, parse_tsv, select_table, table_regions, OcrBridge};

/// Settings file contents; every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub locator: LocatorConfig,
    pub eval: EvalConfig,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("failed to parse settings {}", path.display()))
    }
}

/// Where the words of a page come from.
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// Serialized `PageTokens`.
    Json(PathBuf),
    /// Tesseract TSV output; page size is given separately.
    Tsv {
        path: PathBuf,
        width: f64,
        height: f64,
        scale: f64,
    },
    /// Page image recognized with the external OCR engine.
    Image {
        path: PathBuf,
        width: f64,
        height: f64,
        bridge: OcrBridge,
    },
}

impl TokenSource {
    pub fn load(&self) -> Result<PageTokens> {
        match self {
            TokenSource::Json(path) => read_page_tokens(path),
            TokenSource::Tsv {
                path,
                width,
                height,
                scale,
            } => {
                let data = fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let tokens = parse_tsv(&data, *scale)
                    .with_context(|| format!("failed to parse {}", path.display()))?;
                Ok(PageTokens {
                    width: *width,
                    height: *height,
                    tokens,
                })
            }
            TokenSource::Image {
                path,
                width,
                height,
                bridge,
            } => bridge.page_tokens(path, *width, *height),
        }
    }
}

fn read_page_tokens(path: &Path) -> Result<PageTokens> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read tokens {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("failed to parse tokens {}", path.display()))
}

/// Which detected table, if any, confines the search.
#[derive(Debug, Clone)]
pub struct TableSelection {
    pub path: PathBuf,
    pub index: usize,
}

impl TableSelection {
    pub fn region(&self, page_number: u32, page_height: f64) -> Result<Option<Rect>> {
        let records = load_tables(&self.path)?;
        let regions = table_regions(&records, page_number, page_height)
            .with_context(|| format!("bad table metadata in {}", self.path.display()))?;
        Ok(select_table(&regions, self.index))
    }
}

pub fn locate_page(
    source: &TokenSource,
    sentences: &[String],
    highlighter: &Highlighter,
    table: Option<&TableSelection>,
    page_number: u32,
) -> Result<Vec<Match>> {
    let page = source.load()?;
    let region = match table {
        Some(t) => t.region(page_number, page.height)?,
        None => None,
    };
    log::info!(
        "locating {} sentences among {} tokens with the {} back end",
        sentences.len(),
        page.tokens.len(),
        highlighter.name()
    );
    Ok(highlighter.highlight(&page, sentences, region.as_ref()))
}

/// Runs a highlighter over stored page tokens laid out as `<dir>/<document>/<page>.json`.
///
/// When `tables_dir` is set, table metadata is read from `<tables_dir>/<document>/<page>.json`.
/// Pages without a metadata file are searched whole.
#[derive(Debug, Clone)]
pub struct TokenPredictor {
    pub token_dir: PathBuf,
    pub tables_dir: Option<PathBuf>,
    pub table_index: usize,
    pub highlighter: Highlighter,
}

impl Predictor for TokenPredictor {
    fn predict(&self, document: &str, page_number: u32, sentences: &[String]) -> Result<Vec<Match>> {
        let file = format!("{page_number}.json");
        let source = TokenSource::Json(self.token_dir.join(document).join(&file));
        let table = match &self.tables_dir {
            Some(dir) => {
                let path = dir.join(document).join(&file);
                if path.is_file() {
                    Some(TableSelection {
                        path,
                        index: self.table_index,
                    })
                } else {
                    log::warn!(
                        "{document}: no table metadata for page {page_number}, searching the whole page"
                    );
                    None
                }
            }
            None => None,
        };
        locate_page(&source, sentences, &self.highlighter, table.as_ref(), page_number)
    }
}

/// Serves previously saved localization output.
#[derive(Debug, Clone, Default)]
pub struct StoredPredictor {
    documents: HashMap<String, Vec<PagePredictions>>,
}

impl StoredPredictor {
    pub fn new(documents: HashMap<String, Vec<PagePredictions>>) -> Self {
        Self { documents }
    }

    pub fn load(dir: &Path) -> Result<Self> {
        Ok(Self::new(load_predictions_dir(dir)?))
    }
}

impl Predictor for StoredPredictor {
    fn predict(&self, document: &str, page_number: u32, _sentences: &[String]) -> Result<Vec<Match>> {
        let pages = self
            .documents
            .get(document)
            .with_context(|| format!("no predictions for document {document}"))?;
        let page = pages
            .iter()
            .find(|p| p.page_number == page_number)
            .with_context(|| format!("no predictions for page {page_number}"))?;
        Ok(page.matches.clone())
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub ground_truth: PathBuf,
    pub output: PathBuf,
    pub eval: EvalConfig,
}

impl PipelineConfig {
    pub fn new(ground_truth: PathBuf, output: PathBuf, eval: EvalConfig) -> Self {
        Self {
            ground_truth,
            output,
            eval,
        }
    }
}

pub fn build_report(config: &PipelineConfig, predictor: &dyn Predictor) -> Result<EvaluationReport> {
    let documents = load_ground_truth_dir(&config.ground_truth)?;
    if documents.is_empty() {
        anyhow::bail!("no annotation files in {}", config.ground_truth.display());
    }
    Ok(evaluate_corpus(&documents, predictor, config.eval.iou_threshold))
}

pub fn export_report(report: &EvaluationReport, output: &Path) -> Result<()> {
    let json_exporter = JsonExporter::new(output.to_path_buf());
    json_exporter.export(report)?;

    let text_exporter = TextExporter::new(output.to_path_buf());
    text_exporter.export(report)?;

    Ok(())
}
