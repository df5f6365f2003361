use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::model::{AggregateScore, Match, PageScore};
use crate::eval::annotations::{json_files, DocumentGroundTruth, GroundTruthPage};
use crate::eval::page::evaluate_page;

/// Produces localization output for one annotated page.
///
/// Called with the document, the page number and the sentences to locate.
pub trait Predictor: Sync {
    fn predict(&self, document: &str, page_number: u32, sentences: &[String]) -> Result<Vec<Match>>;
}

impl<F> Predictor for F
where
    F: Fn(&str, u32, &[String]) -> Result<Vec<Match>> + Sync,
{
    fn predict(&self, document: &str, page_number: u32, sentences: &[String]) -> Result<Vec<Match>> {
        self(document, page_number, sentences)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentScore {
    pub document: String,
    pub mean_average_precision: f64,
    pub page_count: usize,
    pub per_page_scores: Vec<PageScore>,
}

/// Flat per-page entry of the corpus report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportPageScore {
    pub document: String,
    pub page_number: u32,
    pub average_precision: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationReport {
    pub iou_threshold: f64,
    pub overall_score: f64,
    pub total_pages: usize,
    pub per_page_scores: Vec<ReportPageScore>,
    pub per_document_scores: Vec<DocumentScore>,
}

impl EvaluationReport {
    /// Builds the report from document scores; the overall score weights every page equally.
    pub fn from_documents(iou_threshold: f64, per_document_scores: Vec<DocumentScore>) -> Self {
        let per_page_scores: Vec<ReportPageScore> = per_document_scores
            .iter()
            .flat_map(|doc| {
                doc.per_page_scores.iter().map(|page| ReportPageScore {
                    document: doc.document.clone(),
                    page_number: page.page_number,
                    average_precision: page.average_precision,
                })
            })
            .collect();

        let all_pages: Vec<PageScore> = per_document_scores
            .iter()
            .flat_map(|doc| doc.per_page_scores.iter().copied())
            .collect();
        let overall = AggregateScore::from_pages(&all_pages);

        Self {
            iou_threshold,
            overall_score: overall.mean_average_precision,
            total_pages: overall.page_count,
            per_page_scores,
            per_document_scores,
        }
    }
}

fn score_page(
    document: &str,
    page: &GroundTruthPage,
    predictor: &dyn Predictor,
    iou_threshold: f64,
) -> Option<PageScore> {
    let page_number = match page.page_number() {
        Ok(n) => n,
        Err(e) => {
            log::warn!("{document}: skipping page: {e}");
            return None;
        }
    };

    let matches = match predictor.predict(document, page_number, &page.sentences()) {
        Ok(m) => m,
        Err(e) => {
            log::warn!("{document}: page {page_number} excluded: {e:#}");
            return None;
        }
    };

    let score = evaluate_page(page_number, &matches, &page.results, iou_threshold);
    log::info!(
        "{document}: page {page_number} AP = {:.3}",
        score.average_precision
    );
    Some(score)
}

/// Scores every annotated page of a document. Returns `None` if no page could be scored.
pub fn evaluate_document(
    document: &DocumentGroundTruth,
    predictor: &dyn Predictor,
    iou_threshold: f64,
) -> Option<DocumentScore> {
    let pages: Vec<PageScore> = document
        .pages
        .par_iter()
        .filter(|page| !page.results.is_empty())
        .filter_map(|page| score_page(&document.name, page, predictor, iou_threshold))
        .collect();

    if pages.is_empty() {
        log::warn!("{}: no pages scored", document.name);
        return None;
    }

    let aggregate = AggregateScore::from_pages(&pages);
    log::info!(
        "{}: mAP = {:.3} ({} pages)",
        document.name,
        aggregate.mean_average_precision,
        aggregate.page_count
    );
    Some(DocumentScore {
        document: document.name.clone(),
        mean_average_precision: aggregate.mean_average_precision,
        page_count: aggregate.page_count,
        per_page_scores: pages,
    })
}

/// Scores all documents in parallel, keeping their input order.
pub fn evaluate_corpus(
    documents: &[DocumentGroundTruth],
    predictor: &dyn Predictor,
    iou_threshold: f64,
) -> EvaluationReport {
    let per_document_scores: Vec<DocumentScore> = documents
        .par_iter()
        .filter_map(|doc| evaluate_document(doc, predictor, iou_threshold))
        .collect();

    EvaluationReport::from_documents(iou_threshold, per_document_scores)
}

/// Stored localization output for one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagePredictions {
    pub page_number: u32,
    pub matches: Vec<Match>,
}

/// Reads `<document>.json` prediction files, keyed by document name.
pub fn load_predictions_dir(dir: &Path) -> Result<HashMap<String, Vec<PagePredictions>>> {
    let mut out = HashMap::new();
    for path in json_files(dir)? {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed to read predictions {}", path.display()))?;
        let pages: Vec<PagePredictions> = serde_json::from_str(&data)
            .with_context(|| format!("failed to parse predictions {}", path.display()))?;
        out.insert(name, pages);
    }
    Ok(out)
}
