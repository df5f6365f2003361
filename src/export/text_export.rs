use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::eval::{DocumentScore, EvaluationReport};
use crate::export::Exporter;

/// Plain-text summary: one mAP row per document, then per-page AP tables.
#[derive(Debug, Clone)]
pub struct TextExporter {
    out_dir: PathBuf,
}

impl TextExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn render(report: &EvaluationReport) -> String {
        let mut out = String::new();
        let width = report
            .per_document_scores
            .iter()
            .map(|d| d.document.len())
            .chain(std::iter::once("OVERALL_MEAN".len()))
            .max()
            .unwrap_or_default();

        out.push_str(&format!("mAP@{:.2}\n", report.iou_threshold));
        out.push_str(&format!("{:<width$}  {:>8}  {:>5}\n", "document", "mAP", "pages"));
        for doc in &report.per_document_scores {
            out.push_str(&format!(
                "{:<width$}  {:>8.3}  {:>5}\n",
                doc.document, doc.mean_average_precision, doc.page_count
            ));
        }
        out.push_str(&format!(
            "{:<width$}  {:>8.3}  {:>5}\n",
            "OVERALL_MEAN", report.overall_score, report.total_pages
        ));

        for doc in &report.per_document_scores {
            out.push('\n');
            out.push_str(&Self::render_pages(doc));
        }
        out
    }

    fn render_pages(doc: &DocumentScore) -> String {
        let mut out = format!("=== {} ===\n", doc.document);
        for page in &doc.per_page_scores {
            out.push_str(&format!(
                "page {:>4}  AP {:.3}\n",
                page.page_number, page.average_precision
            ));
        }
        out.push_str(&format!("average    AP {:.3}\n", doc.mean_average_precision));
        out
    }
}

impl Exporter for TextExporter {
    fn export(&self, report: &EvaluationReport) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        fs::write(self.out_dir.join("report.txt"), Self::render(report))?;
        Ok(())
    }
}
