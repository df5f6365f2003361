use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::eval::EvaluationReport;
use crate::export::Exporter;

const REPORT_FILE: &str = "report.json";

/// Writes the full evaluation report, pretty-printed, to `<out_dir>/report.json`.
#[derive(Debug, Clone)]
pub struct JsonExporter {
    out_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn report_path(&self) -> PathBuf {
        self.out_dir.join(REPORT_FILE)
    }
}

impl Exporter for JsonExporter {
    fn export(&self, report: &EvaluationReport) -> Result<()> {
        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("failed to create {}", self.out_dir.display()))?;
        let path = self.report_path();
        fs::write(&path, serde_json::to_string_pretty(report)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!(
            "wrote {} ({} documents, {} pages)",
            path.display(),
            report.per_document_scores.len(),
            report.total_pages
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::PageScore;
    use crate::eval::DocumentScore;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn report_carries_flat_and_grouped_scores() -> Result<()> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        let dir = std::env::temp_dir().join(format!("ocrmatch-json-{}-{now}", std::process::id()));

        let report = EvaluationReport::from_documents(
            0.75,
            vec![DocumentScore {
                document: "annual".to_string(),
                mean_average_precision: 0.5,
                page_count: 2,
                per_page_scores: vec![
                    PageScore { page_number: 1, average_precision: 1.0, invalid_predictions: 0 },
                    PageScore { page_number: 2, average_precision: 0.0, invalid_predictions: 0 },
                ],
            }],
        );
        let exporter = JsonExporter::new(dir.clone());
        exporter.export(&report)?;

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(exporter.report_path())?)?;
        for key in ["overall_score", "total_pages", "per_page_scores", "per_document_scores"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["overall_score"], 0.5);
        assert_eq!(value["per_page_scores"][1]["document"], "annual");
        assert_eq!(value["per_page_scores"][1]["page_number"], 2);

        let _ = fs::remove_dir_all(&dir);
        Ok(())
    }
}
