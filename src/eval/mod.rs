pub mod annotations;
pub mod ap;
pub mod corpus;
pub mod page;

use serde::{Deserialize, Serialize};

pub use annotations::{load_ground_truth_dir, DocumentGroundTruth, GroundTruthPage};
pub use ap::average_precision;
pub use corpus::{
    evaluate_corpus, evaluate_document, DocumentScore, EvaluationReport, Predictor, ReportPageScore,
};
pub use page::evaluate_page;

pub const DEFAULT_IOU_THRESHOLD: f64 = 0.75;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EvalConfig {
    pub iou_threshold: f64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            iou_threshold: DEFAULT_IOU_THRESHOLD,
        }
    }
}
