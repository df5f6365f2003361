use crate::core::model::{GroundTruthBox, Match, PageScore, PredictionBox};
use crate::eval::ap::average_precision;

const DEFAULT_CONFIDENCE: f64 = 1.0;

/// Converts localization output into absolute prediction boxes.
///
/// Page dimensions come from the first ground-truth box. Returns the usable predictions
/// and the number of entries skipped because they had no scorable box.
pub fn resolve_predictions(
    matches: &[Match],
    ground_truth: &[GroundTruthBox],
) -> (Vec<PredictionBox>, usize) {
    let Some(first) = ground_truth.first() else {
        return (Vec::new(), 0);
    };

    let mut invalid = 0;
    let mut predictions = Vec::with_capacity(matches.len());
    for m in matches {
        match m.bbox.resolve(first.page_width, first.page_height) {
            Some(rect) => predictions.push(PredictionBox {
                sentence: m.sentence.clone(),
                rect,
                confidence: m.confidence.unwrap_or(DEFAULT_CONFIDENCE),
            }),
            None => invalid += 1,
        }
    }
    (predictions, invalid)
}

pub fn evaluate_page(
    page_number: u32,
    matches: &[Match],
    ground_truth: &[GroundTruthBox],
    iou_threshold: f64,
) -> PageScore {
    if ground_truth.is_empty() {
        return PageScore {
            page_number,
            average_precision: if matches.is_empty() { 1.0 } else { 0.0 },
            invalid_predictions: 0,
        };
    }

    let (predictions, invalid_predictions) = resolve_predictions(matches, ground_truth);
    if invalid_predictions > 0 {
        log::debug!("page {page_number}: skipped {invalid_predictions} predictions without a box");
    }

    PageScore {
        page_number,
        average_precision: average_precision(&predictions, ground_truth, iou_threshold),
        invalid_predictions,
    }
}
