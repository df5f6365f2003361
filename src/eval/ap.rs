use crate::core::geometry::Rect;
use crate::core::model::{GroundTruthBox, PredictionBox};

/// Single-class Average Precision for one page, 11-point interpolated.
///
/// Predictions are matched greedily in descending confidence order, each one claiming
/// the unmatched ground-truth box it overlaps most. A claim counts as a true positive
/// when that overlap reaches `iou_threshold`.
pub fn average_precision(
    predictions: &[PredictionBox],
    ground_truth: &[GroundTruthBox],
    iou_threshold: f64,
) -> f64 {
    if ground_truth.is_empty() {
        return if predictions.is_empty() { 1.0 } else { 0.0 };
    }

    let mut valid: Vec<&PredictionBox> = predictions
        .iter()
        .filter(|p| p.rect.is_valid() && !p.confidence.is_nan())
        .collect();
    if valid.is_empty() {
        return 0.0;
    }
    // stable, so equal confidences keep input order
    valid.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let truth: Vec<Rect> = ground_truth.iter().map(GroundTruthBox::absolute).collect();
    let predicted: Vec<Rect> = valid.iter().map(|p| p.rect).collect();
    let hits = assign_greedy(&predicted, &truth, iou_threshold);
    interpolated_precision(&precision_recall(&hits, truth.len()))
}

/// True-positive flag for each prediction, in the order given.
pub fn assign_greedy(predictions: &[Rect], truth: &[Rect], iou_threshold: f64) -> Vec<bool> {
    let mut claimed = vec![false; truth.len()];
    let mut hits = Vec::with_capacity(predictions.len());

    for pred in predictions {
        let mut best_idx = None;
        let mut best_iou = 0.0;
        for (idx, gt) in truth.iter().enumerate() {
            if claimed[idx] {
                continue;
            }
            let iou = pred.iou(gt);
            if iou > best_iou {
                best_iou = iou;
                best_idx = Some(idx);
            }
        }

        match best_idx {
            Some(idx) if best_iou >= iou_threshold => {
                claimed[idx] = true;
                hits.push(true);
            }
            _ => hits.push(false),
        }
    }
    hits
}

/// Cumulative `(precision, recall)` at each rank.
pub fn precision_recall(hits: &[bool], total_truth: usize) -> Vec<(f64, f64)> {
    let mut tp = 0usize;
    let mut fp = 0usize;
    hits.iter()
        .map(|&hit| {
            if hit {
                tp += 1;
            } else {
                fp += 1;
            }
            let precision = tp as f64 / (tp + fp) as f64;
            let recall = if total_truth == 0 {
                0.0
            } else {
                tp as f64 / total_truth as f64
            };
            (precision, recall)
        })
        .collect()
}

/// Mean over recall levels 0.0, 0.1, ..., 1.0 of the best precision reached at or
/// beyond that recall.
pub fn interpolated_precision(curve: &[(f64, f64)]) -> f64 {
    let total: f64 = (0..=10)
        .map(|step| {
            let level = step as f64 / 10.0;
            curve
                .iter()
                .filter(|(_, recall)| *recall >= level)
                .map(|(precision, _)| *precision)
                .fold(0.0, f64::max)
        })
        .sum();
    total / 11.0
}
