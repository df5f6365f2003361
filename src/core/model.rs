use serde::{Deserialize, Serialize};

use crate::core::geometry::{to_absolute, to_percentage, PercentBox, Rect};

/// One recognized word on a page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    pub word: String,
    pub rect: Rect,
    pub confidence: i32,
}

impl Token {
    pub fn new(word: impl Into<String>, rect: Rect, confidence: i32) -> Self {
        Self {
            word: word.into(),
            rect,
            confidence,
        }
    }
}

/// All tokens of one page, in absolute page units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageTokens {
    pub width: f64,
    pub height: f64,
    pub tokens: Vec<Token>,
}

/// Location attached to a sentence.
///
/// On the wire this is `{}` when nothing was found, `{x, y, width, height}` for a
/// percentage box, or `[left, top, right, bottom]` for absolute corners. Anything else
/// deserializes to `Invalid` so a single bad entry never aborts a page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(from = "RawBox", into = "RawBox")]
pub enum MatchBox {
    Empty,
    Percent(PercentBox),
    Absolute(Rect),
    Invalid,
}

// Corners first: the derived PercentBox would also accept a four-element array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawBox {
    Corners([f64; 4]),
    Percent(PercentBox),
    Other(serde_json::Value),
}

impl From<RawBox> for MatchBox {
    fn from(raw: RawBox) -> Self {
        match raw {
            RawBox::Percent(p) => MatchBox::Percent(p),
            RawBox::Corners([left, top, right, bottom]) => {
                MatchBox::Absolute(Rect::new(left, top, right, bottom))
            }
            RawBox::Other(serde_json::Value::Null) => MatchBox::Empty,
            RawBox::Other(serde_json::Value::Object(map)) if map.is_empty() => MatchBox::Empty,
            RawBox::Other(_) => MatchBox::Invalid,
        }
    }
}

impl From<MatchBox> for RawBox {
    fn from(b: MatchBox) -> Self {
        match b {
            MatchBox::Percent(p) => RawBox::Percent(p),
            MatchBox::Absolute(r) => RawBox::Corners([r.left, r.top, r.right, r.bottom]),
            MatchBox::Empty | MatchBox::Invalid => {
                RawBox::Other(serde_json::Value::Object(Default::default()))
            }
        }
    }
}

impl MatchBox {
    pub fn is_empty(&self) -> bool {
        matches!(self, MatchBox::Empty)
    }

    /// Absolute rectangle for this box, or `None` if there is nothing scorable.
    pub fn resolve(&self, page_width: f64, page_height: f64) -> Option<Rect> {
        let rect = match self {
            MatchBox::Percent(p) => to_absolute(p, page_width, page_height),
            MatchBox::Absolute(r) => *r,
            MatchBox::Empty | MatchBox::Invalid => return None,
        };
        rect.is_valid().then_some(rect)
    }
}

/// A queried sentence and where it was found.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Match {
    pub sentence: String,
    #[serde(default = "missing_box")]
    pub bbox: MatchBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

fn missing_box() -> MatchBox {
    MatchBox::Invalid
}

impl Match {
    pub fn found(sentence: &str, rect: &Rect, page_width: f64, page_height: f64) -> Self {
        Self {
            sentence: sentence.to_string(),
            bbox: MatchBox::Percent(to_percentage(rect, page_width, page_height)),
            confidence: None,
        }
    }

    pub fn not_found(sentence: &str) -> Self {
        Self {
            sentence: sentence.to_string(),
            bbox: MatchBox::Empty,
            confidence: None,
        }
    }
}

/// Hand-labeled sentence location, in percentage space.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroundTruthBox {
    pub text: String,
    #[serde(rename = "bbox")]
    pub rect: PercentBox,
    #[serde(rename = "original_width")]
    pub page_width: f64,
    #[serde(rename = "original_height")]
    pub page_height: f64,
}

impl GroundTruthBox {
    pub fn absolute(&self) -> Rect {
        to_absolute(&self.rect, self.page_width, self.page_height)
    }
}

/// Predicted sentence location, in absolute page units.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionBox {
    pub sentence: String,
    pub rect: Rect,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PageScore {
    pub page_number: u32,
    pub average_precision: f64,
    #[serde(default)]
    pub invalid_predictions: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AggregateScore {
    pub mean_average_precision: f64,
    pub page_count: usize,
}

impl AggregateScore {
    pub fn from_pages(pages: &[PageScore]) -> Self {
        let page_count = pages.len();
        let mean_average_precision = if page_count == 0 {
            0.0
        } else {
            pages.iter().map(|p| p.average_precision).sum::<f64>() / page_count as f64
        };
        Self {
            mean_average_precision,
            page_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn match_box_wire_shapes() {
        let empty: Match = serde_json::from_str(r#"{"sentence":"a","bbox":{}}"#).unwrap();
        assert_eq!(empty.bbox, MatchBox::Empty);

        let pct: Match = serde_json::from_str(
            r#"{"sentence":"a","bbox":{"x":1.0,"y":2.0,"width":3.0,"height":4.0},"confidence":0.4}"#,
        )
        .unwrap();
        assert_eq!(
            pct.bbox,
            MatchBox::Percent(PercentBox { x: 1.0, y: 2.0, width: 3.0, height: 4.0 })
        );
        assert_eq!(pct.confidence, Some(0.4));

        let abs: Match = serde_json::from_str(r#"{"sentence":"a","bbox":[1,2,3,4]}"#).unwrap();
        assert_eq!(abs.bbox, MatchBox::Absolute(Rect::new(1.0, 2.0, 3.0, 4.0)));

        let corners: MatchBox = serde_json::from_str("[306, 396, 367.2, 475.2]").unwrap();
        assert_eq!(
            corners.resolve(612.0, 792.0),
            Some(Rect::new(306.0, 396.0, 367.2, 475.2))
        );

        let short: MatchBox = serde_json::from_str("[0, 0, 5]").unwrap();
        assert_eq!(short, MatchBox::Invalid);

        let partial: Match =
            serde_json::from_str(r#"{"sentence":"a","bbox":{"x":1.0,"y":2.0}}"#).unwrap();
        assert_eq!(partial.bbox, MatchBox::Invalid);

        let text: Match = serde_json::from_str(r#"{"sentence":"a","bbox":"nope"}"#).unwrap();
        assert_eq!(text.bbox, MatchBox::Invalid);

        let missing: Match = serde_json::from_str(r#"{"sentence":"a"}"#).unwrap();
        assert_eq!(missing.bbox, MatchBox::Invalid);
    }

    #[test]
    fn not_found_serializes_as_empty_object() {
        let json = serde_json::to_string(&Match::not_found("Revenue")).unwrap();
        assert_eq!(json, r#"{"sentence":"Revenue","bbox":{}}"#);
    }

    #[test]
    fn resolve_rejects_unusable_boxes() {
        assert_eq!(MatchBox::Empty.resolve(100.0, 100.0), None);
        assert_eq!(MatchBox::Invalid.resolve(100.0, 100.0), None);
        let inverted = MatchBox::Absolute(Rect::new(10.0, 10.0, 5.0, 20.0));
        assert_eq!(inverted.resolve(100.0, 100.0), None);
        let pct = MatchBox::Percent(PercentBox { x: 10.0, y: 20.0, width: 5.0, height: 5.0 });
        assert_eq!(pct.resolve(200.0, 100.0), Some(Rect::new(20.0, 20.0, 30.0, 25.0)));
    }

    #[test]
    fn aggregate_of_no_pages_is_zero() {
        assert_eq!(
            AggregateScore::from_pages(&[]),
            AggregateScore { mean_average_precision: 0.0, page_count: 0 }
        );
    }
}
