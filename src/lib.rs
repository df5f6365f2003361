pub mod core;
pub mod eval;
pub mod export;
pub mod locate;
pub mod ocr;
pub mod pipeline;

pub use crate::core::geometry::{to_absolute, to_percentage, PercentBox, Rect};
pub use crate::core::model::{GroundTruthBox, Match, MatchBox, PageTokens, PredictionBox, Token};
pub use eval::{average_precision, evaluate_page, EvaluationReport};
pub use locate::{Highlighter, LocatorConfig};
