pub mod config;
pub mod search;
pub mod text;
pub mod window;

use crate::core::geometry::Rect;
use crate::core::model::{Match, PageTokens, Token};

pub use config::LocatorConfig;

/// Sentence localization back end, chosen by the caller.
#[derive(Debug, Clone)]
pub enum Highlighter {
    /// Fuzzy alignment over noisy OCR tokens.
    Ocr(LocatorConfig),
    /// Exact phrase search over a native text layer.
    Search,
}

impl Highlighter {
    pub fn ocr(config: LocatorConfig) -> Self {
        Highlighter::Ocr(config)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Highlighter::Ocr(_) => "ocr",
            Highlighter::Search => "search",
        }
    }

    /// Absolute rectangles of every place `sentence` appears among `tokens`.
    pub fn locate(&self, tokens: &[Token], sentence: &str, region: Option<&Rect>) -> Vec<Rect> {
        match self {
            Highlighter::Ocr(config) => window::locate_sentence(tokens, sentence, region, config),
            Highlighter::Search => search::search_sentence(tokens, sentence, region),
        }
    }

    /// Locates each sentence on a page and reports percentage boxes.
    ///
    /// Every sentence yields at least one entry; a sentence that was not found gets an
    /// empty box.
    pub fn highlight(
        &self,
        page: &PageTokens,
        sentences: &[String],
        region: Option<&Rect>,
    ) -> Vec<Match> {
        let mut matches = Vec::with_capacity(sentences.len());
        for sentence in sentences {
            let boxes = self.locate(&page.tokens, sentence, region);
            if boxes.is_empty() {
                matches.push(Match::not_found(sentence));
                continue;
            }
            matches.extend(
                boxes
                    .iter()
                    .map(|rect| Match::found(sentence, rect, page.width, page.height)),
            );
        }
        matches
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Highlighter::Ocr(LocatorConfig::default())
    }
}
