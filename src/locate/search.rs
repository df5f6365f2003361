use crate::core::geometry::Rect;
use crate::core::model::Token;
use crate::locate::text::normalize_sentence;
use crate::locate::window::filter_tokens;

/// Exact, case-insensitive phrase search over a text layer.
///
/// Text-layer words carry no recognition noise, so neither confidence filtering nor
/// fuzzy comparison applies. Every occurrence is reported once.
pub fn search_sentence(tokens: &[Token], sentence: &str, region: Option<&Rect>) -> Vec<Rect> {
    let words = normalize_sentence(sentence);
    if words.is_empty() {
        return Vec::new();
    }

    let candidates = filter_tokens(tokens, region, None);
    let mut boxes: Vec<Rect> = Vec::new();
    for window in candidates.windows(words.len()) {
        let hit = window
            .iter()
            .zip(&words)
            .all(|(candidate, word)| candidate.word == *word);
        if !hit {
            continue;
        }
        let rect = window[1..]
            .iter()
            .fold(window[0].rect, |acc, c| acc.union(&c.rect));
        if !boxes.contains(&rect) {
            boxes.push(rect);
        }
    }
    boxes
}
