use crate::core::geometry::Rect;
use crate::core::model::Token;
use crate::locate::config::LocatorConfig;
use crate::locate::text::{normalize_sentence, words_match};

/// A token that survived confidence and region filtering.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub word: String,
    pub rect: Rect,
}

/// Keeps tokens above `min_confidence` (when given) that lie inside `region` (when given).
pub fn filter_tokens(
    tokens: &[Token],
    region: Option<&Rect>,
    min_confidence: Option<i32>,
) -> Vec<Candidate> {
    tokens
        .iter()
        .filter(|token| min_confidence.map_or(true, |min| token.confidence > min))
        .filter(|token| region.map_or(true, |r| r.contains(&token.rect)))
        .filter_map(|token| {
            let word = token.word.trim();
            if word.is_empty() {
                None
            } else {
                Some(Candidate {
                    word: word.to_lowercase(),
                    rect: token.rect,
                })
            }
        })
        .collect()
}

/// Finds every run of tokens that spells out `sentence`.
///
/// Returns one rectangle per distinct hit, in order of first appearance.
pub fn locate_sentence(
    tokens: &[Token],
    sentence: &str,
    region: Option<&Rect>,
    config: &LocatorConfig,
) -> Vec<Rect> {
    let words = normalize_sentence(sentence);
    if words.is_empty() {
        return Vec::new();
    }

    let candidates = filter_tokens(tokens, region, Some(config.min_confidence));
    log::debug!(
        "searching {} of {} tokens for {:?}",
        candidates.len(),
        tokens.len(),
        sentence
    );

    let mut boxes: Vec<Rect> = Vec::new();
    for start in 0..candidates.len() {
        if let Some(rect) = align_window(&words, &candidates[start..], config) {
            if !boxes.contains(&rect) {
                boxes.push(rect);
            }
        }
    }
    boxes
}

fn align_window(words: &[String], window: &[Candidate], config: &LocatorConfig) -> Option<Rect> {
    let mut matched: Vec<&Rect> = Vec::with_capacity(words.len());
    let mut word_idx = 0;

    for candidate in window {
        if word_idx >= words.len() {
            break;
        }
        if words_match(&candidate.word, &words[word_idx], config.similarity_threshold) {
            matched.push(&candidate.rect);
            word_idx += 1;
        } else if !matched.is_empty() {
            break;
        }
    }

    let (first, rest) = matched.split_first()?;
    if (matched.len() as f64) < config.min_word_coverage * words.len() as f64 {
        return None;
    }
    Some(rest.iter().fold(**first, |acc, rect| acc.union(rect)))
}
