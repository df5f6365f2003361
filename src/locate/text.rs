use once_cell::sync::Lazy;
use regex::Regex;
use strsim::normalized_levenshtein;

static NUMERIC_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.?\d*$").unwrap());

/// Lower-cases the sentence and splits it on any run of whitespace.
pub fn normalize_sentence(sentence: &str) -> Vec<String> {
    sentence
        .split_whitespace()
        .map(|word| word.to_lowercase())
        .collect()
}

pub fn is_numeric(word: &str) -> bool {
    NUMERIC_WORD.is_match(word)
}

pub fn word_similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b)
}

/// Compares an already lower-cased token word against a target word.
///
/// Numeric targets only match exactly; an OCR digit swap must not pass as the same amount.
pub fn words_match(token: &str, target: &str, similarity_threshold: f64) -> bool {
    if is_numeric(target) {
        token == target
    } else {
        word_similarity(token, target) > similarity_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalizes_whitespace_and_case() {
        assert_eq!(
            normalize_sentence("  Total\t\tAssets \n 2024 "),
            vec!["total", "assets", "2024"]
        );
        assert!(normalize_sentence(" \n\t ").is_empty());
    }

    #[test]
    fn detects_numeric_words() {
        assert!(is_numeric("270.7"));
        assert!(is_numeric("2024"));
        assert!(is_numeric("12."));
        assert!(!is_numeric(".5"));
        assert!(!is_numeric("1,000"));
        assert!(!is_numeric("1.2.3"));
        assert!(!is_numeric("v2"));
    }

    #[test]
    fn numeric_targets_never_fuzzy_match() {
        assert!(!words_match("27017", "270.7", 0.8));
        assert!(!words_match("270.1", "270.7", 0.8));
        assert!(words_match("270.7", "270.7", 0.8));
    }

    #[test]
    fn tolerates_single_character_typo() {
        assert!(words_match("assistence", "assistance", 0.8));
        assert!(!words_match("insurance", "assistance", 0.8));
    }
}
