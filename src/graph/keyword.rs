//! Anchor keyword selection for graph lookups
//!
//! A query is reduced to one lowercase word: punctuation is stripped, stop
//! words are dropped and the longest remaining word wins (first one on ties).

pub const STOP_WORDS: [&str; 8] = ["what", "is", "the", "of", "in", "a", "an", "to"];

pub const DEFAULT_FALLBACK_KEYWORD: &str = "transformer";

/// Keep word characters (alphanumeric or `_`) and whitespace, drop the rest
pub fn strip_punctuation(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect()
}

pub fn significant_words(query: &str) -> Vec<String> {
    strip_punctuation(query)
        .to_lowercase()
        .split_whitespace()
        .filter(|word| !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect()
}

pub fn extract_keyword(query: &str, fallback: &str) -> String {
    significant_words(query)
        .into_iter()
        .reduce(|best, word| {
            if word.chars().count() > best.chars().count() {
                word
            } else {
                best
            }
        })
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_significant_word() {
        assert_eq!(extract_keyword("What is the attention mechanism?", "x"), "attention");
        assert_eq!(extract_keyword("Explain positional encodings", "x"), "positional");
    }

    #[test]
    fn test_punctuation_and_case_are_normalised() {
        assert_eq!(extract_keyword("Who wrote \"BERT-Large\"?!", "x"), "bertlarge");
        assert_eq!(extract_keyword("GPU's throughput", "x"), "throughput");
        assert_eq!(extract_keyword("self_attention, please", "x"), "self_attention");
    }

    #[test]
    fn test_first_word_wins_ties() {
        assert_eq!(extract_keyword("cats dogs", "x"), "cats");
        assert_eq!(extract_keyword("alpha gamma delta", "x"), "alpha");
    }

    #[test]
    fn test_stop_words_only_uses_fallback() {
        assert_eq!(extract_keyword("What is the?", DEFAULT_FALLBACK_KEYWORD), "transformer");
        assert_eq!(extract_keyword("", DEFAULT_FALLBACK_KEYWORD), "transformer");
        assert_eq!(extract_keyword("?!...", "custom"), "custom");
    }

    #[test]
    fn test_stop_words_are_matched_after_normalisation() {
        // "The" and "IS," collapse to stop words once cleaned
        assert_eq!(significant_words("The encoder IS, a stack"), vec!["encoder", "stack"]);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // "größe" is 5 chars but 7 bytes
        assert_eq!(extract_keyword("größe layers", "x"), "layers");
        assert_eq!(extract_keyword("Überblick layer", "x"), "überblick");
    }

    #[test]
    fn test_digits_are_kept() {
        assert_eq!(extract_keyword("What is GPT-4?", "x"), "gpt4");
    }
}
