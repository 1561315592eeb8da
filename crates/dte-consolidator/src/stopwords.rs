//! A small, fixed stop-word list for theme token extraction. Not meant
//! to be exhaustive, only enough to keep common function words from
//! dominating frequency counts.

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "if", "of", "to", "in", "on", "for", "with", "is",
    "are", "was", "were", "be", "been", "being", "it", "its", "this", "that", "these", "those",
    "i", "me", "my", "we", "our", "you", "your", "he", "she", "they", "them", "at", "as", "by",
    "from", "about", "into", "than", "then", "so", "not", "no", "do", "does", "did", "has",
    "have", "had", "will", "would", "can", "could", "should", "may", "might", "just", "there",
];

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Lowercases and splits on non-alphanumeric boundaries, dropping
/// stop-words and single-character tokens.
pub fn tokenize(content: &str) -> Vec<String> {
    content
        .split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() > 1 && !is_stopword(w))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_drops_stopwords_and_punctuation() {
        let tokens = tokenize("The quick fox jumps, and it runs.");
        assert_eq!(tokens, vec!["quick", "fox", "jumps", "runs"]);
    }
}
