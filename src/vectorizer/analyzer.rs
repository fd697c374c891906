use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::IndexConfig;
use crate::vectorizer::token::TokenFrequency;

/// Words of two or more word characters.
static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("valid token regex"));
static STOP_WORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

/// scikit-learn's `ENGLISH_STOP_WORDS` (Glasgow list, 318 words).
const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against",
    "all", "almost", "alone", "along", "already", "also", "although", "always",
    "am", "among", "amongst", "amoungst", "amount", "an", "and", "another",
    "any", "anyhow", "anyone", "anything", "anyway", "anywhere", "are",
    "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being",
    "below", "beside", "besides", "between", "beyond", "bill", "both",
    "bottom", "but", "by", "call", "can", "cannot", "cant", "co", "con",
    "could", "couldnt", "cry", "de", "describe", "detail", "do", "done",
    "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else",
    "elsewhere", "empty", "enough", "etc", "even", "ever", "every", "everyone",
    "everything", "everywhere", "except", "few", "fifteen", "fifty", "fill",
    "find", "fire", "first", "five", "for", "former", "formerly", "forty",
    "found", "four", "from", "front", "full", "further", "get", "give", "go",
    "had", "has", "hasnt", "have", "he", "hence", "her", "here", "hereafter",
    "hereby", "herein", "hereupon", "hers", "herself", "him", "himself", "his",
    "how", "however", "hundred", "i", "ie", "if", "in", "inc", "indeed",
    "interest", "into", "is", "it", "its", "itself", "keep", "last", "latter",
    "latterly", "least", "less", "ltd", "made", "many", "may", "me",
    "meanwhile", "might", "mill", "mine", "more", "moreover", "most", "mostly",
    "move", "much", "must", "my", "myself", "name", "namely", "neither",
    "never", "nevertheless", "next", "nine", "no", "nobody", "none", "noone",
    "nor", "not", "nothing", "now", "nowhere", "of", "off", "often", "on",
    "once", "one", "only", "onto", "or", "other", "others", "otherwise", "our",
    "ours", "ourselves", "out", "over", "own", "part", "per", "perhaps",
    "please", "put", "rather", "re", "same", "see", "seem", "seemed",
    "seeming", "seems", "serious", "several", "she", "should", "show", "side",
    "since", "sincere", "six", "sixty", "so", "some", "somehow", "someone",
    "something", "sometime", "sometimes", "somewhere", "still", "such",
    "system", "take", "ten", "than", "that", "the", "their", "them",
    "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "thick", "thin",
    "third", "this", "those", "though", "three", "through", "throughout",
    "thru", "thus", "to", "together", "too", "top", "toward", "towards",
    "twelve", "twenty", "two", "un", "under", "until", "up", "upon", "us",
    "very", "via", "was", "we", "well", "were", "what", "whatever", "when",
    "whence", "whenever", "where", "whereafter", "whereas", "whereby",
    "wherein", "whereupon", "wherever", "whether", "which", "while", "whither",
    "who", "whoever", "whole", "whom", "whose", "why", "will", "with",
    "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Text → term pipeline shared by fit and query transform.
///
/// lowercase → token regex → stop-word filter → word n-grams.
/// N-grams are built over the filtered token stream, so a bigram may span a
/// removed stop word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analyzer {
    /// Inclusive (min, max) n-gram lengths
    pub ngram_range: (usize, usize),
    pub stop_words: bool,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::from_config(&IndexConfig::default())
    }
}

impl Analyzer {
    pub fn from_config(config: &IndexConfig) -> Self {
        let (min_n, max_n) = config.ngram_range;
        let min_n = min_n.max(1);
        Self {
            ngram_range: (min_n, max_n.max(min_n)),
            stop_words: config.stop_words,
        }
    }

    /// Lowercased word tokens with stop words removed.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        TOKEN_RE
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|tok| !self.stop_words || !STOP_WORDS.contains(*tok))
            .map(str::to_string)
            .collect()
    }

    /// Every term of `text`, in n-gram order (all unigrams, then all bigrams, ...).
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let tokens = self.tokenize(text);
        let (min_n, max_n) = self.ngram_range;
        if max_n == 1 {
            return tokens;
        }

        let mut terms = Vec::new();
        for n in min_n..=max_n.min(tokens.len()) {
            if n == 1 {
                terms.extend(tokens.iter().cloned());
                continue;
            }
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }

    /// Term counts of one document.
    pub fn token_frequency(&self, text: &str) -> TokenFrequency {
        let mut freq = TokenFrequency::new();
        freq.add_tokens(&self.analyze(text));
        freq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_short_tokens_and_punctuation() {
        let analyzer = Analyzer { ngram_range: (1, 1), stop_words: false };
        assert_eq!(analyzer.tokenize("A GAN, x-ray 3d!"), vec!["gan", "ray", "3d"]);
    }

    #[test]
    fn stop_words_removed_before_ngrams() {
        let analyzer = Analyzer::default();
        let terms = analyzer.analyze("the training of deep networks");
        assert!(terms.contains(&"training".to_string()));
        assert!(terms.contains(&"deep networks".to_string()));
        assert!(!terms.iter().any(|t| t.split(' ').any(|w| w == "the" || w == "of")));
        // "of" is gone, so "training deep" is adjacent in the filtered stream
        assert!(terms.contains(&"training deep".to_string()));
    }

    #[test]
    fn academic_vocabulary_survives_stop_words() {
        let analyzer = Analyzer { ngram_range: (1, 1), stop_words: true };
        assert_eq!(
            analyzer.tokenize("the research of information and the problem test"),
            vec!["research", "information", "problem", "test"]
        );
        assert_eq!(STOP_WORDS.len(), 318);
    }

    #[test]
    fn unigrams_come_before_bigrams() {
        let analyzer = Analyzer { ngram_range: (1, 2), stop_words: false };
        assert_eq!(
            analyzer.analyze("graph neural nets"),
            vec!["graph", "neural", "nets", "graph neural", "neural nets"]
        );
        assert!(analyzer.analyze("").is_empty());
    }

    #[test]
    fn frequency_counts_repeats() {
        let analyzer = Analyzer { ngram_range: (1, 1), stop_words: true };
        let freq = analyzer.token_frequency("kernel kernel methods");
        assert_eq!(freq.token_count("kernel"), 2);
        assert_eq!(freq.token_count("methods"), 1);
    }
}
