use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use card_scrub_types::{LineKey, PixelRect, WordBox};
use tracing::debug;

pub const DEFAULT_FUZZY_DISTANCE: u32 = 1;

/// How an OCR word is compared against a phrase token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    CaseInsensitive,
    Exact,
    /// Case-insensitive with a bounded Levenshtein distance per token.
    Fuzzy,
}

impl MatchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchMode::CaseInsensitive => "case-insensitive",
            MatchMode::Exact => "exact",
            MatchMode::Fuzzy => "fuzzy",
        }
    }

    pub fn available() -> Vec<MatchMode> {
        vec![MatchMode::CaseInsensitive, MatchMode::Exact, MatchMode::Fuzzy]
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchModeParseError(pub String);

impl fmt::Display for MatchModeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown match mode '{}'", self.0)
    }
}

impl std::error::Error for MatchModeParseError {}

impl FromStr for MatchMode {
    type Err = MatchModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "case-insensitive" | "case_insensitive" | "insensitive" => {
                Ok(MatchMode::CaseInsensitive)
            }
            "exact" => Ok(MatchMode::Exact),
            "fuzzy" => Ok(MatchMode::Fuzzy),
            other => Err(MatchModeParseError(other.to_string())),
        }
    }
}

/// A run of adjacent words on one line that spells out a configured phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRegion {
    /// Index of the phrase in the configured phrase list.
    pub phrase: usize,
    /// Indices into the word slice passed to [`PhraseMatcher::find`].
    pub words: Vec<usize>,
    pub rect: PixelRect,
}

#[derive(Debug, Clone)]
struct Phrase {
    index: usize,
    tokens: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    phrases: Vec<Phrase>,
    mode: MatchMode,
    fuzzy_distance: u32,
    min_confidence: Option<f32>,
}

impl PhraseMatcher {
    pub fn new(phrases: &[String], mode: MatchMode, fuzzy_distance: u32) -> Self {
        let phrases = phrases
            .iter()
            .enumerate()
            .filter_map(|(index, phrase)| {
                let tokens: Vec<String> = phrase
                    .split_whitespace()
                    .map(|token| match mode {
                        MatchMode::Exact => token.to_string(),
                        MatchMode::CaseInsensitive | MatchMode::Fuzzy => token.to_lowercase(),
                    })
                    .collect();
                (!tokens.is_empty()).then_some(Phrase { index, tokens })
            })
            .collect();
        Self {
            phrases,
            mode,
            fuzzy_distance,
            min_confidence: None,
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: Option<f32>) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Number of non-empty phrases this matcher looks for.
    pub fn phrase_count(&self) -> usize {
        self.phrases.len()
    }

    pub fn find(&self, words: &[WordBox]) -> Vec<MatchedRegion> {
        if self.phrases.is_empty() {
            return Vec::new();
        }
        let lines = self.group_lines(words);
        let normalized: Vec<String> = words
            .iter()
            .map(|word| match self.mode {
                MatchMode::Exact => word.text.trim().to_string(),
                MatchMode::CaseInsensitive | MatchMode::Fuzzy => word.text.trim().to_lowercase(),
            })
            .collect();

        for (key, members) in &lines {
            debug!(
                page = key.page,
                block = key.block,
                paragraph = key.paragraph,
                line = key.line,
                text = %join_text(words, members),
                "ocr line"
            );
        }

        let mut regions = Vec::new();
        for phrase in &self.phrases {
            let size = phrase.tokens.len();
            for (_, members) in &lines {
                if members.len() < size {
                    continue;
                }
                for window in members.windows(size) {
                    let matched = window
                        .iter()
                        .zip(&phrase.tokens)
                        .all(|(&word, token)| self.token_matches(&normalized[word], token));
                    if !matched {
                        continue;
                    }
                    let rect = window
                        .iter()
                        .map(|&word| words[word].rect)
                        .reduce(|acc, rect| acc.union(&rect))
                        .unwrap_or_default();
                    debug!(
                        phrase = phrase.index,
                        text = %join_text(words, window),
                        x = rect.x,
                        y = rect.y,
                        width = rect.width,
                        height = rect.height,
                        "matched phrase"
                    );
                    regions.push(MatchedRegion {
                        phrase: phrase.index,
                        words: window.to_vec(),
                        rect,
                    });
                }
            }
        }
        regions
    }

    fn group_lines(&self, words: &[WordBox]) -> Vec<(LineKey, Vec<usize>)> {
        let mut lines: Vec<(LineKey, Vec<usize>)> = Vec::new();
        let mut positions: HashMap<LineKey, usize> = HashMap::new();
        for (index, word) in words.iter().enumerate() {
            if word.text.trim().is_empty() {
                continue;
            }
            if let (Some(min), Some(confidence)) = (self.min_confidence, word.confidence)
                && confidence < min
            {
                continue;
            }
            let slot = *positions.entry(word.line).or_insert_with(|| {
                lines.push((word.line, Vec::new()));
                lines.len() - 1
            });
            lines[slot].1.push(index);
        }
        lines
    }

    fn token_matches(&self, word: &str, token: &str) -> bool {
        match self.mode {
            MatchMode::Exact | MatchMode::CaseInsensitive => word == token,
            MatchMode::Fuzzy if token.chars().count() < MIN_FUZZY_TOKEN_CHARS => word == token,
            MatchMode::Fuzzy => levenshtein(word, token) <= self.fuzzy_distance as usize,
        }
    }
}

/// Phrase tokens shorter than this match exactly even in fuzzy mode.
const MIN_FUZZY_TOKEN_CHARS: usize = 3;

fn join_text(words: &[WordBox], members: &[usize]) -> String {
    members
        .iter()
        .map(|&index| words[index].text.trim())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Character-level edit distance.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x: u32, line: u32) -> WordBox {
        WordBox::new(text, PixelRect::new(x, 100, 40, 12)).on_line(LineKey::new(1, 1, 1, line))
    }

    fn phrases(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn single_word_phrase_yields_one_region() {
        let words = vec![word("WATERMARK", 10, 1)];
        let matcher = PhraseMatcher::new(&phrases(&["WATERMARK"]), MatchMode::default(), 1);
        let regions = matcher.find(&words);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].rect, words[0].rect);
        assert_eq!(regions[0].words, vec![0]);
    }

    #[test]
    fn multi_word_phrase_spans_adjacent_boxes() {
        let words = vec![word("SET", 10, 1), word("ID", 60, 1), word("42", 110, 1)];
        let matcher = PhraseMatcher::new(&phrases(&["SET ID"]), MatchMode::default(), 1);
        let regions = matcher.find(&words);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].rect, PixelRect::new(10, 100, 90, 12));
        assert_eq!(regions[0].words, vec![0, 1]);
    }

    #[test]
    fn phrases_do_not_span_lines() {
        let words = vec![word("Not", 10, 1), word("for", 60, 2), word("sale", 110, 2)];
        let matcher = PhraseMatcher::new(&phrases(&["Not for sale"]), MatchMode::default(), 1);
        assert!(matcher.find(&words).is_empty());
    }

    #[test]
    fn case_policy_is_respected() {
        let words = vec![word("Proxy", 10, 1)];
        let insensitive = PhraseMatcher::new(&phrases(&["PROXY"]), MatchMode::CaseInsensitive, 1);
        assert_eq!(insensitive.find(&words).len(), 1);
        let exact = PhraseMatcher::new(&phrases(&["PROXY"]), MatchMode::Exact, 1);
        assert!(exact.find(&words).is_empty());
        let exact_hit = PhraseMatcher::new(&phrases(&["Proxy"]), MatchMode::Exact, 1);
        assert_eq!(exact_hit.find(&words).len(), 1);
    }

    #[test]
    fn short_tokens_are_never_fuzzy() {
        let words = vec![word("x", 10, 1), word("ID", 60, 1)];
        let matcher = PhraseMatcher::new(&phrases(&["e", "1D"]), MatchMode::Fuzzy, 1);
        assert!(matcher.find(&words).is_empty());

        let exact = PhraseMatcher::new(&phrases(&["X", "id"]), MatchMode::Fuzzy, 1);
        assert_eq!(exact.find(&words).len(), 2);
    }

    #[test]
    fn fuzzy_mode_tolerates_ocr_noise() {
        let words = vec![word("Pr0xy", 10, 1)];
        let fuzzy = PhraseMatcher::new(&phrases(&["proxy"]), MatchMode::Fuzzy, 1);
        assert_eq!(fuzzy.find(&words).len(), 1);
        let strict = PhraseMatcher::new(&phrases(&["proxy"]), MatchMode::Fuzzy, 0);
        assert!(strict.find(&words).is_empty());
    }

    #[test]
    fn every_phrase_and_window_is_reported() {
        let words = vec![
            word("Custom", 10, 1),
            word("Proxy", 60, 1),
            word("Proxy", 200, 2),
        ];
        let matcher =
            PhraseMatcher::new(&phrases(&["Custom Proxy", "Proxy"]), MatchMode::default(), 1);
        let regions = matcher.find(&words);
        assert_eq!(regions.len(), 3);
        assert_eq!(regions[0].phrase, 0);
        assert_eq!(regions[1].phrase, 1);
        assert_eq!(regions[1].words, vec![1]);
        assert_eq!(regions[2].words, vec![2]);
    }

    #[test]
    fn empty_phrases_are_ignored() {
        let words = vec![word("anything", 10, 1)];
        let matcher = PhraseMatcher::new(&phrases(&["", "   "]), MatchMode::default(), 1);
        assert_eq!(matcher.phrase_count(), 0);
        assert!(matcher.find(&words).is_empty());
    }

    #[test]
    fn low_confidence_words_are_skipped() {
        let words = vec![
            word("Proxy", 10, 1).with_confidence(20.0),
            word("Proxy", 80, 1).with_confidence(91.0),
            word("Proxy", 150, 1),
        ];
        let matcher = PhraseMatcher::new(&phrases(&["proxy"]), MatchMode::default(), 1)
            .with_min_confidence(Some(50.0));
        let regions = matcher.find(&words);
        let hits: Vec<usize> = regions.iter().map(|r| r.words[0]).collect();
        assert_eq!(hits, vec![1, 2]);
    }

    #[test]
    fn mode_names_parse() {
        for mode in MatchMode::available() {
            assert_eq!(mode.as_str().parse::<MatchMode>().unwrap(), mode);
        }
        assert!("regex".parse::<MatchMode>().is_err());
    }

    #[test]
    fn levenshtein_counts_edits() {
        assert_eq!(levenshtein("proxy", "proxy"), 0);
        assert_eq!(levenshtein("pr0xy", "proxy"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }
}
