// src/nlp/tagger.rs
use once_cell::sync::Lazy;
use regex::Regex;

// --- Regex Patterns (Lazy Static) ---
// Words with internal apostrophes, numbers with grouping/decimals, or any single other symbol
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z]+(?:['’][A-Za-z]+)*|\d+(?:[.,]\d+)*|\S")
        .expect("Failed to compile TOKEN_RE")
});

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+(?:[.,]\d+)*$").expect("Failed to compile NUMBER_RE")
});

/// A word paired with its Penn Treebank part-of-speech tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub word: String,
    pub tag: String,
}

impl TaggedToken {
    pub fn new(word: impl Into<String>, tag: impl Into<String>) -> Self {
        Self { word: word.into(), tag: tag.into() }
    }
}

/// Anything that can turn a text span into ordered (word, tag) pairs.
///
/// Implementations must use Penn Treebank tags for at least `NNP`, `CD`,
/// `VBN`, `RP`, `RB`, `CC`, `DT` and `,`.
pub trait PosTagger {
    fn tag(&self, text: &str) -> Vec<TaggedToken>;
}

/// Splits text into word, number and punctuation tokens.
pub fn tokenize(text: &str) -> Vec<&str> {
    TOKEN_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// Heuristic Penn Treebank tagger built from a closed-class lexicon and
/// word-shape rules. Good enough for contractual prose; swap in a
/// statistical tagger through [`PosTagger`] for anything broader.
#[derive(Debug, Default, Clone)]
pub struct LexiconTagger;

impl LexiconTagger {
    pub fn new() -> Self { Self }

    fn tag_word(word: &str, prev_tag: Option<&str>) -> &'static str {
        if NUMBER_RE.is_match(word) {
            return "CD";
        }
        if let Some(tag) = punctuation_tag(word) {
            return tag;
        }

        let lower = word.to_lowercase();
        if let Some(tag) = closed_class_tag(&lower) {
            return tag;
        }

        if lower == "up" || lower == "down" {
            // Particle when it completes a verb ("rounded up"), adverb otherwise
            return match prev_tag {
                Some(tag) if tag.starts_with("VB") => "RP",
                _ => "RB",
            };
        }

        if word.chars().next().is_some_and(char::is_uppercase) {
            return "NNP";
        }

        if lower.ends_with("ly") {
            "RB"
        } else if lower.ends_with("ing") {
            "VBG"
        } else if lower.ends_with("ed") {
            "VBN"
        } else if lower.ends_with('s') && !lower.ends_with("ss") {
            "NNS"
        } else {
            "NN"
        }
    }
}

impl PosTagger for LexiconTagger {
    fn tag(&self, text: &str) -> Vec<TaggedToken> {
        let mut tagged: Vec<TaggedToken> = Vec::new();
        for word in tokenize(text) {
            let prev_tag = tagged.last().map(|t| t.tag.as_str());
            let tag = Self::tag_word(word, prev_tag);
            tagged.push(TaggedToken::new(word, tag));
        }
        tracing::trace!("Tagged {} tokens", tagged.len());
        tagged
    }
}

fn punctuation_tag(word: &str) -> Option<&'static str> {
    let tag = match word {
        "," => ",",
        "." | "!" | "?" => ".",
        ":" | ";" | "-" | "–" | "—" => ":",
        "(" | "[" | "{" => "(",
        ")" | "]" | "}" => ")",
        "\"" | "'" | "“" | "”" | "‘" | "’" => "''",
        "$" | "€" | "£" | "¥" => "$",
        "%" => "NN",
        "#" => "#",
        _ if word.chars().all(|c| !c.is_alphanumeric()) => "SYM",
        _ => return None,
    };
    Some(tag)
}

fn closed_class_tag(lower: &str) -> Option<&'static str> {
    let tag = match lower {
        "the" | "a" | "an" | "each" | "any" | "this" | "that" | "these" | "those" | "such"
        | "all" | "no" | "every" | "either" | "neither" | "another" => "DT",
        "and" | "or" | "but" | "nor" | "plus" => "CC",
        "of" | "in" | "on" | "at" | "for" | "by" | "with" | "from" | "than" | "as" | "into"
        | "under" | "upon" | "if" | "per" | "within" | "whether" | "because" | "after"
        | "before" | "between" | "over" | "pursuant" => "IN",
        "to" => "TO",
        "shall" | "will" | "may" | "must" | "would" | "should" | "can" | "could" => "MD",
        "be" | "have" => "VB",
        "is" | "has" => "VBZ",
        "are" => "VBP",
        "was" | "were" | "had" => "VBD",
        "been" => "VBN",
        "being" => "VBG",
        "it" | "they" | "its" | "their" | "we" | "you" | "he" | "she" => "PRP",
        "not" | "respectively" | "then" | "also" => "RB",
        "which" | "who" => "WDT",
        _ => return None,
    };
    Some(tag)
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    fn tags(text: &str) -> Vec<(String, String)> {
        LexiconTagger::new()
            .tag(text)
            .into_iter()
            .map(|t| (t.word, t.tag))
            .collect()
    }

    #[test]
    fn test_tokenize_keeps_grouped_numbers() {
        assert_eq!(
            tokenize("USD 1,000,000.00, rounded up."),
            vec!["USD", "1,000,000.00", ",", "rounded", "up", "."]
        );
    }

    #[test]
    fn test_tokenize_splits_glued_currency() {
        assert_eq!(tokenize("EUR500"), vec!["EUR", "500"]);
    }

    #[test]
    fn test_tags_rounding_clause() {
        let tagged = tags("The Delivery Amount and the Return Amount, rounded up, shall each be USD 100.");
        let expected = [
            ("The", "DT"), ("Delivery", "NNP"), ("Amount", "NNP"), ("and", "CC"),
            ("the", "DT"), ("Return", "NNP"), ("Amount", "NNP"), (",", ","),
            ("rounded", "VBN"), ("up", "RP"), (",", ","), ("shall", "MD"),
            ("each", "DT"), ("be", "VB"), ("USD", "NNP"), ("100", "CD"), (".", "."),
        ];
        let expected: Vec<(String, String)> = expected
            .iter()
            .map(|(w, t)| (w.to_string(), t.to_string()))
            .collect();
        assert_eq!(tagged, expected);
    }

    #[test]
    fn test_up_without_verb_is_adverb() {
        let tagged = tags("up and down");
        assert_eq!(tagged[0].1, "RB");
        assert_eq!(tagged[2].1, "RB");
    }
}
