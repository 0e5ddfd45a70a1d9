// src/extractors/rounding.rs

// --- Imports ---
use crate::extractors::grammar::{ClauseGrammar, PhraseMatch};
use crate::nlp::TaggedToken;
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

// --- Constants ---
const ROUNDING_VERB: &str = "rounded";
const AMOUNT_WORD: &str = "Amount";
/// Words after the first direction searched for a second one ("rounded up and down").
const SECOND_DIRECTION_WINDOW: usize = 3;

static CURRENCY_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z]{3}$").expect("Failed to compile CURRENCY_CODE_RE")
});

// --- Data Structures ---

/// The two counterparties' amounts the clause governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Delivery,
    Return,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Delivery, Side::Return];

    /// Label the clause uses for this side.
    pub fn amount_type(&self) -> &'static str {
        match self {
            Side::Delivery => "Delivery Amount",
            Side::Return => "Return Amount",
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            Side::Delivery => "Delivery",
            Side::Return => "Return",
        }
    }

    fn index(&self) -> usize {
        match self {
            Side::Delivery => 0,
            Side::Return => 1,
        }
    }

    fn other(&self) -> Side {
        match self {
            Side::Delivery => Side::Return,
            Side::Return => Side::Delivery,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rounding {
    Up,
    Down,
    #[default]
    Nearest,
}

impl Rounding {
    fn from_direction(word: &str) -> Option<Self> {
        match word {
            "up" => Some(Rounding::Up),
            "down" => Some(Rounding::Down),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rounding::Up => "up",
            Rounding::Down => "down",
            Rounding::Nearest => "nearest",
        }
    }
}

impl fmt::Display for Rounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final terms for one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmountTerms {
    pub side: Side,
    pub amount_type: String,
    /// Three-letter currency code, empty when the clause did not state one.
    pub currency: String,
    /// Amount as written, e.g. "10,000"; empty when not stated.
    pub amount: String,
    pub rounding: Rounding,
}

impl AmountTerms {
    pub fn is_filled(&self) -> bool {
        !self.currency.is_empty() && !self.amount.is_empty()
    }
}

impl fmt::Display for AmountTerms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_filled() {
            write!(f, "{}: {} {}", self.amount_type, self.currency, self.amount)?;
        } else {
            write!(f, "{}: <missing>", self.amount_type)?;
        }
        match self.rounding {
            Rounding::Nearest => write!(f, " (rounded to nearest)"),
            dir => write!(f, " (rounded {})", dir),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    Complete,
    /// At least one side is missing its currency or amount.
    Partial,
}

/// The extracted Rounding clause: one entry per side, Delivery first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundingTerms {
    pub status: ExtractionStatus,
    pub terms: [AmountTerms; 2],
}

impl RoundingTerms {
    pub fn get(&self, side: Side) -> &AmountTerms {
        &self.terms[side.index()]
    }

    pub fn is_complete(&self) -> bool {
        self.status == ExtractionStatus::Complete
    }
}

impl fmt::Display for RoundingTerms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for side in Side::ALL {
            writeln!(f, "{}", self.get(side))?;
        }
        if !self.is_complete() {
            writeln!(f, "warning: extraction incomplete")?;
        }
        Ok(())
    }
}

// --- Field Helpers ---

/// Rounding directions stated in a span, as (first, second).
///
/// Only the first past participle is considered, and only "rounded up" or
/// "rounded down" counts. A second direction within a few words applies to the
/// second amount; otherwise the first applies to both.
fn find_roundings(words: &[&str], tags: &[&str]) -> Option<(Rounding, Rounding)> {
    let vbn = tags.iter().position(|t| *t == "VBN")?;
    if words[vbn] != ROUNDING_VERB {
        return None;
    }
    let first = Rounding::from_direction(words.get(vbn + 1)?)?;

    let window_end = words.len().min(vbn + 2 + SECOND_DIRECTION_WINDOW);
    let second = words
        .get(vbn + 2..window_end)
        .unwrap_or_default()
        .iter()
        .find_map(|w| Rounding::from_direction(w))
        .unwrap_or(first);

    Some((first, second))
}

/// (currency, amount) pairs in reading order: numerals directly after a currency code.
fn find_currency_amounts(words: &[&str], tags: &[&str]) -> Vec<(String, String)> {
    tags.iter()
        .enumerate()
        .filter(|(i, t)| **t == "CD" && *i > 0 && CURRENCY_CODE_RE.is_match(words[i - 1]))
        .map(|(i, _)| (words[i - 1].to_string(), words[i].to_string()))
        .collect()
}

// --- Accumulator ---

#[derive(Debug, Clone, Default, PartialEq)]
struct SideSlot {
    amount_type: Option<&'static str>,
    currency: Option<String>,
    amount: Option<String>,
    rounding: Option<Rounding>,
}

impl SideSlot {
    fn set_money(&mut self, (currency, amount): &(String, String)) {
        self.currency = Some(currency.clone());
        self.amount = Some(amount.clone());
    }
}

/// Field values gathered from the phrase matches of one section.
///
/// Built fresh for every extraction and filled in a single pass over the
/// matches; it is not meant to be shared between extractions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermsAccumulator {
    slots: [SideSlot; 2],
}

impl TermsAccumulator {
    fn slot_mut(&mut self, side: Side) -> &mut SideSlot {
        &mut self.slots[side.index()]
    }

    /// Applies a TOGETHER phrase. Returns true when it named both sides, in
    /// which case it replaces everything gathered so far and is final.
    fn apply_together(&mut self, words: &[&str], tags: &[&str]) -> bool {
        let delivery = words.iter().position(|w| *w == Side::Delivery.keyword());
        let ret = words.iter().position(|w| *w == Side::Return.keyword());
        let (Some(delivery), Some(ret)) = (delivery, ret) else {
            tracing::debug!("Discarding TOGETHER match without both sides: {:?}", words);
            return false;
        };
        if !words.contains(&AMOUNT_WORD) {
            tracing::debug!("Discarding TOGETHER match without '{}': {:?}", AMOUNT_WORD, words);
            return false;
        }

        // First-named side takes the first direction and amount
        let first = if delivery < ret { Side::Delivery } else { Side::Return };
        let order = [first, first.other()];

        let (r0, r1) = find_roundings(words, tags).unwrap_or((Rounding::Nearest, Rounding::Nearest));
        let money = find_currency_amounts(words, tags);

        self.slots = Default::default();
        for (slot_index, side) in order.iter().enumerate() {
            let slot = self.slot_mut(*side);
            slot.amount_type = Some(side.amount_type());
            slot.rounding = Some(if slot_index == 0 { r0 } else { r1 });
            // A single stated amount applies to both sides
            if let Some(pair) = money.get(slot_index).or_else(|| money.first()) {
                slot.set_money(pair);
            }
        }

        tracing::debug!("TOGETHER match resolved: {:?}", self.slots);
        true
    }

    /// Applies a SEPARATE phrase, which describes one side only.
    fn apply_separate(&mut self, words: &[&str], tags: &[&str]) {
        if !words.contains(&AMOUNT_WORD) {
            tracing::debug!("Discarding SEPARATE match without '{}': {:?}", AMOUNT_WORD, words);
            return;
        }
        let side = words.iter().find_map(|w| {
            Side::ALL.into_iter().find(|side| *w == side.keyword())
        });
        let Some(side) = side else {
            tracing::debug!("Discarding SEPARATE match without a side: {:?}", words);
            return;
        };

        if self.slots.iter().all(|s| s.amount_type.is_none()) {
            for side in Side::ALL {
                self.slot_mut(side).amount_type = Some(side.amount_type());
            }
        }

        let money = find_currency_amounts(words, tags);
        let rounding = find_roundings(words, tags).map(|(first, _)| first).unwrap_or_default();

        let slot = self.slot_mut(side);
        if slot.currency.is_some() {
            tracing::debug!("{:?} side already resolved, ignoring later SEPARATE match", side);
            return;
        }
        slot.rounding = Some(rounding);
        if let Some(pair) = money.first() {
            slot.set_money(pair);
        }
        tracing::debug!("SEPARATE match for {:?}: {:?}", side, slot);
    }

    /// Turns the gathered values into the final record.
    pub fn finish(self) -> Result<RoundingTerms, ExtractError> {
        if self.slots.iter().all(|s| s.amount_type.is_none()) {
            return Err(ExtractError::GrammarNoMatch(
                "no Delivery Amount or Return Amount phrase matched".to_string(),
            ));
        }

        let [delivery, ret] = self.slots;
        let terms = [(Side::Delivery, delivery), (Side::Return, ret)].map(|(side, slot)| AmountTerms {
            side,
            amount_type: slot.amount_type.unwrap_or(side.amount_type()).to_string(),
            currency: slot.currency.unwrap_or_default(),
            amount: slot.amount.unwrap_or_default(),
            rounding: slot.rounding.unwrap_or_default(),
        });

        let status = if terms.iter().all(AmountTerms::is_filled) {
            ExtractionStatus::Complete
        } else {
            tracing::warn!("Rounding clause only partially extracted");
            ExtractionStatus::Partial
        };

        Ok(RoundingTerms { status, terms })
    }
}

// --- Clause Extractor ---

/// Turns the tagged tokens of a located section into Rounding terms.
#[derive(Debug, Clone, Default)]
pub struct ClauseExtractor {
    grammar: ClauseGrammar,
}

impl ClauseExtractor {
    pub fn new() -> Self {
        Self { grammar: ClauseGrammar::new() }
    }

    /// Gathers field values from every phrase match. The first TOGETHER match
    /// naming both sides ends the scan; SEPARATE matches are all visited.
    pub fn collect(&self, tokens: &[TaggedToken]) -> TermsAccumulator {
        let mut acc = TermsAccumulator::default();

        for phrase in self.grammar.parse(tokens) {
            let span = &tokens[phrase.span().range()];
            let words: Vec<&str> = span.iter().map(|t| t.word.as_str()).collect();
            let tags: Vec<&str> = span.iter().map(|t| t.tag.as_str()).collect();

            match phrase {
                PhraseMatch::Together(_) => {
                    if acc.apply_together(&words, &tags) {
                        break;
                    }
                }
                PhraseMatch::Separate(_) => acc.apply_separate(&words, &tags),
            }
        }

        acc
    }

    pub fn extract(&self, tokens: &[TaggedToken]) -> Result<RoundingTerms, ExtractError> {
        self.collect(tokens).finish()
    }
}
