// src/extractors/grammar.rs
//! Shallow tag-level grammar for the two phrasings of the Rounding clause.
//!
//! A [`TagPattern`] is a small regular expression over part-of-speech tags,
//! built from Rust values and evaluated by a backtracking matcher with the
//! usual leftmost-first priority: greedy repetitions try the longest run
//! first, lazy ones the shortest, optional groups try to match before
//! skipping.

use crate::nlp::TaggedToken;
use std::ops::Range;

// --- Pattern Language ---

#[derive(Debug, Clone)]
pub enum TagPattern {
    /// Exactly this tag.
    Tag(&'static str),
    /// Any single tag.
    Any,
    Seq(Vec<TagPattern>),
    /// First alternative that lets the rest of the pattern match wins.
    Alt(Vec<TagPattern>),
    Repeat {
        inner: Box<TagPattern>,
        min: usize,
        max: usize,
        greedy: bool,
    },
}

fn tag(t: &'static str) -> TagPattern {
    TagPattern::Tag(t)
}

fn any() -> TagPattern {
    TagPattern::Any
}

fn seq(items: Vec<TagPattern>) -> TagPattern {
    TagPattern::Seq(items)
}

fn alt(options: Vec<TagPattern>) -> TagPattern {
    TagPattern::Alt(options)
}

fn repeat(inner: TagPattern, min: usize, max: usize) -> TagPattern {
    TagPattern::Repeat { inner: Box::new(inner), min, max, greedy: true }
}

fn repeat_lazy(inner: TagPattern, min: usize, max: usize) -> TagPattern {
    TagPattern::Repeat { inner: Box::new(inner), min, max, greedy: false }
}

fn optional(inner: TagPattern) -> TagPattern {
    repeat(inner, 0, 1)
}

impl TagPattern {
    /// Tries to match at `pos`, calling `k` with each candidate end position
    /// in priority order until `k` accepts one.
    fn match_at(&self, tags: &[&str], pos: usize, k: &mut dyn FnMut(usize) -> bool) -> bool {
        match self {
            TagPattern::Tag(expected) => pos < tags.len() && tags[pos] == *expected && k(pos + 1),
            TagPattern::Any => pos < tags.len() && k(pos + 1),
            TagPattern::Seq(items) => match_seq(items, tags, pos, k),
            TagPattern::Alt(options) => {
                for option in options {
                    if option.match_at(tags, pos, k) {
                        return true;
                    }
                }
                false
            }
            TagPattern::Repeat { inner, min, max, greedy } => {
                match_repeat(inner, *min, *max, *greedy, tags, pos, 0, k)
            }
        }
    }

    /// End of the highest-priority match starting exactly at `start`.
    pub fn match_prefix(&self, tags: &[&str], start: usize) -> Option<usize> {
        let mut end = None;
        self.match_at(tags, start, &mut |e| {
            end = Some(e);
            true
        });
        end
    }

    /// Leftmost non-overlapping matches inside `tags`, scanning left to right.
    pub fn find_all(&self, tags: &[&str]) -> Vec<Range<usize>> {
        let mut found = Vec::new();
        let mut start = 0;
        while start < tags.len() {
            match self.match_prefix(tags, start) {
                Some(end) if end > start => {
                    found.push(start..end);
                    start = end;
                }
                _ => start += 1,
            }
        }
        found
    }
}

fn match_seq(items: &[TagPattern], tags: &[&str], pos: usize, k: &mut dyn FnMut(usize) -> bool) -> bool {
    match items.split_first() {
        None => k(pos),
        Some((first, rest)) => first.match_at(tags, pos, &mut |next| match_seq(rest, tags, next, k)),
    }
}

// Repetition bounds are always finite, so the recursion terminates even for empty bodies
#[allow(clippy::too_many_arguments)]
fn match_repeat(
    inner: &TagPattern,
    min: usize,
    max: usize,
    greedy: bool,
    tags: &[&str],
    pos: usize,
    count: usize,
    k: &mut dyn FnMut(usize) -> bool,
) -> bool {
    let can_stop = count >= min;
    let can_continue = count < max;

    if greedy {
        if can_continue
            && inner.match_at(tags, pos, &mut |next| {
                match_repeat(inner, min, max, greedy, tags, next, count + 1, k)
            })
        {
            return true;
        }
        can_stop && k(pos)
    } else {
        if can_stop && k(pos) {
            return true;
        }
        can_continue
            && inner.match_at(tags, pos, &mut |next| {
                match_repeat(inner, min, max, greedy, tags, next, count + 1, k)
            })
    }
}

// --- Clause Grammar ---

/// Token span `[start, end)` within the tagged section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for Span {
    fn from(r: Range<usize>) -> Self {
        Self { start: r.start, end: r.end }
    }
}

/// A labelled phrase found in the tagged section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseMatch {
    /// Both amounts described in one phrase, joined by a conjunction.
    Together(Span),
    /// One amount described on its own.
    Separate(Span),
}

impl PhraseMatch {
    pub fn span(&self) -> Span {
        match self {
            PhraseMatch::Together(span) | PhraseMatch::Separate(span) => *span,
        }
    }
}

/// Finds TOGETHER and SEPARATE phrases in a tagged token sequence.
#[derive(Debug, Clone)]
pub struct ClauseGrammar {
    together: TagPattern,
    separate: TagPattern,
}

fn direction() -> TagPattern {
    alt(vec![tag("RP"), tag("RB")])
}

// "the Delivery Amount"
fn amount_name() -> TagPattern {
    seq(vec![optional(tag("DT")), repeat(tag("NNP"), 2, 2)])
}

// "USD 100", optionally followed closely by "EUR 200"
fn currency_amounts() -> TagPattern {
    seq(vec![
        tag("NNP"),
        tag("CD"),
        optional(seq(vec![repeat_lazy(any(), 0, 4), tag("NNP"), tag("CD")])),
    ])
}

/// `<DT>?<NNP>{2} <.>{0,10} <CC> <.>{0,10} <DT>?<NNP>{2} <.>{0,5}?
///  (<VBN>(<RP>|<RB>)(<.>{0,2}(<RP>|<RB>)?))? <.>{0,10} <NNP><CD> (<.>{0,4}?<NNP><CD>)?`
fn together_pattern() -> TagPattern {
    seq(vec![
        amount_name(),
        repeat(any(), 0, 10),
        tag("CC"),
        repeat(any(), 0, 10),
        amount_name(),
        repeat_lazy(any(), 0, 5),
        optional(seq(vec![
            tag("VBN"),
            direction(),
            seq(vec![repeat(any(), 0, 2), optional(direction())]),
        ])),
        repeat(any(), 0, 10),
        currency_amounts(),
    ])
}

/// `<DT>?<NNP>{2} <.>{0,10}? (<VBN>(<RP>|<RB>))? <.>{0,10}? <NNP><CD> (<.>{0,4}?<NNP><CD>)?`
fn separate_pattern() -> TagPattern {
    seq(vec![
        amount_name(),
        repeat_lazy(any(), 0, 10),
        optional(seq(vec![tag("VBN"), direction()])),
        repeat_lazy(any(), 0, 10),
        currency_amounts(),
    ])
}

impl ClauseGrammar {
    pub fn new() -> Self {
        Self { together: together_pattern(), separate: separate_pattern() }
    }

    /// Chunks the tokens: TOGETHER phrases first, then SEPARATE phrases in the
    /// gaps between them. Matches come back in document order.
    pub fn parse(&self, tokens: &[TaggedToken]) -> Vec<PhraseMatch> {
        let tags: Vec<&str> = tokens.iter().map(|t| t.tag.as_str()).collect();

        let together: Vec<Span> = self.together.find_all(&tags).into_iter().map(Span::from).collect();

        let mut matches: Vec<PhraseMatch> = together.iter().copied().map(PhraseMatch::Together).collect();

        let mut gap_start = 0;
        let gap_ends = together.iter().map(|s| (s.start, s.end)).chain(std::iter::once((tags.len(), tags.len())));
        for (gap_end, next_start) in gap_ends {
            let gap = &tags[gap_start..gap_end];
            for range in self.separate.find_all(gap) {
                matches.push(PhraseMatch::Separate(Span {
                    start: gap_start + range.start,
                    end: gap_start + range.end,
                }));
            }
            gap_start = next_start;
        }

        matches.sort_by_key(|m| m.span().start);
        tracing::debug!("Grammar found {} phrase matches: {:?}", matches.len(), matches);
        matches
    }
}

impl Default for ClauseGrammar {
    fn default() -> Self {
        Self::new()
    }
}
