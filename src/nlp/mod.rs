// src/nlp/mod.rs
pub mod tagger;

pub use tagger::{LexiconTagger, PosTagger, TaggedToken};
