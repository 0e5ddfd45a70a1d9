// src/extractors/mod.rs
pub mod grammar;
pub mod pipeline;
pub mod rounding;
pub mod section;

// Re-export key extraction types for convenience
pub use pipeline::RoundingExtractor;
pub use rounding::RoundingTerms;
pub use section::SearchConfig;
