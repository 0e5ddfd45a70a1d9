// src/document/mod.rs
pub mod loader;

pub use loader::load_pages;
