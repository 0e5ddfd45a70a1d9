// src/main.rs
mod document;
mod extractors;
mod nlp;
mod storage;
mod utils;

use clap::Parser;
use extractors::{RoundingExtractor, RoundingTerms, SearchConfig};
use nlp::LexiconTagger;
use std::path::PathBuf;
use storage::StorageManager;
use utils::AppError;

/// Extracts the Rounding terms for the Delivery Amount and Return Amount from a collateral agreement
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the agreement (PDF, or text with form-feed page breaks)
    document: PathBuf,

    /// Where in the document to start looking, as a fraction of the page count
    #[arg(long, default_value = "0.75")]
    start_quantile: f64,

    /// Print the extracted terms as JSON
    #[arg(long)]
    json: bool,

    /// Also save the extracted terms as JSON into this directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Log every page visit and phrase match (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn search_config(&self) -> Result<SearchConfig, AppError> {
        if !(0.0..=1.0).contains(&self.start_quantile) {
            return Err(AppError::Config(format!(
                "--start-quantile must be between 0 and 1, got {}",
                self.start_quantile
            )));
        }
        Ok(SearchConfig { start_quantile: self.start_quantile })
    }
}

fn main() {
    // 1. Parse CLI Arguments (prints usage and exits non-zero if the path is missing)
    let args = Args::parse();

    // 2. Setup Logging (RUST_LOG overrides the flag)
    utils::logging::setup_logging(if args.verbose { "debug" } else { "info" });
    tracing::debug!("Starting processing for args: {:?}", args);

    if let Err(e) = run(&args) {
        tracing::debug!("Processing failed: {:?}", e);
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), AppError> {
    let config = args.search_config()?;

    // 3. Read the document into pages
    let pages = document::load_pages(&args.document)?;

    // 4. Locate the clause and extract its terms
    let extractor = RoundingExtractor::new(LexiconTagger::new(), config);
    let terms = extractor.extract_from_pages(&pages)?;

    // 5. Report
    print_terms(&terms, args.json)?;

    if let Some(dir) = &args.output_dir {
        let storage = StorageManager::new(dir)?;
        let path = storage.save_terms(&args.document, &terms)?;
        tracing::info!("Saved result to: {}", path.display());
    }

    Ok(())
}

fn print_terms(terms: &RoundingTerms, json: bool) -> Result<(), AppError> {
    if json {
        println!("{}", serde_json::to_string_pretty(terms)?);
    } else {
        print!("{}", terms);
    }
    Ok(())
}
