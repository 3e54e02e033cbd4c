//! OrderScan Core
//!
//! Purchase-order analysis for PDF documents:
//!
//! - PDF text extraction, page by page
//! - Overlapping, boundary-aware text chunking
//! - Map-reduce summarization through a [`LanguageModel`]
//! - Fixed-schema field extraction exported as a single CSV row
//! - Explicit stage outcomes instead of error text posing as content
//! - A sequential batch runner over an input directory
//!
//! # Example
//!
//! ```no_run
//! use orderscan_core::*;
//! use std::sync::Arc;
//!
//! async fn run(model: Arc<dyn LanguageModel>) -> Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let pipeline = DocumentPipeline::new(model, &config);
//!     let report = pipeline.analyze(std::path::Path::new("input/order.pdf")).await;
//!     println!("{}", report.summary_display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use uuid::Uuid;

pub mod artifacts;
pub mod batch;
pub mod chunking;
pub mod config;
pub mod error;
pub mod fields;
pub mod ingestion;
pub mod outcome;
pub mod pipeline;
pub mod prompts;
pub mod summarizer;
pub mod testing;
pub mod types;
pub mod utils;

pub use artifacts::{ArtifactWriter, SaveResult};
pub use batch::{
    discover_pdfs, BatchOptions, BatchReport, BatchRunner, FailurePolicy, FileReport, FileState,
};
pub use chunking::{reassemble, Chunk, ChunkingConfig, TextChunker};
pub use config::{
    get_env_bool, get_env_float, get_env_int, get_env_or, get_required_env, load_env,
    load_env_from_path, AppConfig, ModelConfig, API_KEY_VAR, DEFAULT_MODEL,
};
pub use error::{OrderScanError, Result};
pub use fields::{
    column_for, csv_header, field_keys, FieldExtractor, StructuredFields, FIELD_COLUMNS,
    NOT_AVAILABLE,
};
pub use ingestion::{DocumentStats, DocumentText, PdfExtractor};
pub use outcome::{Stage, StageFailure, StageOutcome};
pub use pipeline::{AnalysisReport, DocumentPipeline};
pub use prompts::PromptEngine;
pub use summarizer::{MapReduceSummarizer, Summary};
pub use types::*;
pub use utils::{init_logging, init_logging_with, scrub_message};
