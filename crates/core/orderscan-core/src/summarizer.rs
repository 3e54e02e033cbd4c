/*!
# Map-Reduce Summarizer

Produces one detailed analysis of a document:

1. Split the text with [`TextChunker`].
2. Map: one model request per chunk, strictly in order, asking for every
   fact, date, entity and conclusion.
3. Reduce: when there is more than one chunk, one extra request consolidates
   the per-chunk analyses (joined by blank lines) into a single document.
*/

use crate::chunking::TextChunker;
use crate::prompts::PromptEngine;
use crate::types::{GenerateTextParams, LanguageModel};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Separator between chunk analyses in the intermediate document
pub const ANALYSIS_SEPARATOR: &str = "\n\n";

/// Final summary of one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Summary text
    pub text: String,

    /// Number of chunks mapped
    pub chunk_count: usize,

    /// Whether a reduce pass produced `text`
    pub reduced: bool,
}

/// Chunked map-reduce summarizer
pub struct MapReduceSummarizer {
    model: Arc<dyn LanguageModel>,
    chunker: TextChunker,
    prompts: PromptEngine,
}

impl MapReduceSummarizer {
    /// Create a summarizer
    pub fn new(model: Arc<dyn LanguageModel>, chunker: TextChunker) -> Self {
        Self {
            model,
            chunker,
            prompts: PromptEngine::new(),
        }
    }

    /// Summarize `text`. Any model failure aborts the whole summary.
    pub async fn summarize(&self, text: &str) -> Result<Summary> {
        let chunks = self.chunker.split(text);
        let total = chunks.len();

        if total == 0 {
            info!("SUMMARY_SKIPPED reason=empty_text");
            return Ok(Summary {
                text: String::new(),
                chunk_count: 0,
                reduced: false,
            });
        }

        let config = self.chunker.config();
        info!(
            "CHUNKS_READY count={} chunk_size={} overlap={}",
            total, config.chunk_size(), config.chunk_overlap()
        );

        let mut analyses = Vec::with_capacity(total);
        for chunk in &chunks {
            let part = chunk.index + 1;
            debug!("MAP_PASS part={}/{} chars={}", part, total, chunk.char_len());
            let prompt = self.prompts.map_prompt(part, total, &chunk.text)?;
            let analysis = self
                .model
                .generate_text(GenerateTextParams::prompt(prompt))
                .await?;
            analyses.push(analysis);
        }

        let intermediate = analyses.join(ANALYSIS_SEPARATOR);
        if total == 1 {
            return Ok(Summary {
                text: intermediate,
                chunk_count: 1,
                reduced: false,
            });
        }

        info!("REDUCE_PASS inputs={} chars={}", total, intermediate.chars().count());
        let prompt = self.prompts.reduce_prompt(&intermediate)?;
        let text = self
            .model
            .generate_text(GenerateTextParams::prompt(prompt))
            .await?;

        Ok(Summary {
            text,
            chunk_count: total,
            reduced: true,
        })
    }
}
