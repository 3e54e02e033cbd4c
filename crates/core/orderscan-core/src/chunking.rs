/*!
# Text Chunking

Splits document text into overlapping, size-bounded chunks for the model.

Offsets and sizes are counted in characters (Unicode scalar values), never
bytes, so a chunk never ends inside a multi-byte sequence. Each chunk after
the first starts exactly `chunk_overlap` characters before its predecessor's
end, which makes the split lossless: dropping every chunk's overlap prefix and
concatenating gives back the input.
*/

use crate::{OrderScanError, Result};
use serde::{Deserialize, Serialize};

/// Break points in descending preference. Entries in one tier are equivalent;
/// the latest match in the window wins.
const BOUNDARY_TIERS: &[&[&str]] = &[&["\n\n"], &["\n"], &[". ", "! ", "? "], &[" "]];

/// Chunk size and overlap, in characters
///
/// Only constructed through [`ChunkingConfig::new`] (or `Default`), so
/// `chunk_overlap < chunk_size` always holds and every split makes progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawChunkingConfig")]
pub struct ChunkingConfig {
    chunk_size: usize,
    chunk_overlap: usize,
}

#[derive(Deserialize)]
struct RawChunkingConfig {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TryFrom<RawChunkingConfig> for ChunkingConfig {
    type Error = OrderScanError;

    fn try_from(raw: RawChunkingConfig) -> Result<Self> {
        Self::new(raw.chunk_size, raw.chunk_overlap)
    }
}

impl ChunkingConfig {
    /// Validated constructor
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(OrderScanError::config("chunk size must be greater than zero"));
        }
        if chunk_overlap >= chunk_size {
            return Err(OrderScanError::config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Upper bound on chunk length
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Characters shared by consecutive chunks
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 200,
        }
    }
}

/// A contiguous slice of the source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Position in the chunk sequence
    pub index: usize,

    /// Chunk content
    pub text: String,

    /// Start offset in the source (chars, inclusive)
    pub start: usize,

    /// End offset in the source (chars, exclusive)
    pub end: usize,

    /// Characters shared with the previous chunk (0 for the first)
    pub overlap: usize,
}

impl Chunk {
    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// Boundary-aware splitter
#[derive(Debug, Clone, Default)]
pub struct TextChunker {
    config: ChunkingConfig,
}

impl TextChunker {
    /// Create a chunker
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> ChunkingConfig {
        self.config
    }

    /// Split `text` into ordered, overlapping chunks
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        // Byte offset of every char, plus the end of the string.
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = offsets.len() - 1;

        let mut chunks = Vec::new();
        if total == 0 {
            return chunks;
        }

        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;
        let mut start = 0;

        loop {
            let hard_end = (start + size).min(total);
            let end = if hard_end == total {
                total
            } else {
                self.boundary_end(text, &offsets, start, hard_end)
            };

            chunks.push(Chunk {
                index: chunks.len(),
                text: text[offsets[start]..offsets[end]].to_string(),
                start,
                end,
                overlap: if chunks.is_empty() { 0 } else { overlap },
            });

            if end == total {
                break;
            }
            start = end - overlap;
        }

        chunks
    }

    /// Pick the end of a chunk starting at `start` whose hard limit is `hard_end`.
    ///
    /// The result is always greater than `start + overlap`, so the next chunk
    /// makes progress.
    fn boundary_end(&self, text: &str, offsets: &[usize], start: usize, hard_end: usize) -> usize {
        let min_end = start + (self.config.chunk_size / 2).max(self.config.chunk_overlap + 1);
        let window_start = offsets[start];
        let window = &text[window_start..offsets[hard_end]];

        for tier in BOUNDARY_TIERS {
            let best = tier
                .iter()
                .filter_map(|sep| window.rfind(sep).map(|pos| window_start + pos + sep.len()))
                .filter_map(|byte_end| offsets.binary_search(&byte_end).ok())
                .max();

            if let Some(end) = best {
                if end >= min_end {
                    return end;
                }
            }
        }

        hard_end
    }
}

/// Rebuild the source text from its chunks by dropping each overlap prefix
pub fn reassemble(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    for chunk in chunks {
        out.extend(chunk.text.chars().skip(chunk.overlap));
    }
    out
}
