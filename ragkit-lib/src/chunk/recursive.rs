use std::collections::VecDeque;

use crate::chunk::{make_chunk, Chunk, ChunkMetadata, Chunker};
use crate::{Error, Result};

/// Separators tried in order: paragraphs, lines, words, characters.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Recursive chunker - splits on the coarsest separator present, recursing
/// into finer separators for pieces that are still too long
///
/// Good for: transcripts and prose, where chunks should end on natural
/// boundaries
///
/// Adjacent pieces are merged back together up to `chunk_size` characters.
/// When a chunk is emitted, up to `overlap` characters of its trailing pieces
/// are carried into the next one. Chunks are whitespace-trimmed.
///
/// A chunk's `position` is where it starts in the source. Runs of blank
/// lines or spaces inside a chunk are collapsed to one separator, so such a
/// chunk is located by its first word.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    overlap: usize,
    separators: Vec<String>,
}

impl RecursiveChunker {
    /// # Errors
    ///
    /// [`Error::InvalidInput`] unless `overlap < chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if overlap >= chunk_size {
            return Err(Error::InvalidInput(format!(
                "overlap ({overlap}) must be less than chunk size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Replace the separator hierarchy (coarsest first).
    #[must_use]
    pub fn with_separators(mut self, separators: &[&str]) -> Self {
        self.separators = separators.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Split text into chunk strings without building [`Chunk`]s.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        // first separator that is present (or the empty one), else the last
        let (separator, finer) = match separators
            .iter()
            .position(|s| s.is_empty() || text.contains(s.as_str()))
        {
            Some(i) if separators[i].is_empty() => ("", &separators[..0]),
            Some(i) => (separators[i].as_str(), &separators[i + 1..]),
            None => (separators.last().map_or("", String::as_str), &separators[..0]),
        };

        let splits: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|s| !s.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut fitting = Vec::new();
        for s in splits {
            if char_len(s) < self.chunk_size {
                fitting.push(s);
                continue;
            }

            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting, separator));
                fitting.clear();
            }
            if finer.is_empty() {
                chunks.push(s.to_string());
            } else {
                chunks.extend(self.split_recursive(s, finer));
            }
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting, separator));
        }
        chunks
    }

    /// Merge pieces into chunks of at most `chunk_size` characters.
    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(piece);
            let joiner = |current: &VecDeque<&str>| if current.is_empty() { 0 } else { sep_len };

            if total + len + joiner(&current) > self.chunk_size && !current.is_empty() {
                push_joined(&mut chunks, &current, separator);

                // keep at most `overlap` characters as the head of the next chunk
                while total > self.overlap
                    || (total > 0 && total + len + joiner(&current) > self.chunk_size)
                {
                    let Some(first) = current.pop_front() else {
                        break;
                    };
                    total -= char_len(first) + joiner(&current);
                }
            }

            total += len + joiner(&current);
            current.push_back(piece);
        }
        push_joined(&mut chunks, &current, separator);
        chunks
    }
}

impl Chunker for RecursiveChunker {
    fn name(&self) -> &str {
        "recursive"
    }

    fn chunk(&self, content: &str, mut metadata: ChunkMetadata) -> Vec<Chunk> {
        let pieces = self.split_text(content);
        metadata.total_chunks = Some(pieces.len());

        let mut chunks = Vec::with_capacity(pieces.len());
        let mut search_from = 0;
        for (i, piece) in pieces.iter().enumerate() {
            let byte = locate(content, piece, search_from);
            let position = content[..byte].chars().count();
            search_from = byte + content[byte..].chars().next().map_or(0, char::len_utf8);

            chunks.push(make_chunk(piece, &metadata, position, i));
        }
        chunks
    }
}

/// Byte offset of `piece` in `content`, searching from `from`.
fn locate(content: &str, piece: &str, from: usize) -> usize {
    let rest = &content[from..];
    rest.find(piece)
        .or_else(|| {
            // collapsed separators: the first word is still verbatim
            let first_word = piece.split_whitespace().next()?;
            rest.find(first_word)
        })
        .map_or(from, |b| b + from)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn push_joined(chunks: &mut Vec<String>, current: &VecDeque<&str>, separator: &str) {
    let joined = current.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
