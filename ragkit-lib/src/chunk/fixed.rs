use crate::chunk::{make_chunk, Chunk, ChunkMetadata, Chunker};
use crate::{Error, Result};

/// Fixed-size chunker - splits by character count
///
/// Windows of `chunk_size` characters advance by `chunk_size - overlap`, so
/// consecutive chunks share exactly `overlap` characters. The last window
/// stops at the end of the text; text no longer than `chunk_size` yields a
/// single chunk.
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    overlap: usize,
}

impl FixedSizeChunker {
    /// # Errors
    ///
    /// [`Error::InvalidInput`] unless `overlap < chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if overlap >= chunk_size {
            return Err(Error::InvalidInput(format!(
                "overlap ({overlap}) must be less than chunk size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

impl Chunker for FixedSizeChunker {
    fn name(&self) -> &str {
        "fixed"
    }

    fn chunk(&self, content: &str, mut metadata: ChunkMetadata) -> Vec<Chunk> {
        // byte offset of every char, plus the end of the string
        let bounds: Vec<usize> = content
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(content.len()))
            .collect();
        let len = bounds.len() - 1;
        if len == 0 {
            return Vec::new();
        }

        let stride = self.chunk_size - self.overlap;
        let total = if len <= self.chunk_size {
            1
        } else {
            (len - self.overlap).div_ceil(stride)
        };
        metadata.total_chunks = Some(total);

        let mut chunks = Vec::with_capacity(total);
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(len);
            let c = &content[bounds[start]..bounds[end]];
            chunks.push(make_chunk(c, &metadata, start, chunks.len()));

            if end == len {
                break;
            }
            start += stride;
        }
        debug_assert_eq!(chunks.len(), total);
        chunks
    }
}
