use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use tracing::debug;

use crate::chunk::Chunk;
use crate::embed::Embedding;
use crate::store::{Distance, SearchResult, VectorStore};
use crate::{Error, Result};

/// In-memory vector store.
///
/// Uses brute-force search over every stored vector, with Euclidean distance
/// unless configured otherwise. Entries keep insertion order, which breaks
/// distance ties. Re-inserting a chunk id replaces that entry in place.
pub struct MemoryStore {
    chunks: Vec<Chunk>,
    embeddings: Vec<Embedding>,
    slots: HashMap<String, usize>,
    dimension: Option<usize>,
    distance: Distance,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_distance(Distance::default())
    }

    /// Create a new empty store using the given distance measure.
    #[must_use]
    pub fn with_distance(distance: Distance) -> Self {
        Self {
            chunks: Vec::new(),
            embeddings: Vec::new(),
            slots: HashMap::new(),
            dimension: None,
            distance,
        }
    }

    /// Dimension of stored vectors, fixed by the first insert.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Heap entry ordered by distance, then by insertion slot.
struct Candidate {
    distance: f32,
    slot: usize,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.slot.cmp(&other.slot))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl VectorStore for MemoryStore {
    fn insert(&mut self, chunks: &[Chunk], embeddings: &[Embedding]) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(Error::Store(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let expected = self
            .dimension
            .or_else(|| embeddings.first().map(Vec::len));
        if let Some(dim) = expected {
            if let Some(bad) = embeddings.iter().find(|e| e.len() != dim) {
                return Err(Error::Store(format!(
                    "embedding dimension {} does not match store dimension {dim}",
                    bad.len()
                )));
            }
            self.dimension = Some(dim);
        }

        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            match self.slots.get(&chunk.id) {
                Some(&slot) => {
                    self.chunks[slot] = chunk.clone();
                    self.embeddings[slot] = embedding.clone();
                }
                None => {
                    self.slots.insert(chunk.id.clone(), self.chunks.len());
                    self.chunks.push(chunk.clone());
                    self.embeddings.push(embedding.clone());
                }
            }
        }
        debug!(inserted = chunks.len(), total = self.chunks.len(), "stored embeddings");
        Ok(())
    }

    fn search(&self, query: &Embedding, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 || self.chunks.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(dim) = self.dimension {
            if query.len() != dim {
                return Err(Error::Store(format!(
                    "query dimension {} does not match store dimension {dim}",
                    query.len()
                )));
            }
        }

        // max-heap holding the k best so far; the worst sits on top
        let mut best = BinaryHeap::with_capacity(k + 1);
        for (slot, embedding) in self.embeddings.iter().enumerate() {
            best.push(Candidate {
                distance: self.distance.between(query, embedding),
                slot,
            });
            if best.len() > k {
                best.pop();
            }
        }

        Ok(best
            .into_sorted_vec()
            .into_iter()
            .map(|c| SearchResult {
                chunk: self.chunks[c.slot].clone(),
                distance: c.distance,
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }

    fn clear(&mut self) {
        self.chunks.clear();
        self.embeddings.clear();
        self.slots.clear();
        self.dimension = None;
    }
}
