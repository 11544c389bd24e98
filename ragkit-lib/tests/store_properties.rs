//! Property tests for in-memory vector store search ordering.

use proptest::prelude::*;
use ragkit_lib::chunk::{Chunk, ChunkMetadata};
use ragkit_lib::embed::Embedding;
use ragkit_lib::store::{Distance, MemoryStore, VectorStore};

const DIM: usize = 4;

fn chunk(i: usize) -> Chunk {
    Chunk {
        id: format!("chunk-{i}"),
        content: format!("content {i}"),
        metadata: ChunkMetadata {
            index: i,
            ..ChunkMetadata::default()
        },
    }
}

/// Small integer coordinates so equal distances (ties) are common.
fn arb_embedding() -> impl Strategy<Value = Embedding> {
    proptest::collection::vec((-3i8..=3).prop_map(f32::from), DIM)
}

fn arb_distance() -> impl Strategy<Value = Distance> {
    prop_oneof![Just(Distance::Euclidean), Just(Distance::Cosine)]
}

/// Brute-force reference: stable sort of insertion order by distance.
fn reference(embeddings: &[Embedding], query: &[f32], k: usize, distance: Distance) -> Vec<String> {
    let mut scored: Vec<(usize, f32)> = embeddings
        .iter()
        .enumerate()
        .map(|(i, e)| (i, distance.between(query, e)))
        .collect();
    scored.sort_by(|a, b| a.1.total_cmp(&b.1));
    scored.into_iter().take(k).map(|(i, _)| format!("chunk-{i}")).collect()
}

mod prop_memory_search {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn results_bounded_and_nearest_first(
            embeddings in proptest::collection::vec(arb_embedding(), 0..30),
            query in arb_embedding(),
            k in 0usize..40,
            distance in arb_distance(),
        ) {
            let chunks: Vec<Chunk> = (0..embeddings.len()).map(chunk).collect();
            let mut store = MemoryStore::with_distance(distance);
            store.insert(&chunks, &embeddings).unwrap();

            let results = store.search(&query, k).unwrap();

            prop_assert!(results.len() <= k);
            prop_assert_eq!(results.len(), k.min(embeddings.len()));
            for pair in results.windows(2) {
                prop_assert!(pair[0].distance.total_cmp(&pair[1].distance).is_le());
            }
        }

        /// Equal distances come back in insertion order.
        #[test]
        fn ties_keep_insertion_order(
            embeddings in proptest::collection::vec(arb_embedding(), 1..30),
            query in arb_embedding(),
            k in 1usize..40,
            distance in arb_distance(),
        ) {
            let chunks: Vec<Chunk> = (0..embeddings.len()).map(chunk).collect();
            let mut store = MemoryStore::with_distance(distance);
            store.insert(&chunks, &embeddings).unwrap();

            let ids: Vec<String> = store
                .search(&query, k)
                .unwrap()
                .into_iter()
                .map(|r| r.chunk.id)
                .collect();
            prop_assert_eq!(ids, reference(&embeddings, &query, k, distance));
        }
    }
}
