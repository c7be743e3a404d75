use super::*;
use crate::ErrorKind;
use crate::embeddings::testing::HashingEmbedder;
use crate::embeddings::{ChunkUnit, ChunkingConfig, segment_text};

#[derive(Debug)]
struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn name(&self) -> &str {
        "failing"
    }

    fn dimension(&self) -> usize {
        8
    }

    fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        Err(anyhow::anyhow!("embedding server unavailable"))
    }
}

#[derive(Debug)]
struct WrongDimensionEmbedder;

impl Embedder for WrongDimensionEmbedder {
    fn name(&self) -> &str {
        "wrong-dimension"
    }

    fn dimension(&self) -> usize {
        8
    }

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(vec![1.0; 4 + text.len() % 2])
    }
}

fn sample_segments() -> Vec<Segment> {
    let text = "The sky is blue. Rust has a borrow checker. Water is wet. \
                Cats chase mice. The ocean reflects the sky.";
    segment_text(
        text,
        &ChunkingConfig {
            chunk_size: 4,
            chunk_overlap: 0,
            unit: ChunkUnit::Tokens,
        },
    )
}

fn local_index() -> Index {
    VectorIndex::new(Some(Arc::new(HashingEmbedder::new(256))))
        .build(sample_segments())
        .expect("index should build")
}

#[test]
fn build_keeps_every_segment() {
    let index = local_index();
    assert_eq!(index.len(), sample_segments().len());
    assert!(!index.is_empty());
    assert_eq!(index.provider_name(), "hashing");
    assert_eq!(index.segments(), sample_segments().as_slice());
}

#[test]
fn search_ranks_matching_segment_first() {
    let index = local_index();
    let results = index
        .search("Which cats chase mice?", 3)
        .expect("search should succeed");

    assert_eq!(results.len(), 3);
    assert!(results[0].segment.content.contains("mice"));
    assert!(
        results
            .windows(2)
            .all(|pair| pair[0].similarity_score >= pair[1].similarity_score)
    );
}

#[test]
fn k_is_clamped_to_segment_count() {
    let index = local_index();
    let results = index.search("sky", 100).expect("search should succeed");
    assert_eq!(results.len(), index.len());

    assert!(index.search("sky", 0).expect("k zero").is_empty());
}

#[test]
fn empty_query_returns_leading_segments() {
    let index = local_index();
    for k in [1, 3, 50] {
        let results = index.search("", k).expect("empty query never errors");
        assert!(results.len() <= k);
        let expected: Vec<&Segment> = index.leading(k).iter().collect();
        let actual: Vec<&Segment> = results.iter().map(|r| &r.segment).collect();
        assert_eq!(actual, expected);
    }
}

#[test]
fn index_without_embedder_uses_document_order() {
    let index = VectorIndex::new(None)
        .build(sample_segments())
        .expect("index should build");

    assert_eq!(index.provider_name(), "none");
    let results = index.search("mice", 2).expect("search should succeed");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].segment.index, 0);
    assert_eq!(results[1].segment.index, 1);
    assert!(results.iter().all(|r| r.similarity_score == 0.0));
}

#[test]
fn failing_provider_yields_no_index() {
    let err = VectorIndex::new(Some(Arc::new(FailingEmbedder)))
        .build(sample_segments())
        .expect_err("build must fail");
    assert_eq!(err.kind(), ErrorKind::Index);
}

#[test]
fn dimension_mismatch_is_index_error() {
    let err = VectorIndex::new(Some(Arc::new(WrongDimensionEmbedder)))
        .build(sample_segments())
        .expect_err("build must fail");
    assert_eq!(err.kind(), ErrorKind::Index);
}

#[test]
fn empty_segments_are_rejected() {
    let err = VectorIndex::new(None)
        .build(Vec::new())
        .expect_err("nothing to index");
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn cosine_similarity_bounds() {
    assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
    assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
}
