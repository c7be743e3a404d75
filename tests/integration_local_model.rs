#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Tests against the real all-MiniLM-L6-v2 model
// The model is downloaded on first run: cargo test --test integration_local_model -- --ignored

use docs_qa::embeddings::{Embedder, LOCAL_MODEL_DIMENSION, LocalModelEmbedder};
use docs_qa::index::cosine_similarity;
use std::sync::LazyLock;

static MODEL: LazyLock<LocalModelEmbedder> =
    LazyLock::new(|| LocalModelEmbedder::new().expect("local model should load"));

fn embed(text: &str) -> Vec<f32> {
    MODEL.embed(text).expect("embedding should succeed")
}

#[test]
#[ignore = "downloads the all-MiniLM-L6-v2 model"]
fn vectors_have_model_dimension() {
    let vector = embed("The sky is blue.");
    assert_eq!(vector.len(), LOCAL_MODEL_DIMENSION);
    assert_eq!(MODEL.dimension(), LOCAL_MODEL_DIMENSION);
}

#[test]
#[ignore = "downloads the all-MiniLM-L6-v2 model"]
fn synonyms_are_closer_than_unrelated_words() {
    let car = embed("car");
    let automobile = embed("automobile");
    let banana = embed("banana");

    assert!(cosine_similarity(&car, &automobile) > cosine_similarity(&car, &banana));
}

#[test]
#[ignore = "downloads the all-MiniLM-L6-v2 model"]
fn paraphrase_outranks_word_overlap() {
    let query = embed("Where was the car left?");
    let paraphrase = embed("The vehicle was parked outside the station.");
    let overlap = embed("The left wing was where the meeting was held.");

    assert!(cosine_similarity(&query, &paraphrase) > cosine_similarity(&query, &overlap));
}

#[test]
#[ignore = "downloads the all-MiniLM-L6-v2 model"]
fn batch_matches_single_calls() {
    let texts = vec!["Water is wet.".to_string(), "The sky is blue.".to_string()];
    let batch = MODEL.embed_batch(&texts).expect("batch should succeed");

    assert_eq!(batch.len(), 2);
    for (vector, text) in batch.iter().zip(&texts) {
        let single = embed(text);
        assert!(cosine_similarity(vector, &single) > 0.999);
    }
}
