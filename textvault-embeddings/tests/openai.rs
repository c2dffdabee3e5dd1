use async_openai::config::OpenAIConfig;
use async_openai::Client;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use textvault_core::{Embedding, EmbeddingError};
use textvault_embeddings::{OpenAiEmbedding, OpenAiEmbeddingConfig};

fn embedding_item(index: usize, values: &[f32]) -> serde_json::Value {
    json!({"embedding": values, "index": index, "object": "embedding"})
}

fn list_response(items: Vec<serde_json::Value>) -> serde_json::Value {
    json!({
        "data": items,
        "model": "text-embedding-ada-002",
        "object": "list",
        "usage": {"prompt_tokens": 1, "total_tokens": 1}
    })
}

#[tokio::test]
async fn openai_embedding_maps_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(list_response(vec![embedding_item(0, &[0.1, 0.2, 0.3])])),
        )
        .mount(&server)
        .await;

    let config = OpenAiEmbeddingConfig::new("test-key")
        .with_api_base(format!("{}/v1", server.uri()))
        .with_model("text-embedding-ada-002", 3);
    let embedder = OpenAiEmbedding::new(config);

    let out = embedder.embed("hello").await.unwrap();
    assert_eq!(out, vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn openai_embedding_batch_maps_all_items() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_response(vec![
            embedding_item(0, &[1.0, 0.0]),
            embedding_item(1, &[0.0, 1.0]),
        ])))
        .mount(&server)
        .await;

    let config = OpenAIConfig::new()
        .with_api_key("test-key")
        .with_api_base(format!("{}/v1", server.uri()));
    let embedder = OpenAiEmbedding::with_client(Client::with_config(config), "ada", 2);

    let out = embedder
        .embed_batch(&["first".to_string(), "second".to_string()])
        .await
        .unwrap();
    assert_eq!(out, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
}

#[tokio::test]
async fn openai_embedding_rejects_wrong_dimension() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(list_response(vec![embedding_item(0, &[0.1, 0.2, 0.3])])),
        )
        .mount(&server)
        .await;

    let config = OpenAiEmbeddingConfig::new("test-key")
        .with_api_base(format!("{}/v1", server.uri()))
        .with_model("text-embedding-ada-002", 8);
    let embedder = OpenAiEmbedding::new(config);

    let error = embedder.embed("hello").await.unwrap_err();
    assert!(matches!(error, EmbeddingError::InvalidResponse(_)));
}

#[tokio::test]
async fn openai_embedding_rejects_batch_cardinality_mismatch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(list_response(vec![embedding_item(0, &[1.0, 0.0])])),
        )
        .mount(&server)
        .await;

    let config = OpenAiEmbeddingConfig::new("test-key")
        .with_api_base(format!("{}/v1", server.uri()))
        .with_model("ada", 2);
    let embedder = OpenAiEmbedding::new(config);

    let error = embedder
        .embed_batch(&["first".to_string(), "second".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(error, EmbeddingError::InvalidResponse(_)));
}

#[tokio::test]
async fn openai_embedding_maps_server_error_to_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = OpenAiEmbeddingConfig::new("test-key")
        .with_api_base(format!("{}/v1", server.uri()))
        .with_model("ada", 2);
    let embedder = OpenAiEmbedding::new(config);

    let error = embedder.embed("hello").await.unwrap_err();
    assert!(matches!(error, EmbeddingError::Provider(_)));
}
