//! Integration tests for the RAG pipeline.
//!
//! These exercise the full index → retrieve → rerank → answer flow using
//! `MockInferenceProvider`, verifying ordering, index mapping, fallback
//! behavior, and failure atomicity.

use nebularag_core::client::MockInferenceProvider;
use nebularag_core::error::{ClientError, NebulaRagError};
use nebularag_core::pipeline::{PipelineOptions, RagPipeline};
use pretty_assertions::assert_eq;

/// Options wide enough that each short test document becomes one chunk.
fn one_chunk_per_doc() -> PipelineOptions {
    PipelineOptions {
        chunk_size: 200,
        chunk_overlap: 20,
        top_k: 12,
        rerank_k: 6,
    }
}

fn pipeline(options: PipelineOptions) -> RagPipeline<MockInferenceProvider> {
    RagPipeline::new(MockInferenceProvider::new(), options)
}

/// Index `docs` with one queued embedding vector per document.
async fn index_docs(
    rag: &mut RagPipeline<MockInferenceProvider>,
    docs: &[&str],
    vectors: Vec<Vec<f32>>,
) -> usize {
    let docs: Vec<String> = docs.iter().map(|d| d.to_string()).collect();
    rag.client().queue_embed(Ok(vectors));
    rag.index_texts(&docs).await.unwrap()
}

#[tokio::test]
async fn indexing_two_documents_counts_chunks_across_both() {
    let mut rag = pipeline(PipelineOptions {
        chunk_size: 20,
        chunk_overlap: 5,
        ..one_chunk_per_doc()
    });

    // 61 chars -> 4 chunks at size 20 / overlap 5; the short doc is 1 chunk.
    let long = "Pack my box with five dozen liquor jugs and a quart of cider.";
    let short = "A tiny note.";
    rag.client().queue_embed(Ok(vec![vec![1.0, 0.0]; 5]));

    let count = rag
        .index_texts(&[long.to_string(), short.to_string()])
        .await
        .unwrap();
    assert_eq!(count, 5);
    assert_eq!(rag.store().len(), 5);

    // One embed round trip for the whole batch.
    let calls = rag.client().embed_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 5);
    assert_eq!(calls[0][4], "A tiny note.");
}

#[tokio::test]
async fn retrieve_orders_candidates_by_cosine_similarity() {
    let mut rag = pipeline(one_chunk_per_doc());
    index_docs(
        &mut rag,
        &["east doc", "north doc", "diagonal doc"],
        vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
    )
    .await;

    // Query along the x axis: east (1.0) > diagonal (~0.707) > north (0.0).
    rag.client().queue_embed(Ok(vec![vec![1.0, 0.0]]));
    let results = rag.retrieve("test query").await.unwrap();

    let indices: Vec<usize> = results.iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, vec![0, 2, 1]);
    assert!((results[0].1 - 1.0).abs() < 1e-6);
    assert!(results[0].1 > results[1].1 && results[1].1 > results[2].1);
}

#[tokio::test]
async fn retrieve_on_empty_store_returns_no_candidates() {
    let rag = pipeline(one_chunk_per_doc());
    rag.client().queue_embed(Ok(vec![vec![1.0, 0.0]]));
    let results = rag.retrieve("anything").await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn rerank_maps_local_indices_back_to_store_indices() {
    let mut rag = pipeline(one_chunk_per_doc());
    let docs: Vec<String> = (0..10).map(|i| format!("document number {i}")).collect();
    rag.client()
        .queue_embed(Ok((0..10).map(|i| vec![i as f32, 1.0]).collect()));
    rag.index_texts(&docs).await.unwrap();

    // Local index 2 -> store 9, local 0 -> store 5; 7 is out of range and
    // dropped, as is the result with no index at all.
    rag.client().queue_rerank(Ok(vec![
        MockInferenceProvider::rerank_result(2),
        MockInferenceProvider::rerank_result(0),
        MockInferenceProvider::rerank_result(7),
        nebularag_core::RerankResult {
            index: None,
            relevance_score: Some(0.1),
            document: None,
        },
    ]));

    let out = rag.rerank("which documents?", &[5, 2, 9]).await.unwrap();
    assert_eq!(out, vec![9, 5]);

    // The service saw the candidates' texts in candidate order.
    let calls = rag.client().rerank_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].1,
        vec![
            "document number 5".to_string(),
            "document number 2".to_string(),
            "document number 9".to_string(),
        ]
    );
    assert_eq!(calls[0].2, 6);
}

#[tokio::test]
async fn rerank_drops_negative_local_indices() {
    let mut rag = pipeline(one_chunk_per_doc());
    index_docs(&mut rag, &["only doc"], vec![vec![1.0, 0.0]]).await;

    rag.client().queue_rerank(Ok(vec![
        MockInferenceProvider::rerank_result(-1),
        MockInferenceProvider::rerank_result(0),
    ]));
    let out = rag.rerank("q", &[0]).await.unwrap();
    assert_eq!(out, vec![0]);
}

#[tokio::test]
async fn answer_uses_reranked_order_for_context_and_sources() {
    let mut rag = pipeline(PipelineOptions {
        rerank_k: 2,
        ..one_chunk_per_doc()
    });
    index_docs(
        &mut rag,
        &["east doc", "north doc", "diagonal doc"],
        vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
    )
    .await;

    rag.client().queue_embed(Ok(vec![vec![1.0, 0.0]]));
    // Retrieval order is [0, 2, 1]; rerank reverses the top two.
    rag.client().queue_rerank(Ok(vec![
        MockInferenceProvider::rerank_result(1),
        MockInferenceProvider::rerank_result(0),
    ]));
    rag.client().queue_chat(Ok("It faces east.".to_string()));

    let result = rag.answer("which way?", None).await.unwrap();
    assert_eq!(result.answer, "It faces east.");
    assert_eq!(result.indices, vec![2, 0]);
    assert_eq!(result.sources, vec!["diagonal doc", "east doc"]);
    assert_eq!(result.models.embedding, "mock-embedding-model");
    assert_eq!(result.models.reranker, "mock-reranker-model");
    assert_eq!(result.models.chat, "mock-chat-model");

    // The prompt carries the context in reranked order and the question
    // verbatim, at temperature 0.2.
    let chat_calls = rag.client().chat_calls();
    assert_eq!(chat_calls.len(), 1);
    let (messages, temperature) = &chat_calls[0];
    assert_eq!(temperature, &0.2);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, "system");
    assert!(
        messages[1]
            .content
            .contains("diagonal doc\n\n---\n\neast doc")
    );
    assert!(messages[1].content.contains("Question: which way?"));
}

#[tokio::test]
async fn answer_falls_back_to_retrieval_order_when_rerank_is_empty() {
    let mut rag = pipeline(PipelineOptions {
        rerank_k: 2,
        ..one_chunk_per_doc()
    });
    index_docs(
        &mut rag,
        &["east doc", "north doc", "diagonal doc"],
        vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
    )
    .await;

    rag.client().queue_embed(Ok(vec![vec![1.0, 0.0]]));
    rag.client().queue_rerank(Ok(Vec::new()));
    rag.client().queue_chat(Ok("Fallback answer.".to_string()));

    let result = rag.answer("which way?", None).await.unwrap();
    // First rerank_k candidates of the original retrieval order [0, 2, 1].
    assert_eq!(result.indices, vec![0, 2]);
    assert_eq!(result.sources, vec!["east doc", "diagonal doc"]);
}

#[tokio::test]
async fn answer_fallback_respects_max_context_docs() {
    let mut rag = pipeline(one_chunk_per_doc());
    index_docs(
        &mut rag,
        &["east doc", "north doc", "diagonal doc"],
        vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
    )
    .await;

    rag.client().queue_embed(Ok(vec![vec![1.0, 0.0]]));
    rag.client().queue_rerank(Ok(Vec::new()));
    rag.client().queue_chat(Ok("ok".to_string()));

    let result = rag.answer("which way?", Some(1)).await.unwrap();
    assert_eq!(result.indices, vec![0]);
}

#[tokio::test]
async fn answer_on_empty_store_skips_rerank_entirely() {
    let rag = pipeline(one_chunk_per_doc());
    rag.client().queue_embed(Ok(vec![vec![1.0, 0.0]]));
    rag.client().queue_chat(Ok("I don't know.".to_string()));

    let result = rag.answer("anything?", None).await.unwrap();
    assert_eq!(result.answer, "I don't know.");
    assert!(result.indices.is_empty());
    assert!(result.sources.is_empty());
    assert!(rag.client().rerank_calls().is_empty());

    // Context block is empty but the prompt shape is unchanged.
    let chat_calls = rag.client().chat_calls();
    assert!(chat_calls[0].0[1].content.starts_with("Context:\n\n"));
}

#[tokio::test]
async fn failed_embedding_leaves_store_unchanged() {
    let mut rag = pipeline(one_chunk_per_doc());
    rag.client().queue_embed(Err(ClientError::Http {
        endpoint: "/embeddings".into(),
        status: 500,
        detail: "boom".into(),
    }));

    let err = rag
        .index_texts(&["some document".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, NebulaRagError::Client(_)));
    assert_eq!(rag.store().len(), 0);

    // The store is still usable afterwards.
    index_docs(&mut rag, &["second try"], vec![vec![1.0, 0.0]]).await;
    assert_eq!(rag.store().len(), 1);
}

#[tokio::test]
async fn chat_failure_propagates_out_of_answer() {
    let mut rag = pipeline(one_chunk_per_doc());
    index_docs(&mut rag, &["doc"], vec![vec![1.0, 0.0]]).await;

    rag.client().queue_embed(Ok(vec![vec![1.0, 0.0]]));
    rag.client().queue_rerank(Ok(vec![MockInferenceProvider::rerank_result(0)]));
    rag.client().queue_chat(Err(ClientError::Timeout {
        endpoint: "/chat/completions".into(),
        timeout_secs: 60,
    }));

    let err = rag.answer("q", None).await.unwrap_err();
    assert!(matches!(
        err,
        NebulaRagError::Client(ClientError::Timeout { .. })
    ));
}
