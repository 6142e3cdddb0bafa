//! NebulaBlock inference client.
//!
//! One HTTP client for the three remote capabilities the pipeline consumes:
//! embeddings, reranking, and chat completions. The service speaks
//! OpenAI/Cohere-shaped JSON; each endpoint gets typed request and response
//! records, and malformed payloads are converted into [`ClientError`] at
//! this boundary instead of surfacing as missing-field failures deeper in
//! the pipeline.

use crate::config::Settings;
use crate::error::ClientError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

/// A chat message in the wire format the chat endpoint expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// One rerank result as returned by the rerank endpoint.
///
/// `index` is the position within the submitted document list, not a store
/// index; the pipeline maps it back. Fields are optional because the service
/// is not trusted to populate them — consumers skip results with a missing
/// or out-of-range index.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RerankResult {
    #[serde(default)]
    pub index: Option<i64>,
    #[serde(default)]
    pub relevance_score: Option<f32>,
    #[serde(default)]
    pub document: Option<String>,
}

/// The remote inference capability consumed by the pipeline.
///
/// Implemented by [`NebulaClient`] for the real service and by
/// [`MockInferenceProvider`] for tests.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Embed a batch of texts, one vector per input in the same order.
    async fn embed(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, ClientError>;

    /// Rerank `documents` against `query`, keeping at most `top_n`.
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> std::result::Result<Vec<RerankResult>, ClientError>;

    /// Run a chat completion and return the generated text.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> std::result::Result<String, ClientError>;

    /// Model identifier used for embedding requests.
    fn embedding_model(&self) -> &str;

    /// Model identifier used for rerank requests.
    fn reranker_model(&self) -> &str;

    /// Model identifier used for chat requests.
    fn chat_model(&self) -> &str;
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [String],
    top_n: usize,
}

#[derive(Deserialize)]
struct RerankResponse {
    // Some deployments return the result list under "data".
    #[serde(alias = "data")]
    results: Vec<RerankResult>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for the NebulaBlock inference service.
#[derive(Debug)]
pub struct NebulaClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    embeddings_path: String,
    rerank_path: String,
    chat_path: String,
    embedding_model: String,
    reranker_model: String,
    chat_model: String,
    timeout_secs: u64,
}

impl NebulaClient {
    /// Create a client from a validated [`Settings`] snapshot.
    ///
    /// The configured timeout is installed on the underlying HTTP client as
    /// a fixed per-request budget; the pipeline itself performs no retries
    /// or timeout handling.
    pub fn new(settings: &Settings) -> std::result::Result<Self, ClientError> {
        if !(settings.timeout.is_finite() && settings.timeout > 0.0) {
            return Err(ClientError::Build {
                message: format!("invalid timeout: {}", settings.timeout),
            });
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs_f64(settings.timeout))
            .build()
            .map_err(|e| ClientError::Build {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            embeddings_path: settings.embeddings_path.clone(),
            rerank_path: settings.rerank_path.clone(),
            chat_path: settings.chat_path.clone(),
            embedding_model: settings.embedding_model.clone(),
            reranker_model: settings.reranker_model.clone(),
            chat_model: settings.chat_model.clone(),
            timeout_secs: settings.timeout.ceil() as u64,
        })
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        payload: &impl Serialize,
    ) -> std::result::Result<T, ClientError> {
        let url = self.endpoint_url(path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout {
                        endpoint: path.to_string(),
                        timeout_secs: self.timeout_secs,
                    }
                } else {
                    ClientError::Request {
                        endpoint: path.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                endpoint: path.to_string(),
                status: status.as_u16(),
                detail,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::ResponseParse {
                endpoint: path.to_string(),
                message: e.to_string(),
            })
    }
}

/// Unpack an embeddings response, checking that the service returned exactly
/// one vector per input.
fn collect_embeddings(
    response: EmbeddingsResponse,
    expected: usize,
    endpoint: &str,
) -> std::result::Result<Vec<Vec<f32>>, ClientError> {
    if response.data.len() != expected {
        return Err(ClientError::ResponseParse {
            endpoint: endpoint.to_string(),
            message: format!(
                "expected {} embeddings, received {}",
                expected,
                response.data.len()
            ),
        });
    }
    Ok(response.data.into_iter().map(|d| d.embedding).collect())
}

/// Extract the generated text from a chat response, rejecting payloads with
/// no choices or a missing message content.
fn extract_chat_content(
    response: ChatResponse,
    endpoint: &str,
) -> std::result::Result<String, ClientError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::ResponseParse {
            endpoint: endpoint.to_string(),
            message: "no choices in response".into(),
        })?;
    choice
        .message
        .content
        .ok_or_else(|| ClientError::ResponseParse {
            endpoint: endpoint.to_string(),
            message: "missing content in chat message".into(),
        })
}

#[async_trait]
impl InferenceProvider for NebulaClient {
    async fn embed(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, ClientError> {
        let payload = EmbeddingsRequest {
            model: &self.embedding_model,
            input: texts,
        };
        let response: EmbeddingsResponse = self.post_json(&self.embeddings_path, &payload).await?;
        collect_embeddings(response, texts.len(), &self.embeddings_path)
    }

    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> std::result::Result<Vec<RerankResult>, ClientError> {
        let payload = RerankRequest {
            model: &self.reranker_model,
            query,
            documents,
            top_n,
        };
        let response: RerankResponse = self.post_json(&self.rerank_path, &payload).await?;
        Ok(response.results)
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> std::result::Result<String, ClientError> {
        let payload = ChatRequest {
            model: &self.chat_model,
            messages,
            temperature,
        };
        let response: ChatResponse = self.post_json(&self.chat_path, &payload).await?;
        extract_chat_content(response, &self.chat_path)
    }

    fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    fn reranker_model(&self) -> &str {
        &self.reranker_model
    }

    fn chat_model(&self) -> &str {
        &self.chat_model
    }
}

/// A mock inference provider for testing and development.
///
/// Responses are queued per capability and popped in FIFO order; calls with
/// an empty queue fail with a [`ClientError::Request`]. Every call records
/// its arguments so tests can assert on what the pipeline sent.
#[derive(Default)]
pub struct MockInferenceProvider {
    embed_queue: std::sync::Mutex<std::collections::VecDeque<std::result::Result<Vec<Vec<f32>>, ClientError>>>,
    rerank_queue: std::sync::Mutex<std::collections::VecDeque<std::result::Result<Vec<RerankResult>, ClientError>>>,
    chat_queue: std::sync::Mutex<std::collections::VecDeque<std::result::Result<String, ClientError>>>,
    embed_calls: std::sync::Mutex<Vec<Vec<String>>>,
    rerank_calls: std::sync::Mutex<Vec<(String, Vec<String>, usize)>>,
    chat_calls: std::sync::Mutex<Vec<(Vec<ChatMessage>, f32)>>,
}

impl MockInferenceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next `embed` call.
    pub fn queue_embed(&self, response: std::result::Result<Vec<Vec<f32>>, ClientError>) {
        self.embed_queue.lock().unwrap().push_back(response);
    }

    /// Queue a response for the next `rerank` call.
    pub fn queue_rerank(&self, response: std::result::Result<Vec<RerankResult>, ClientError>) {
        self.rerank_queue.lock().unwrap().push_back(response);
    }

    /// Queue a response for the next `chat` call.
    pub fn queue_chat(&self, response: std::result::Result<String, ClientError>) {
        self.chat_queue.lock().unwrap().push_back(response);
    }

    /// Build a rerank result with only the local index set.
    pub fn rerank_result(index: i64) -> RerankResult {
        RerankResult {
            index: Some(index),
            relevance_score: None,
            document: None,
        }
    }

    /// Texts passed to each `embed` call so far.
    pub fn embed_calls(&self) -> Vec<Vec<String>> {
        self.embed_calls.lock().unwrap().clone()
    }

    /// `(query, documents, top_n)` for each `rerank` call so far.
    pub fn rerank_calls(&self) -> Vec<(String, Vec<String>, usize)> {
        self.rerank_calls.lock().unwrap().clone()
    }

    /// `(messages, temperature)` for each `chat` call so far.
    pub fn chat_calls(&self) -> Vec<(Vec<ChatMessage>, f32)> {
        self.chat_calls.lock().unwrap().clone()
    }

    fn no_response(capability: &str) -> ClientError {
        ClientError::Request {
            endpoint: capability.to_string(),
            message: "no queued mock response".into(),
        }
    }
}

#[async_trait]
impl InferenceProvider for MockInferenceProvider {
    async fn embed(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, ClientError> {
        self.embed_calls.lock().unwrap().push(texts.to_vec());
        self.embed_queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::no_response("embed")))
    }

    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> std::result::Result<Vec<RerankResult>, ClientError> {
        self.rerank_calls
            .lock()
            .unwrap()
            .push((query.to_string(), documents.to_vec(), top_n));
        self.rerank_queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::no_response("rerank")))
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> std::result::Result<String, ClientError> {
        self.chat_calls
            .lock()
            .unwrap()
            .push((messages.to_vec(), temperature));
        self.chat_queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Self::no_response("chat")))
    }

    fn embedding_model(&self) -> &str {
        "mock-embedding-model"
    }

    fn reranker_model(&self) -> &str {
        "mock-reranker-model"
    }

    fn chat_model(&self) -> &str {
        "mock-chat-model"
    }
}
