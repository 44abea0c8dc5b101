//! Decision Memory Agent - Edge Function Entry Point
//!
//! This binary provides a standalone HTTP entry point for deploying the
//! Decision Memory Agent in front of a shared `Continuum` instance.
//!
//! # Deployment
//! - Stateless HTTP surface; all durable state lives in the `sled` store at
//!   `CONTINUUM_DB_PATH`
//! - No direct storage access from this binary beyond opening that store —
//!   everything else goes through `continuum-core`
//!
//! # Environment Variables
//! - `CONTINUUM_DB_PATH`: path to the graph storage directory (default: `./data`)
//! - `CONTINUUM_USER_ID`: user id this instance persists decisions under (default: `edge-function`)
//! - `CONTINUUM_LLM_BASE_URL`: base URL of the OpenAI-compatible LLM/embedding endpoint
//! - `CONTINUUM_LLM_API_KEY`: API key for that endpoint
//! - `CONTINUUM_LLM_MODEL`, `CONTINUUM_EMBEDDING_MODEL`: model names
//! - `STRICT_VALIDATION`, `COMPUTE_EMBEDDINGS`, `APPLY_PII_REDACTION`, `MAX_ARTIFACTS`,
//!   `MAX_ARTIFACT_CONTENT_SIZE`: agent-level capture settings
//! - `PORT`: port to listen on (default: 8080)
//! - `RUST_LOG`: logging level (default: info)

use async_trait::async_trait;
use continuum_core::llm::{ChatMessage, ChatRole, EmbeddingProvider, LlmProvider, LlmUsage};
use continuum_core::resilience::is_retryable_http_status;
use continuum_core::{Config, Continuum};
use continuum_types::{CoreError, UserId};
use decision_memory_agent::agent::AgentConfig;
use decision_memory_agent::handler::EdgeFunctionHandler;
use decision_memory_agent::persistence::ContinuumPersistence;
use futures::stream::{self, BoxStream};
use reqwest::Client;
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// OpenAI-compatible chat completion provider. `continuum-core` deliberately
/// carries no concrete `LlmProvider` (hosting LLMs is out of scope for it);
/// this binary, as a host, supplies one.
struct HttpLlmProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpLlmProvider {
    fn new(base_url: String, api_key: Option<String>, model: String) -> Self {
        Self { client: Client::new(), base_url, api_key, model }
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let mut builder = self.client.post(url);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }
}

/// Classify a non-2xx upstream response: transient statuses (429/500/502/
/// 503/504) are retryable, everything else is a permanent rejection.
/// Mirrors `continuum-cli/src/llm_http.rs`'s classifier (duplicated, not
/// imported — `continuum-cli` is a bin-only crate with no lib target).
fn classify_http_error(status: u16, body: String) -> CoreError {
    if is_retryable_http_status(status) {
        CoreError::UpstreamFailure(format!("status {status}: {body}"))
    } else {
        CoreError::UpstreamRejected { status, message: body }
    }
}

fn role_str(role: ChatRole) -> &'static str {
    match role {
        ChatRole::System => "system",
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    }
}

#[async_trait]
impl LlmProvider for HttpLlmProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, messages: &[ChatMessage], temperature: f32, max_tokens: u32) -> Result<(String, LlmUsage), CoreError> {
        let body = json!({
            "model": self.model,
            "messages": messages.iter().map(|m| json!({"role": role_str(m.role), "content": m.content})).collect::<Vec<_>>(),
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        let response = self
            .request("chat/completions")
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::UpstreamFailure(format!("llm request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_http_error(status.as_u16(), text));
        }

        let parsed: serde_json::Value =
            response.json().await.map_err(|e| CoreError::Internal(format!("llm response was not valid json: {e}")))?;

        let content = parsed["choices"][0]["message"]["content"].as_str().unwrap_or_default().to_string();
        let usage = LlmUsage {
            prompt_tokens: parsed["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            completion_tokens: parsed["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
            total_tokens: parsed["usage"]["total_tokens"].as_u64().unwrap_or(0) as u32,
        };
        Ok((content, usage))
    }

    async fn generate_stream(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<BoxStream<'static, Result<String, CoreError>>, CoreError> {
        let (text, _usage) = self.generate(messages, temperature, max_tokens).await?;
        Ok(Box::pin(stream::iter(vec![Ok(text)])))
    }
}

/// OpenAI-compatible embedding provider.
struct HttpEmbeddingProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    dimensions: usize,
}

impl HttpEmbeddingProvider {
    fn new(base_url: String, api_key: Option<String>, model: String, dimensions: usize) -> Self {
        Self { client: Client::new(), base_url, api_key, model, dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, texts: &[String], input_type: &str) -> Result<Vec<Vec<f32>>, CoreError> {
        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
        let mut builder = self.client.post(url);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let body = json!({
            "model": self.model,
            "input": texts,
            "encoding_format": "float",
            "input_type": input_type,
        });

        let response = builder
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::UpstreamFailure(format!("embedding request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_http_error(status.as_u16(), text));
        }

        let parsed: serde_json::Value =
            response.json().await.map_err(|e| CoreError::Internal(format!("embedding response was not valid json: {e}")))?;

        let data = parsed["data"].as_array().cloned().unwrap_or_default();
        Ok(data
            .into_iter()
            .map(|entry| {
                entry["embedding"]
                    .as_array()
                    .map(|values| values.iter().filter_map(serde_json::Value::as_f64).map(|v| v as f32).collect())
                    .unwrap_or_default()
            })
            .collect())
    }
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(env::var("RUST_LOG").map(|v| v.parse().unwrap_or(Level::INFO)).unwrap_or(Level::INFO))
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .init();
    let _ = subscriber;

    info!(
        agent_id = decision_memory_agent::constants::AGENT_ID,
        agent_version = decision_memory_agent::constants::AGENT_VERSION,
        classification = decision_memory_agent::constants::CLASSIFICATION,
        "Starting Decision Memory Agent Edge Function"
    );

    let db_path: PathBuf = env::var("CONTINUUM_DB_PATH").unwrap_or_else(|_| "./data".to_string()).into();
    let user_id = UserId::from(env::var("CONTINUUM_USER_ID").unwrap_or_else(|_| "edge-function".to_string()));

    let config = Config::from_env();
    let llm_base_url = env::var("CONTINUUM_LLM_BASE_URL").unwrap_or_else(|_| "https://api.example-llm-provider.invalid/v1".to_string());
    let llm_api_key = env::var("CONTINUUM_LLM_API_KEY").ok();
    let llm_model = env::var("CONTINUUM_LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
    let embedding_model = env::var("CONTINUUM_EMBEDDING_MODEL").unwrap_or_else(|_| "text-embedding-3-small".to_string());

    let llm_provider = Arc::new(HttpLlmProvider::new(llm_base_url.clone(), llm_api_key.clone(), llm_model));
    let embedding_provider = Arc::new(HttpEmbeddingProvider::new(llm_base_url, llm_api_key, embedding_model, config.embedding_dimension));

    let continuum = match Continuum::open(&db_path, config, llm_provider, None, embedding_provider) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Failed to open Continuum store at {}: {e}", db_path.display());
            std::process::exit(1);
        }
    };

    let persistence = Arc::new(ContinuumPersistence::new(continuum, user_id));

    let agent_config = AgentConfig {
        strict_validation: env::var("STRICT_VALIDATION").map(|v| v == "true" || v == "1").unwrap_or(true),
        compute_embeddings: env::var("COMPUTE_EMBEDDINGS").map(|v| v == "true" || v == "1").unwrap_or(false),
        apply_pii_redaction: env::var("APPLY_PII_REDACTION").map(|v| v == "true" || v == "1").unwrap_or(false),
        max_artifacts: env::var("MAX_ARTIFACTS").ok().and_then(|v| v.parse().ok()).unwrap_or(100),
        max_artifact_content_size: env::var("MAX_ARTIFACT_CONTENT_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(1024 * 1024),
    };

    let handler = Arc::new(EdgeFunctionHandler::new(persistence, agent_config));

    let routes = EdgeFunctionHandler::routes(handler);

    let port: u16 = env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080);
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    info!(port = port, "Decision Memory Agent listening");

    warp::serve(routes).run(addr).await;
}
