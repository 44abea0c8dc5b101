//! OpenAI-compatible HTTP implementations of `continuum_core`'s
//! `LlmProvider`/`EmbeddingProvider` contracts. `continuum-core` itself
//! deliberately carries no concrete provider (spec §1's "hosting LLMs" is
//! a non-goal); this binary, as a host, supplies one the same way the
//! original service's NVIDIA/Bedrock providers wrap a single
//! OpenAI-compatible chat/embeddings endpoint.

use async_trait::async_trait;
use continuum_core::llm::{ChatMessage, ChatRole, EmbeddingProvider, LlmProvider, LlmUsage};
use continuum_core::resilience::is_retryable_http_status;
use continuum_types::CoreError;
use futures::stream::{self, BoxStream};
use reqwest::Client;
use serde_json::json;

/// Classify a non-2xx upstream response: transient statuses (429/500/502/
/// 503/504) are retryable, everything else is a permanent rejection.
fn classify_http_error(status: u16, body: String) -> CoreError {
    if is_retryable_http_status(status) {
        CoreError::UpstreamFailure(format!("status {status}: {body}"))
    } else {
        CoreError::UpstreamRejected { status, message: body }
    }
}

pub struct HttpLlmProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpLlmProvider {
    #[must_use]
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> Self {
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

    async fn generate(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<(String, LlmUsage), CoreError> {
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

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CoreError::Internal(format!("llm response was not valid json: {e}")))?;

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

pub struct HttpEmbeddingProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    dimensions: usize,
}

impl HttpEmbeddingProvider {
    #[must_use]
    pub fn new(base_url: String, api_key: Option<String>, model: String, dimensions: usize) -> Self {
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

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CoreError::Internal(format!("embedding response was not valid json: {e}")))?;

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
