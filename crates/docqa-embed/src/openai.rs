//! OpenAI `/embeddings` client.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use docqa_core::config::OpenAiSettings;
use docqa_core::traits::Embedder;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    encoding_format: &'static str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

pub struct OpenAiEmbedder {
    client: reqwest::blocking::Client,
    api_key: String,
    endpoint: String,
    model: String,
    dim: usize,
}

impl OpenAiEmbedder {
    /// Builds a client for `settings.embedding_model`.
    ///
    /// For models whose dimensionality is not known up front, one probe
    /// request is made to find it.
    pub fn new(settings: &OpenAiSettings, api_key: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("failed to create HTTP client")?;
        let mut embedder = Self {
            client,
            api_key: api_key.to_string(),
            endpoint: format!("{}/embeddings", settings.base_url.trim_end_matches('/')),
            model: settings.embedding_model.clone(),
            dim: known_dim(&settings.embedding_model).unwrap_or(0),
        };
        if embedder.dim == 0 {
            embedder.dim = embedder.request(&["dimension probe".to_string()])?
                .first()
                .map(Vec::len)
                .ok_or_else(|| anyhow!("embedding probe returned no vector"))?;
            debug!(model = %embedder.model, dim = embedder.dim, "probed embedding dimension");
        }
        Ok(embedder)
    }

    fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest { model: &self.model, input: texts, encoding_format: "float" };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .context("embedding request failed")?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            bail!("rate limited by the OpenAI embeddings API");
        }
        let body = response.text().context("failed to read embedding response")?;
        if !status.is_success() {
            bail!("embedding request failed: {}", api_error_message(status.as_u16(), &body));
        }
        parse_embeddings(&body, texts.len())
    }
}

impl Embedder for OpenAiEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts)
    }
}

pub fn known_dim(model: &str) -> Option<usize> {
    match model {
        "text-embedding-ada-002" | "text-embedding-3-small" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        _ => None,
    }
}

/// Extracts the vectors from a response body, in input order.
fn parse_embeddings(body: &str, expected: usize) -> Result<Vec<Vec<f32>>> {
    let mut parsed: EmbeddingResponse = serde_json::from_str(body).context("failed to parse embedding response")?;
    if parsed.data.len() != expected {
        bail!("asked for {} embeddings, got {}", expected, parsed.data.len());
    }
    parsed.data.sort_by_key(|d| d.index);
    Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
}

pub(crate) fn api_error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => format!("HTTP {status}: {}", err.error.message),
        Err(_) => format!("HTTP {status}: {body}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectors_are_returned_in_input_order() {
        let body = r#"{"object":"list","data":[
            {"object":"embedding","index":1,"embedding":[0.0,1.0]},
            {"object":"embedding","index":0,"embedding":[1.0,0.0]}
        ],"model":"text-embedding-ada-002"}"#;
        let vectors = parse_embeddings(body, 2).expect("parse");
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn short_responses_are_rejected() {
        let body = r#"{"data":[{"index":0,"embedding":[1.0]}]}"#;
        assert!(parse_embeddings(body, 2).is_err());
    }

    #[test]
    fn api_errors_use_the_server_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(api_error_message(401, body), "HTTP 401: Incorrect API key provided");
        assert_eq!(api_error_message(502, "bad gateway"), "HTTP 502: bad gateway");
    }

    #[test]
    fn known_models_have_fixed_dimensions() {
        assert_eq!(known_dim("text-embedding-ada-002"), Some(1536));
        assert_eq!(known_dim("text-embedding-3-large"), Some(3072));
        assert_eq!(known_dim("my-custom-model"), None);
    }
}
