//! OpenAI `/chat/completions` client.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use docqa_core::config::OpenAiSettings;
use docqa_core::traits::CompletionModel;
use docqa_core::types::PromptMessage;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

pub struct ChatClient {
    client: reqwest::blocking::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl ChatClient {
    pub fn new(settings: &OpenAiSettings, api_key: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            endpoint: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            model: settings.chat_model.clone(),
        })
    }
}

impl CompletionModel for ChatClient {
    fn complete(&self, messages: &[PromptMessage]) -> Result<String> {
        let request = ChatRequest { model: &self.model, messages };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .context("chat completion request failed")?;

        let status = response.status();
        let body = response.text().context("failed to read chat completion response")?;
        if !status.is_success() {
            bail!("chat completion failed: {}", api_error_message(status.as_u16(), &body));
        }
        let text = parse_completion(&body)?;
        debug!(model = %self.model, chars = text.len(), "completion received");
        Ok(text)
    }
}

/// Text of the first choice.
fn parse_completion(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body).context("failed to parse chat completion response")?;
    let choice = parsed.choices.into_iter().next().ok_or_else(|| anyhow!("chat completion returned no choices"))?;
    Ok(choice.message.content.unwrap_or_default())
}

fn api_error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => format!("HTTP {status}: {}", err.error.message),
        Err(_) => format!("HTTP {status}: {body}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_choice_is_the_answer() {
        let body = r#"{"id":"chatcmpl-1","object":"chat.completion","choices":[
            {"index":0,"message":{"role":"assistant","content":"Boil it for a minute."},"finish_reason":"stop"},
            {"index":1,"message":{"role":"assistant","content":"ignored"},"finish_reason":"stop"}
        ]}"#;
        assert_eq!(parse_completion(body).expect("parse"), "Boil it for a minute.");
    }

    #[test]
    fn no_choices_is_an_error() {
        assert!(parse_completion(r#"{"choices":[]}"#).is_err());
        assert!(parse_completion("not json").is_err());
    }

    #[test]
    fn null_content_becomes_empty_text() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert_eq!(parse_completion(body).expect("parse"), "");
    }

    #[test]
    fn request_body_uses_chat_message_shape() {
        let messages = [PromptMessage::system("be brief"), PromptMessage::user("hi")];
        let json = serde_json::to_value(ChatRequest { model: "gpt-3.5-turbo", messages: &messages }).expect("json");
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn api_errors_use_the_server_message() {
        let body = r#"{"error":{"message":"The model does not exist","type":"invalid_request_error"}}"#;
        assert_eq!(api_error_message(404, body), "HTTP 404: The model does not exist");
        assert_eq!(api_error_message(503, "upstream unavailable"), "HTTP 503: upstream unavailable");
    }
}
