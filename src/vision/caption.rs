// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Captioning sidecar client via OpenAI-compatible API

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use tracing::{debug, info};

use crate::vision::capabilities::Captioner;

// --- OpenAI-compatible serde structs ---

#[derive(serde::Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(serde::Serialize)]
struct ChatMessage {
    role: String,
    content: serde_json::Value,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    content: String,
}

const CAPTION_PROMPT: &str = "Describe this image in one sentence.";

/// Client for calling a captioning sidecar via OpenAI-compatible API
pub struct CaptionClient {
    client: Client,
    endpoint: String,
    model_name: String,
}

impl CaptionClient {
    /// Create a new caption client
    pub fn new(endpoint: &str, model_name: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!(
            "Caption client configured: endpoint={}, model={}",
            endpoint, model_name
        );

        Ok(Self {
            client,
            endpoint,
            model_name: model_name.to_string(),
        })
    }

    /// Get the model name
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[async_trait]
impl Captioner for CaptionClient {
    async fn caption(&self, image_bytes: &[u8], format: &str) -> Result<String> {
        let start = std::time::Instant::now();
        let data_url = format!(
            "data:image/{};base64,{}",
            format,
            STANDARD.encode(image_bytes)
        );

        let request = ChatRequest {
            model: self.model_name.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: serde_json::json!([
                    {"type": "text", "text": CAPTION_PROMPT},
                    {"type": "image_url", "image_url": {"url": data_url}}
                ]),
            }],
            max_tokens: 100,
            temperature: 0.3,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .json(&request)
            .send()
            .await?;

        let chat_response: ChatResponse = response.json().await?;
        let description = chat_response
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();

        // An empty result counts as a capability failure
        if description.is_empty() {
            return Err(anyhow!("caption capability returned an empty description"));
        }

        info!(
            "Caption complete: {} chars, {}ms (model: {})",
            description.len(),
            start.elapsed().as_millis(),
            self.model_name
        );

        Ok(description)
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/health", self.endpoint))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("Caption health check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_client_new() {
        let client = CaptionClient::new("http://localhost:8081", "paligemma-3b").unwrap();
        assert_eq!(client.endpoint, "http://localhost:8081");
        assert_eq!(client.model_name, "paligemma-3b");
    }

    #[test]
    fn test_caption_client_trailing_slash_trimmed() {
        let client = CaptionClient::new("http://localhost:8081/", "test").unwrap();
        assert_eq!(client.endpoint, "http://localhost:8081");
    }

    #[test]
    fn test_caption_client_model_name() {
        let client = CaptionClient::new("http://localhost:8081", "paligemma-3b-448").unwrap();
        assert_eq!(client.model_name(), "paligemma-3b-448");
    }

    #[tokio::test]
    async fn test_caption_client_health_check_unreachable() {
        let client = CaptionClient::new("http://127.0.0.1:59999", "test-model").unwrap();
        let healthy = client.health_check().await;
        assert!(!healthy);
    }

    #[test]
    fn test_caption_request_format() {
        let request = ChatRequest {
            model: "paligemma-3b".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: serde_json::json!([
                    {"type": "text", "text": CAPTION_PROMPT},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,abc123"}}
                ]),
            }],
            max_tokens: 100,
            temperature: 0.3,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "paligemma-3b");
        assert_eq!(json["max_tokens"], 100);
        let content = &json["messages"][0]["content"];
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[1]["type"], "image_url");
    }

    #[test]
    fn test_caption_response_parsing() {
        let json = serde_json::json!({
            "choices": [{
                "message": {
                    "content": "A red apple on a wooden table."
                }
            }]
        });
        let response: ChatResponse = serde_json::from_value(json).unwrap();
        assert_eq!(
            response.choices[0].message.content,
            "A red apple on a wooden table."
        );
    }

    #[test]
    fn test_caption_prompt_is_brief() {
        assert_eq!(CAPTION_PROMPT, "Describe this image in one sentence.");
    }
}
