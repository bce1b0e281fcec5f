// Generation client - the seam between the batch loop and the remote model

use super::types::ImageHandle;
use crate::config::AnalyzerConfig;
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Anything that turns one image plus a prompt into generated text
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate text for a single image
    async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        image: &ImageHandle,
    ) -> Result<String, ClientError>;

    /// Model identifier requests are sent to
    fn model(&self) -> &str;
}

/// Google Gemini `generateContent` client
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl GeminiClient {
    /// Create a client from configuration
    pub fn with_config(config: &AnalyzerConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
    }

    fn build_request<'a>(prompt: &'a str, image: &'a ImageHandle) -> GenerateContentRequest<'a> {
        let data = base64::engine::general_purpose::STANDARD.encode(image.bytes());

        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text(prompt),
                    Part::InlineData(InlineData {
                        mime_type: image.mime_type(),
                        data,
                    }),
                ],
            }],
        }
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        image: &ImageHandle,
    ) -> Result<String, ClientError> {
        let request = Self::build_request(prompt, image);

        debug!(
            model = %self.model,
            filename = %image.filename,
            bytes = image.bytes().len(),
            "sending generateContent request"
        );

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ClientError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::ParseError(e.to_string()))?;

        parsed.into_text()
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum Part<'a> {
    Text(&'a str),
    InlineData(InlineData),
}

#[derive(Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl GenerateContentResponse {
    /// Join the text parts of the first candidate
    fn into_text(self) -> Result<String, ClientError> {
        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(ClientError::EmptyResponse(
                block_reason.unwrap_or_else(|| "no candidates returned".to_string()),
            ));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ClientError::EmptyResponse(format!(
                "finish reason: {}",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Empty response: {0}")]
    EmptyResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::ImageKind;
    use mockito::Matcher;

    fn test_image() -> ImageHandle {
        ImageHandle::new("cat.png", ImageKind::Png, 1, 1, vec![0x89u8, b'P', b'N', b'G'])
    }

    fn client_for(server: &mockito::ServerGuard) -> GeminiClient {
        let config = AnalyzerConfig {
            endpoint: server.url(),
            ..AnalyzerConfig::default()
        };
        GeminiClient::with_config(&config).unwrap()
    }

    #[test]
    fn test_request_shape() {
        let image = test_image();
        let request = GeminiClient::build_request("Describe the cats", &image);
        let json = serde_json::to_value(&request).unwrap();

        let parts = &json["contents"][0]["parts"];
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(parts[0]["text"], "Describe the cats");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[1]["inline_data"]["data"], "iVBORw==");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"A "},{"text":"cat"}]},"finishReason":"STOP"}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.into_text().unwrap(), "A cat");
    }

    #[test]
    fn test_blocked_prompt_is_empty_response() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        let err = parsed.into_text().unwrap_err();
        assert!(matches!(err, ClientError::EmptyResponse(ref r) if r == "SAFETY"));
    }

    #[tokio::test]
    async fn test_generate_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#""text":"Describe the cats""#.to_string()),
                Matcher::Regex(r#""mime_type":"image/png""#.to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"Two cats on a sofa"}]}}]}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let text = client
            .generate("test-key", "Describe the cats", &test_image())
            .await
            .unwrap();

        assert_eq!(text, "Two cats on a sofa");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_message_is_extracted() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .with_status(429)
            .with_body(r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .generate("test-key", "x", &test_image())
            .await
            .unwrap_err();

        match err {
            ClientError::ApiError { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Quota exceeded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .generate("test-key", "x", &test_image())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::ParseError(_)));
    }
}
