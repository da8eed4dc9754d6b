//! Google Gemini `generateContent` backend

use crate::http_client::{HttpClient, HttpParams};
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};
use archsmith_config::Config;
use archsmith_utils::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub(crate) struct GeminiBackend {
    client: HttpClient,
    base_url: String,
    api_key: String,
    default_model: String,
    default_params: HttpParams,
}

impl GeminiBackend {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be built
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        default_model: String,
        default_params: HttpParams,
    ) -> Result<Self, LlmError> {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            client: HttpClient::new()?,
            base_url,
            api_key,
            default_model,
            default_params,
        })
    }

    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` when the API key variable is unset or empty
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let provider = &config.llm.gemini;
        let api_key = std::env::var(&provider.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                LlmError::Misconfiguration(format!(
                    "Gemini API key not found in environment variable '{}'. \
                     Set this variable or configure a different api_key_env in [llm.gemini].",
                    provider.api_key_env
                ))
            })?;

        Self::new(
            api_key,
            provider.base_url.clone(),
            provider.model.clone(),
            HttpParams {
                max_tokens: config.generation.max_output_tokens,
                temperature: config.generation.temperature,
            },
        )
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    /// Gemini names the assistant role `model` and takes system text separately.
    fn build_request(messages: &[Message], params: HttpParams) -> GeminiRequest {
        let system_text = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let contents = messages
            .iter()
            .filter_map(|m| {
                let role = match m.role {
                    Role::System => return None,
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                Some(GeminiContent {
                    role: Some(role),
                    parts: vec![GeminiPart {
                        text: m.content.clone(),
                    }],
                })
            })
            .collect();

        GeminiRequest {
            system_instruction: (!system_text.is_empty()).then(|| GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: system_text }],
            }),
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: params.max_tokens,
                temperature: params.temperature,
            },
        }
    }

    fn extract_text(response: &GeminiResponse) -> String {
        response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let (model, params) = self.default_params.resolve(&self.default_model, &inv);

        debug!(
            provider = "gemini",
            session_id = %inv.session_id,
            task = %inv.task,
            model = %model,
            max_tokens = params.max_tokens,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking Gemini backend"
        );

        let body = Self::build_request(&inv.messages, params);
        let request = self
            .client
            .post(&self.endpoint(&model))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body);

        let response = self
            .client
            .execute_with_retry(request, inv.timeout, "gemini")
            .await?;

        let response_body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("Failed to parse Gemini response: {e}")))?;

        let content = Self::extract_text(&response_body);
        if content.is_empty() {
            let reason = response_body
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone())
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(LlmError::Transport(format!(
                "Gemini response missing text content ({reason})"
            )));
        }

        let mut result = LlmResult::new(content, "gemini", model);
        if let Some(usage) = response_body.usage_metadata {
            result = result.with_tokens(
                usage.prompt_token_count.unwrap_or(0),
                usage.candidates_token_count.unwrap_or(0),
            );
        }

        debug!(
            provider = "gemini",
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "Gemini invocation completed"
        );

        Ok(result)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base_url: Option<&str>) -> GeminiBackend {
        GeminiBackend::new(
            "key".to_string(),
            base_url.map(str::to_string),
            "gemini-2.5-flash".to_string(),
            HttpParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_uses_model_and_trims_base() {
        let backend = backend(Some("http://localhost:8080/v1beta/"));
        assert_eq!(
            backend.endpoint("gemini-2.5-pro"),
            "http://localhost:8080/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn test_build_request_shape() {
        let messages = vec![
            Message::system("Be precise."),
            Message::user("We need a booking system"),
            Message::assistant("How many users?"),
            Message::user("About 5000"),
        ];
        let request = GeminiBackend::build_request(
            &messages,
            HttpParams {
                max_tokens: 100,
                temperature: 0.5,
            },
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Be precise.");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"].as_array().unwrap().len(), 3);
        assert_eq!(json["contents"][1]["role"], "model");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 100);
    }

    #[test]
    fn test_build_request_without_system_text() {
        let request =
            GeminiBackend::build_request(&[Message::user("hi")], HttpParams::default());
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn test_extract_text_from_first_candidate() {
        let response: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "## Executive"}, {"text": " Summary"}], "role": "model"},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 40, "candidatesTokenCount": 7}
        }))
        .unwrap();
        assert_eq!(GeminiBackend::extract_text(&response), "## Executive Summary");
        assert_eq!(
            response.usage_metadata.unwrap().candidates_token_count,
            Some(7)
        );
    }

    #[test]
    fn test_extract_text_empty_when_blocked() {
        let response: GeminiResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();
        assert_eq!(GeminiBackend::extract_text(&response), "");
    }
}
