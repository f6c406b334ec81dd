use serde::{Deserialize, Serialize};

use crate::config::GatewayConfig;

#[derive(Clone, Debug, Serialize)]
pub struct GatewayAvailableModel {
    pub model_name: &'static str,
    pub model_source: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub enum Provider {
    OpenRouter {
        /// Name of the environment variable holding the key, read at call time.
        api_key: String,
        endpoint_url: String,
        default_model: String,
        site_url: String,
        app_name: String,
        available_models: Vec<GatewayAvailableModel>,
    },
}

pub const GATEWAY_MODELS: &[GatewayAvailableModel] = &[
    GatewayAvailableModel {
        model_name: "google/gemini-2.5-flash",
        model_source: "google",
    },
    GatewayAvailableModel {
        model_name: "qwen/qwen3-32b",
        model_source: "cerebras",
    },
];

pub const DEFAULT_GATEWAY_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            format_type: "json_object".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionResponseMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionChoice {
    pub message: ChatCompletionResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub index: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: Option<u32>,
    pub total_tokens: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    pub usage: Option<ChatCompletionUsage>,
}

impl Provider {
    pub fn openrouter(config: &GatewayConfig) -> Self {
        Self::OpenRouter {
            api_key: config.api_key_env_var.clone(),
            endpoint_url: config.endpoint_url.clone(),
            default_model: config.model.clone(),
            site_url: config.site_url.clone(),
            app_name: config.app_name.clone(),
            available_models: GATEWAY_MODELS.to_vec(),
        }
    }

    pub fn default_model(&self) -> &str {
        match self {
            Provider::OpenRouter { default_model, .. } => default_model,
        }
    }

    /// Whether `model` is one of the models this gateway is known to serve.
    pub fn is_known_model(&self, model: &str) -> bool {
        match self {
            Provider::OpenRouter {
                available_models, ..
            } => available_models.iter().any(|known| known.model_name == model),
        }
    }

    /// Builds a JSON-mode request against the provider's default model.
    pub fn json_request(&self, system_prompt: String, user_prompt: String) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.default_model().to_string(),
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(user_prompt)],
            response_format: Some(ResponseFormat::json_object()),
            temperature: Some(0.3),
            max_tokens: Some(2048),
        }
    }
}
