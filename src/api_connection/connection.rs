use dotenv::dotenv;
use reqwest::{Client, StatusCode};
use std::env;
use thiserror::Error;
use tracing::{debug, warn};

use super::endpoints::{ChatCompletionRequest, ChatCompletionResponse, Provider};

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Rate limited by the AI gateway: {0}")]
    RateLimited(String),
    #[error("AI gateway requires payment: {0}")]
    PaymentRequired(String),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: StatusCode,
        error_body: String,
    },
    #[error("AI gateway returned an empty response")]
    EmptyResponse,
    #[error("Could not parse AI response: {reason}")]
    UnparseableResponse { reason: String, content: String },
}

impl ApiConnectionError {
    /// Text safe to show to an end user.
    pub fn user_message(&self) -> String {
        match self {
            ApiConnectionError::RateLimited(_) => {
                "Rate limit exceeded, please try again later.".to_string()
            }
            ApiConnectionError::PaymentRequired(_) => {
                "Payment required, please add credits to your AI workspace.".to_string()
            }
            ApiConnectionError::MissingApiKey(key_name) => {
                format!("AI service is not configured ({} is not set).", key_name)
            }
            ApiConnectionError::EmptyResponse | ApiConnectionError::UnparseableResponse { .. } => {
                "The AI service returned an answer that could not be understood.".to_string()
            }
            _ => "AI service error, please try again.".to_string(),
        }
    }
}

/// Maps a non-success gateway status to its error variant.
pub fn classify_status(status: StatusCode, error_body: String) -> ApiConnectionError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ApiConnectionError::RateLimited(error_body),
        StatusCode::PAYMENT_REQUIRED => ApiConnectionError::PaymentRequired(error_body),
        _ => ApiConnectionError::ApiError { status, error_body },
    }
}

/// First choice's message text, trimmed.
pub fn first_content(response: &ChatCompletionResponse) -> Result<String, ApiConnectionError> {
    response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_deref())
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .map(str::to_string)
        .ok_or(ApiConnectionError::EmptyResponse)
}

impl Provider {
    pub async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        match self {
            Provider::OpenRouter {
                api_key: api_key_env_var_name,
                endpoint_url,
                site_url,
                app_name,
                ..
            } => {
                dotenv().ok();
                let actual_api_key = env::var(api_key_env_var_name)
                    .map_err(|_| ApiConnectionError::MissingApiKey(api_key_env_var_name.clone()))?;

                debug!(model = %request.model, url = %endpoint_url, "sending chat completion");

                let response = Client::new()
                    .post(endpoint_url)
                    .bearer_auth(actual_api_key)
                    .header("HTTP-Referer", site_url)
                    .header("X-Title", app_name)
                    .json(&request)
                    .send()
                    .await?;

                let status = response.status();
                if status.is_success() {
                    let chat_response = response.json::<ChatCompletionResponse>().await?;
                    debug!(choices = chat_response.choices.len(), "chat completion received");
                    Ok(chat_response)
                } else {
                    let error_body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    warn!(%status, "AI gateway returned an error");
                    Err(classify_status(status, error_body))
                }
            }
        }
    }
}
