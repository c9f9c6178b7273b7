//! OpenRouter API client for chat completions.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::config::OpenRouterConfig;

use super::error::{ApiErrorResponse, OpenRouterError};
use super::types::{ChatRequest, ChatResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Seam between the chat orchestrator and real HTTP.
///
/// The orchestrator is generic over this trait so its fallback behavior can
/// be tested with a scripted backend instead of live requests.
pub trait CompletionBackend: Send + Sync {
    /// Execute one chat completion request.
    fn complete(
        &self,
        request: ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, OpenRouterError>> + Send;
}

/// OpenRouter API client.
///
/// Cheap to clone; the underlying HTTP client and configuration are shared.
#[derive(Clone)]
pub struct OpenRouterClient {
    inner: Arc<OpenRouterClientInner>,
}

struct OpenRouterClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl OpenRouterClient {
    /// Create a new OpenRouter client.
    ///
    /// # Arguments
    ///
    /// * `config` - OpenRouter configuration containing API key and base URL
    ///
    /// # Panics
    ///
    /// Panics if the API key contains invalid header characters.
    #[must_use]
    pub fn new(config: &OpenRouterConfig) -> Self {
        let api_key = config.api_key.expose_secret();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .expect("Invalid API key for header"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            inner: Arc::new(OpenRouterClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        }
    }

    /// Send one chat completion request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API reports an error, or
    /// the response body cannot be parsed.
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn chat_completion(
        &self,
        request: ChatRequest,
    ) -> Result<ChatResponse, OpenRouterError> {
        let url = format!("{}/chat/completions", self.inner.base_url);
        let model = request.model.clone();

        let response = self.inner.client.post(&url).json(&request).send().await?;

        Self::handle_response(response, &model).await
    }

    /// Fold a response into a completion or a classified error.
    async fn handle_response(
        response: reqwest::Response,
        model: &str,
    ) -> Result<ChatResponse, OpenRouterError> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            let parse_err = match serde_json::from_str::<ChatResponse>(&body) {
                Ok(parsed) => return Ok(parsed),
                Err(e) => e,
            };
            // Some providers report failures as a 200 with an error envelope
            // instead of a completion.
            if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(OpenRouterError::classify(
                    status,
                    model,
                    api_error.error.message,
                ));
            }
            return Err(OpenRouterError::Parse(format!(
                "Failed to parse response: {parse_err}"
            )));
        }

        let message = serde_json::from_str::<ApiErrorResponse>(&body)
            .map_or(body, |api_error| api_error.error.message);
        Err(OpenRouterError::classify(status, model, message))
    }
}

impl CompletionBackend for OpenRouterClient {
    fn complete(
        &self,
        request: ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse, OpenRouterError>> + Send {
        self.chat_completion(request)
    }
}
