//! Completion client for the `generateContent` endpoint.
//!
//! [`CompletionClient::complete`] turns a transcript into exactly one reply
//! string. Rate-limited responses are retried with exponential backoff, the
//! request is bound to the token armed in the caller's [`CancelSlot`], and
//! every failure is folded into a user-facing string. Programmatic callers
//! that need the failure kind use [`CompletionClient::complete_detailed`].

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::api::{Content, GenerateContentRequest, GenerateContentResponse, Part};
use crate::core::cancel::CancelSlot;
use crate::core::transcript::Transcript;
use crate::utils::url::{construct_api_url, generate_content_path};


pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Reply recorded when the user cancels the in-flight request.
pub const CANCELLED_REPLY: &str = "⏹ Request paused by user.";
/// Reply recorded for every other failure.
pub const FAILURE_REPLY: &str = "Something went wrong while talking to Gemini.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts allowed after a 429.
    pub max_retries: u32,
    /// Wait before the first retry; doubles for each subsequent one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(3000),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (zero-based): `base * 2^retry`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    Api,
    EmptyReply,
    Network,
    Cancelled,
}

#[derive(Debug)]
pub enum CompletionError {
    /// Still rate-limited after the retry ceiling was reached.
    RateLimited { status: u16, body: String },

    /// Any other non-success status.
    Api { status: u16, body: String },

    /// Success status, but no reply text at the expected path.
    EmptyReply,

    /// The success body was not valid JSON of the expected shape.
    Decode(serde_json::Error),

    /// Transport-level failure.
    Network(reqwest::Error),

    /// The cancellation token fired.
    Cancelled,
}

impl CompletionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CompletionError::RateLimited { .. } => FailureKind::RateLimited,
            CompletionError::Api { .. } => FailureKind::Api,
            CompletionError::EmptyReply | CompletionError::Decode(_) => FailureKind::EmptyReply,
            CompletionError::Network(_) => FailureKind::Network,
            CompletionError::Cancelled => FailureKind::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CompletionError::Cancelled)
    }

    /// Text shown to the user in place of a reply.
    pub fn user_message(&self) -> &'static str {
        if self.is_cancelled() {
            CANCELLED_REPLY
        } else {
            FAILURE_REPLY
        }
    }
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionError::RateLimited { status, body } => {
                write!(f, "API Error: {status} (rate limited) - {}", body.trim())
            }
            CompletionError::Api { status, body } => {
                write!(f, "API Error: {status} - {}", body.trim())
            }
            CompletionError::EmptyReply => write!(f, "Empty response from Gemini."),
            CompletionError::Decode(err) => write!(f, "Malformed response from Gemini: {err}"),
            CompletionError::Network(err) => write!(f, "Request failed: {err}"),
            CompletionError::Cancelled => write!(f, "Request cancelled"),
        }
    }
}

impl StdError for CompletionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            CompletionError::Decode(err) => Some(err),
            CompletionError::Network(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        // The endpoint URL carries the API key as a query parameter.
        CompletionError::Network(err.without_url())
    }
}

impl From<serde_json::Error> for CompletionError {
    fn from(err: serde_json::Error) -> Self {
        CompletionError::Decode(err)
    }
}

enum Attempt {
    Reply(String),
    RateLimited { status: u16, body: String },
}

#[derive(Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl CompletionClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Endpoint URL without the credential; the key is added per request.
    pub fn endpoint_url(&self) -> String {
        construct_api_url(
            &self.config.base_url,
            &generate_content_path(&self.config.model),
        )
    }

    pub fn request_body(transcript: &Transcript) -> GenerateContentRequest {
        let contents = transcript
            .iter()
            .map(|message| Content {
                role: message.role.to_api_role().to_string(),
                parts: vec![Part {
                    text: message.content.clone(),
                }],
            })
            .collect();
        GenerateContentRequest { contents }
    }

    /// Request a reply for `transcript`. Never fails: cancellation and errors
    /// come back as their user-facing text.
    pub async fn complete(&self, transcript: &Transcript, slot: &CancelSlot) -> String {
        match self.complete_detailed(transcript, slot).await {
            Ok(reply) => reply,
            Err(CompletionError::Cancelled) => {
                info!("completion request cancelled by user");
                CANCELLED_REPLY.to_string()
            }
            Err(err) => {
                error!(kind = ?err.kind(), "completion request failed: {err}");
                err.user_message().to_string()
            }
        }
    }

    pub async fn complete_detailed(
        &self,
        transcript: &Transcript,
        slot: &CancelSlot,
    ) -> Result<String, CompletionError> {
        let body = Self::request_body(transcript);
        let armed = slot.arm();
        self.run(&body, &armed.token).await
    }

    async fn run(
        &self,
        body: &GenerateContentRequest,
        cancel_token: &CancellationToken,
    ) -> Result<String, CompletionError> {
        let url = self.endpoint_url();
        let policy = &self.config.retry;
        let mut retry = 0;

        loop {
            debug!(
                attempt = retry + 1,
                turns = body.contents.len(),
                "dispatching completion request"
            );

            let attempt = tokio::select! {
                biased;
                _ = cancel_token.cancelled() => return Err(CompletionError::Cancelled),
                outcome = self.attempt(&url, body) => outcome?,
            };

            match attempt {
                Attempt::Reply(reply) => return Ok(reply),
                Attempt::RateLimited { .. } if retry < policy.max_retries => {
                    let delay = policy.delay_for(retry);
                    warn!(
                        delay_ms = delay.as_millis() as u64,
                        attempt = retry + 1,
                        "rate limited; retrying"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel_token.cancelled() => return Err(CompletionError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    retry += 1;
                }
                Attempt::RateLimited { status, body } => {
                    return Err(CompletionError::RateLimited { status, body });
                }
            }
        }
    }

    async fn attempt(
        &self,
        url: &str,
        body: &GenerateContentRequest,
    ) -> Result<Attempt, CompletionError> {
        let response = self
            .http
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Ok(Attempt::RateLimited {
                status: status.as_u16(),
                body,
            });
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let parsed: GenerateContentResponse = serde_json::from_slice(&bytes)?;
        parsed
            .reply_text()
            .map(|text| Attempt::Reply(text.to_string()))
            .ok_or(CompletionError::EmptyReply)
    }
}
