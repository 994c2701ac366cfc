//! Optional plain-language commentary on a finished projection.
//!
//! The projection is always computed before this module runs. Every failure here is
//! logged and turned into a [`NarrativeStatus::Fallback`] message, so a broken or
//! unconfigured text service can never affect the numbers.

mod prompt;
mod sse;

use std::env;
use std::fmt;

use log::{debug, error, warn};
use serde::Serialize;
use serde_json::json;

use crate::core::{CalculationResult, CalculatorInputs};

pub use prompt::build_prompt;
pub use sse::SseDecoder;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const FALLBACK_MESSAGE: &str =
    "Sorry, an insight could not be generated right now. Please check the API configuration.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
}

impl NarrativeConfig {
    pub fn from_env() -> Self {
        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        Self {
            api_key,
            model: env::var("NARRATIVE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            endpoint: env::var("NARRATIVE_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
        }
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Debug)]
pub enum NarrativeError {
    MissingCredential,
    Http(reqwest::Error),
    Status { code: u16, body: String },
    Decode(String),
}

impl fmt::Display for NarrativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NarrativeError::MissingCredential => write!(f, "narrative API key not configured"),
            NarrativeError::Http(e) => write!(f, "narrative request failed: {e}"),
            NarrativeError::Status { code, body } => {
                write!(f, "narrative service returned HTTP {code}: {body}")
            }
            NarrativeError::Decode(msg) => write!(f, "narrative stream decode failed: {msg}"),
        }
    }
}

impl std::error::Error for NarrativeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NarrativeError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for NarrativeError {
    fn from(value: reqwest::Error) -> Self {
        NarrativeError::Http(value)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeStatus {
    Complete,
    /// The stream broke after some text arrived; `text` holds what was received.
    Partial,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Narrative {
    pub status: NarrativeStatus,
    pub text: String,
}

impl Narrative {
    fn fallback() -> Self {
        Self {
            status: NarrativeStatus::Fallback,
            text: FALLBACK_MESSAGE.to_string(),
        }
    }

    fn from_stream(outcome: Result<(), NarrativeError>, text: String) -> Self {
        match outcome {
            Ok(()) if text.trim().is_empty() => {
                warn!("narrative stream finished without any text");
                Self::fallback()
            }
            Ok(()) => Self {
                status: NarrativeStatus::Complete,
                text,
            },
            Err(e) if !text.trim().is_empty() => {
                warn!("narrative stream interrupted, keeping partial text: {e}");
                Self {
                    status: NarrativeStatus::Partial,
                    text,
                }
            }
            Err(e) => {
                error!("narrative generation failed: {e}");
                Self::fallback()
            }
        }
    }
}

pub async fn generate_narrative(
    client: &reqwest::Client,
    config: &NarrativeConfig,
    inputs: &CalculatorInputs,
    result: &CalculationResult,
) -> Narrative {
    let prompt = build_prompt(inputs, result);
    let mut text = String::new();
    let outcome = stream_text(client, config, &prompt, &mut text).await;
    Narrative::from_stream(outcome, text)
}

async fn stream_text(
    client: &reqwest::Client,
    config: &NarrativeConfig,
    prompt: &str,
    text: &mut String,
) -> Result<(), NarrativeError> {
    let api_key = config
        .api_key
        .as_deref()
        .ok_or(NarrativeError::MissingCredential)?;

    debug!("requesting narrative from model {}", config.model);
    let mut response = client
        .post(config.stream_url())
        .header("x-goog-api-key", api_key)
        .json(&json!({ "contents": [{ "parts": [{ "text": prompt }] }] }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(NarrativeError::Status {
            code: status.as_u16(),
            body,
        });
    }

    let mut decoder = SseDecoder::new();
    while let Some(chunk) = response.chunk().await? {
        for fragment in decoder.push(&chunk)? {
            text.push_str(&fragment);
        }
    }
    if let Some(fragment) = decoder.finish()? {
        text.push_str(&fragment);
    }
    Ok(())
}
