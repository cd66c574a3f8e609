//! HTTP translation client
//!
//! One POST per translation. Non-2xx bodies are parsed for `{ "error": ... }`;
//! anything else becomes a generic message carrying a truncated copy of the
//! raw body.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};

use super::types::{TranslateError, TranslationRequest, TranslationResult, TranslationService};
use crate::utils::AppConfig;

/// Characters of a raw error body kept in the message
pub const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
struct ServiceResponse {
    #[serde(default)]
    gloss: serde_json::Value,
    translation: String,
    #[serde(default)]
    confidence: Option<ServiceConfidence>,
    #[serde(default)]
    timing: Option<ServiceTiming>,
    #[serde(default)]
    landmarks_shape: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct ServiceConfidence {
    #[serde(default)]
    overall: f64,
}

#[derive(Debug, Deserialize)]
struct ServiceTiming {
    total: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error: serde_json::Value,
}

pub struct HttpTranslationService {
    client: reqwest::Client,
    url: String,
}

impl HttpTranslationService {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TranslateError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranslateError::Network(e.to_string()))?;
        Ok(Self::with_client(client, url))
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, TranslateError> {
        Self::new(
            config.service_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TranslationService for HttpTranslationService {
    async fn translate(
        &self,
        request: &TranslationRequest,
    ) -> Result<TranslationResult, TranslateError> {
        tracing::info!(
            "POST {} ({} frames, method {})",
            self.url,
            request.landmarks.len(),
            request.method
        );
        let started = Instant::now();

        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(network_error)?;
        let status = response.status();
        let body = response.text().await.map_err(network_error)?;
        let round_trip = started.elapsed();

        if !status.is_success() {
            let error = classify_failure(status.as_u16(), &body);
            tracing::warn!("Translation service returned {}: {}", status, error);
            return Err(error);
        }

        let result = parse_success(&body, round_trip)?;
        tracing::info!(
            "Translation received in {}ms: {:?}",
            result.round_trip_ms,
            result.translation
        );
        Ok(result)
    }
}

fn network_error(error: reqwest::Error) -> TranslateError {
    if error.is_timeout() {
        TranslateError::Network(format!("request timed out: {}", error))
    } else {
        TranslateError::Network(error.to_string())
    }
}

/// Turn a non-2xx response into an error message
pub fn classify_failure(status: u16, body: &str) -> TranslateError {
    if let Ok(parsed) = serde_json::from_str::<ServiceErrorBody>(body) {
        let message = match parsed.error {
            serde_json::Value::String(message) => message,
            other => other.to_string(),
        };
        return TranslateError::Service { status, message };
    }

    let excerpt = truncate_body(body);
    let message = if excerpt.is_empty() {
        format!("Translation service returned {}", status)
    } else {
        format!("Translation service returned {}: {}", status, excerpt)
    };
    TranslateError::Service { status, message }
}

/// Parse a 2xx body
pub fn parse_success(body: &str, round_trip: Duration) -> Result<TranslationResult, TranslateError> {
    let response: ServiceResponse = serde_json::from_str(body)
        .map_err(|e| TranslateError::Malformed(format!("{} in {}", e, truncate_body(body))))?;

    Ok(TranslationResult {
        gloss: gloss_text(&response.gloss),
        translation: response.translation,
        confidence: response.confidence.map(|c| c.overall).unwrap_or(0.0),
        round_trip_ms: round_trip.as_millis() as u64,
        server_ms: response.timing.and_then(|t| t.total),
        landmarks_shape: response.landmarks_shape,
    })
}

/// Gloss arrives either as text or as a token list
fn gloss_text(gloss: &serde_json::Value) -> String {
    match gloss {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Array(tokens) => tokens
            .iter()
            .map(|token| match token {
                serde_json::Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" "),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= ERROR_BODY_LIMIT {
        return body.to_string();
    }
    let mut excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    excerpt.push('…');
    excerpt
}
