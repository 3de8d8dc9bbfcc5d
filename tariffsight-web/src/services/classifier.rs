//! External classification API client
//!
//! Sends a product photo to the configured multimodal model endpoint and
//! parses the structured classification it returns. The response is
//! treated as opaque except for the tariff code and the tax list, which
//! must be present before the result is accepted (and a credit charged).

use base64::Engine;
use serde_json::json;
use sqlx::SqlitePool;
use std::time::Duration;
use thiserror::Error;

use crate::db::settings;
use crate::error::ApiError;
use crate::models::ClassificationResult;

const USER_AGENT: &str = "TariffSight/0.1.0 (+https://tariffsight.example)";

/// Classifier client errors
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Classification timed out")]
    Timeout,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid classification: {0}")]
    Invalid(String),

    #[error("Classifier endpoint is not configured")]
    NotConfigured,
}

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::Network(_) | ClassifierError::Timeout | ClassifierError::Api(..) => {
                ApiError::ClassifierTransport(err.to_string())
            }
            ClassifierError::Parse(_) | ClassifierError::Invalid(_) => {
                ApiError::ClassifierValidation(err.to_string())
            }
            ClassifierError::NotConfigured => ApiError::Internal(err.to_string()),
        }
    }
}

/// Runtime configuration for the classifier, loaded from settings
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl ClassifierConfig {
    /// Load from the settings table; errors if no endpoint is configured
    pub async fn load(pool: &SqlitePool) -> Result<Self, ClassifierError> {
        let endpoint = settings::get_classifier_endpoint(pool)
            .await
            .map_err(|e| ClassifierError::Network(e.to_string()))?
            .ok_or(ClassifierError::NotConfigured)?;

        let api_key = settings::get_classifier_api_key(pool)
            .await
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        let timeout_secs = settings::get_classifier_timeout_secs(pool)
            .await
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        Ok(Self {
            endpoint,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// HTTP client for the classification collaborator
pub struct ClassifierClient {
    http_client: reqwest::Client,
}

impl ClassifierClient {
    pub fn new() -> Result<Self, ClassifierError> {
        // Timeout is per-request (config-driven), not baked into the client
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        Ok(Self { http_client })
    }

    /// Classify a product photo
    ///
    /// May take many seconds; callers enforce single-flight per session.
    pub async fn classify(
        &self,
        config: &ClassifierConfig,
        image: &[u8],
        filename: &str,
    ) -> Result<ClassificationResult, ClassifierError> {
        let payload = json!({
            "image": base64::engine::general_purpose::STANDARD.encode(image),
            "filename": filename,
        });

        tracing::debug!(
            endpoint = %config.endpoint,
            image_bytes = image.len(),
            "Submitting image to classifier"
        );

        let mut request = self
            .http_client
            .post(&config.endpoint)
            .timeout(config.timeout)
            .json(&payload);

        if let Some(key) = &config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ClassifierError::Timeout
            } else {
                ClassifierError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api(status.as_u16(), error_text));
        }

        let result: ClassificationResult = response
            .json()
            .await
            .map_err(|e| ClassifierError::Parse(e.to_string()))?;

        validate_result(&result)?;

        tracing::info!(
            tariff_code = %result.tariff_code,
            confidence = result.confidence,
            "Classification accepted"
        );

        Ok(result)
    }
}

impl Default for ClassifierClient {
    fn default() -> Self {
        Self::new().expect("Failed to create classifier client")
    }
}

/// Structural validation of a classifier response
///
/// A result without a tariff code or with an empty tax list is rejected
/// before any credit is consumed.
pub fn validate_result(result: &ClassificationResult) -> Result<(), ClassifierError> {
    if result.tariff_code.trim().is_empty() {
        return Err(ClassifierError::Invalid("missing tariff code".to_string()));
    }
    if result.taxes.is_empty() {
        return Err(ClassifierError::Invalid("empty tax list".to_string()));
    }
    Ok(())
}
