//! Delivery strategies, tried in order by the dispatcher.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};
use studio_core::error::DeliveryErrorCode;
use studio_core::{Error, Result};
use tracing::{debug, warn};

use crate::config::WebhookConfig;
use crate::payload::LeadPayload;

/// How a successful attempt was acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acknowledgement {
    /// The receiver answered with a success status
    Confirmed,
    /// Sent without any way to observe the result
    Assumed,
}

/// One way of getting a lead to the webhook.
#[async_trait]
pub trait DeliveryStrategy: Send + Sync {
    /// Short identifier used in reports and logs.
    fn name(&self) -> &'static str;

    /// Try to deliver `payload`. An `Err` moves the dispatcher to the next strategy.
    async fn attempt(&self, payload: &LeadPayload) -> Result<Acknowledgement>;
}

fn attempt_failed(strategy: &str, msg: impl std::fmt::Display) -> Error {
    Error::delivery(
        DeliveryErrorCode::AttemptFailed,
        format!("{}: {}", strategy, msg),
    )
}

async fn expect_success(strategy: &str, response: reqwest::Response) -> Result<Acknowledgement> {
    let status = response.status();
    if status.is_success() {
        return Ok(Acknowledgement::Confirmed);
    }
    let body = response.text().await.unwrap_or_default();
    Err(attempt_failed(
        strategy,
        format!("webhook returned {}: {}", status, body),
    ))
}

/// POST the payload as JSON and wait for a 2xx.
pub struct DirectJson {
    client: reqwest::Client,
    url: String,
}

impl DirectJson {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl DeliveryStrategy for DirectJson {
    fn name(&self) -> &'static str {
        "direct-json"
    }

    async fn attempt(&self, payload: &LeadPayload) -> Result<Acknowledgement> {
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| attempt_failed(self.name(), e))?;

        expect_success(self.name(), response).await
    }
}

/// Fire-and-forget POST whose response is never read.
///
/// Success is assumed as soon as the request is handed to the runtime. This is
/// a known accuracy gap: a receiver that rejects the request still counts as
/// delivered.
pub struct Opaque {
    client: reqwest::Client,
    url: String,
}

impl Opaque {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl DeliveryStrategy for Opaque {
    fn name(&self) -> &'static str {
        "opaque"
    }

    async fn attempt(&self, payload: &LeadPayload) -> Result<Acknowledgement> {
        let body = serde_json::to_string(payload)?;
        let request = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(body)
            .build()
            .map_err(|e| attempt_failed(self.name(), e))?;

        let client = self.client.clone();
        tokio::spawn(async move {
            // Result intentionally unobserved by the caller
            match client.execute(request).await {
                Ok(response) => debug!(status = %response.status(), "Opaque delivery finished"),
                Err(e) => debug!(error = %e, "Opaque delivery errored after dispatch"),
            }
        });

        warn!("Opaque delivery dispatched; outcome cannot be verified");
        Ok(Acknowledgement::Assumed)
    }
}

/// POST the payload as `multipart/form-data` and wait for a 2xx.
pub struct MultipartForm {
    client: reqwest::Client,
    url: String,
}

impl MultipartForm {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl DeliveryStrategy for MultipartForm {
    fn name(&self) -> &'static str {
        "multipart-form"
    }

    async fn attempt(&self, payload: &LeadPayload) -> Result<Acknowledgement> {
        let form = payload
            .form_fields()
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| attempt_failed(self.name(), e))?;

        expect_success(self.name(), response).await
    }
}

/// Build the HTTP client used by the webhook strategies.
pub fn webhook_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::internal(format!("Failed to create HTTP client: {}", e)))
}

/// The standard order: direct JSON, opaque, multipart.
pub fn webhook_strategies(config: &WebhookConfig) -> Result<Vec<Arc<dyn DeliveryStrategy>>> {
    let client = webhook_client(config.attempt_timeout())?;
    Ok(vec![
        Arc::new(DirectJson::new(client.clone(), &config.url)),
        Arc::new(Opaque::new(client.clone(), &config.url)),
        Arc::new(MultipartForm::new(client, &config.url)),
    ])
}
