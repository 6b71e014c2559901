use crate::config::Settings;
use crate::domain::basket::{CreateOrderRequest, CreateOrderResponse};
use crate::domain::ports::GatewayClient;
use crate::error::GatewayError;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const ORDER_PATH: &str = "billing/api/order/order";

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<CreateOrderResponse>,
}

/// Invoicebox order API over HTTPS.
///
/// Every call is bounded by the configured request timeout; there are no
/// retries at this level.
#[derive(Debug, Clone)]
pub struct InvoiceboxHttpClient {
    http: reqwest::Client,
    endpoint: Url,
    api_token: String,
}

impl InvoiceboxHttpClient {
    pub fn new(
        base_url: &str,
        api_version: &str,
        api_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;
        let endpoint = base.join(&format!(
            "{}/{}",
            api_version.trim_matches('/'),
            ORDER_PATH
        ))?;

        Ok(Self {
            http,
            endpoint,
            api_token: api_token.into(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, GatewayError> {
        Self::new(
            &settings.api_base_url,
            &settings.api_version,
            settings.api_token.clone(),
            settings.request_timeout(),
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl GatewayClient for InvoiceboxHttpClient {
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<Option<CreateOrderResponse>, GatewayError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_token)
            .header(ACCEPT, "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(status = status.as_u16(), "Gateway answered order creation");

        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Ok(None);
        }

        let envelope: Envelope = serde_json::from_str(&body)?;
        Ok(envelope.data)
    }
}
