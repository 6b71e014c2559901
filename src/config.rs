//! Plugin settings.
//!
//! Settings are layered: an optional TOML file first, then environment
//! variables prefixed with `INVOICEBOX_` (nested keys use `__`, for example
//! `INVOICEBOX_ROUNDING__LINE_AMOUNT_SCALE=0`).

use crate::domain::money::RoundingPolicy;
use crate::error::{CheckoutError, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub const ENV_PREFIX: &str = "INVOICEBOX";

const MAX_SCALE: u32 = 8;

/// HMAC digest the gateway uses for the `X-Signature` header.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

#[derive(Deserialize, Clone)]
pub struct Settings {
    /// Bearer token for the gateway API.
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub merchant_id: String,
    /// Shared secret used to validate notification signatures.
    #[serde(default)]
    pub api_key: String,
    /// Log full request and response when a payment link cannot be obtained.
    #[serde(default)]
    pub debug: bool,
    /// VAT percent as entered by the shop owner: blank, 0, 10 or 20.
    #[serde(default)]
    pub vat: String,
    #[serde(default = "default_site_url")]
    pub site_url: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_order_description")]
    pub order_description: String,
    #[serde(default)]
    pub signature_algorithm: SignatureAlgorithm,
    #[serde(default)]
    pub rounding: RoundingPolicy,
}

fn default_api_version() -> String {
    "v3".to_string()
}

fn default_site_url() -> String {
    "http://localhost/".to_string()
}

fn default_api_base_url() -> String {
    "https://api.invoicebox.ru".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_order_description() -> String {
    "Order".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            api_version: default_api_version(),
            merchant_id: String::new(),
            api_key: String::new(),
            debug: false,
            vat: String::new(),
            site_url: default_site_url(),
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            order_description: default_order_description(),
            signature_algorithm: SignatureAlgorithm::default(),
            rounding: RoundingPolicy::default(),
        }
    }
}

// Credentials never reach the logs.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_token", &redact(&self.api_token))
            .field("api_version", &self.api_version)
            .field("merchant_id", &self.merchant_id)
            .field("api_key", &redact(&self.api_key))
            .field("debug", &self.debug)
            .field("vat", &self.vat)
            .field("site_url", &self.site_url)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("order_description", &self.order_description)
            .field("signature_algorithm", &self.signature_algorithm)
            .field("rounding", &self.rounding)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "***" }
}

impl Settings {
    /// Loads settings from an optional file, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }
        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(CheckoutError::InvalidSetting(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.rounding.unit_price_scale > MAX_SCALE || self.rounding.line_amount_scale > MAX_SCALE
        {
            return Err(CheckoutError::InvalidSetting(format!(
                "rounding scales must not exceed {}",
                MAX_SCALE
            )));
        }
        if url::Url::parse(&self.site_url).is_err() {
            return Err(CheckoutError::InvalidSetting(format!(
                "site_url {:?} is not an absolute URL",
                self.site_url
            )));
        }
        Ok(())
    }

    pub fn has_credentials(&self) -> bool {
        !self.merchant_id.trim().is_empty() && !self.api_key.trim().is_empty()
    }

    /// Fails with [`CheckoutError::MissingCredentials`] unless both the
    /// merchant id and the API key are set.
    pub fn ensure_credentials(&self) -> Result<()> {
        if self.has_credentials() {
            Ok(())
        } else {
            Err(CheckoutError::MissingCredentials)
        }
    }

    /// Notification verification needs the shared secret only.
    pub fn ensure_api_key(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            Err(CheckoutError::MissingCredentials)
        } else {
            Ok(())
        }
    }

    /// The inline notice shown on the payment method when credentials are missing.
    pub fn credentials_notice(&self) -> Option<String> {
        self.ensure_credentials().err().map(|e| e.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
