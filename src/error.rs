use crate::domain::basket::CreateOrderResponse;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ::config::ConfigError),
    #[error("Invoicebox merchant id and API key must be configured")]
    MissingCredentials,
    #[error("Invalid configuration value: {0}")]
    InvalidSetting(String),
    #[error("Amount overflow while computing {0}")]
    AmountOverflow(&'static str),
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
    #[error("Processor error: {0}")]
    ProcessorError(#[from] ProcessorError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Failures reported by the commerce order processor.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessorError {
    #[error("No order is currently being checked out")]
    NoCurrentOrder,
    #[error("Payment {0} not found")]
    PaymentNotFound(u64),
    #[error("Payment {0} has already been processed")]
    AlreadyProcessed(u64),
    #[error("Payment {id} amount mismatch: expected {expected}, got {actual}")]
    AmountMismatch {
        id: u64,
        expected: rust_decimal::Decimal,
        actual: rust_decimal::Decimal,
    },
    #[error("Processor backend failure: {0}")]
    Backend(String),
}

/// Failures of the outbound order-creation call.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Gateway returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Malformed gateway response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
    #[error("Invalid gateway URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Reasons a payment link could not be obtained.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Gateway returned no order")]
    EmptyResponse,
    #[error("Gateway order {} carries no payment URL", .0.id)]
    MissingPaymentUrl(CreateOrderResponse),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Every way an inbound payment notification can be rejected.
#[derive(Error, Debug)]
pub enum CallbackError {
    #[error("Signature is empty")]
    EmptySignature,
    #[error("Notification body is empty")]
    EmptyBody,
    #[error("Signature does not match notification body")]
    InvalidSignature,
    #[error("Notification is not valid JSON: {0}")]
    UnparsableNotification(#[from] serde_json::Error),
    #[error("Notification status {0:?} does not confirm payment")]
    NotPaid(String),
    #[error("Payment hash is missing or not a scalar value")]
    InvalidPaymentHash,
    #[error("Payment {0:?} not found")]
    PaymentNotFound(String),
    #[error("Notification is for order {notified}, payment belongs to order {expected}")]
    OrderMismatch { notified: String, expected: u64 },
    #[error("Payment lookup failed: {0}")]
    LookupFailed(ProcessorError),
    #[error("Payment processing failed: {0}")]
    ProcessingFailed(ProcessorError),
}
