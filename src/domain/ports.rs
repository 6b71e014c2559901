use super::basket::{CreateOrderRequest, CreateOrderResponse};
use super::money::Money;
use super::order::{Order, PaymentRecord};
use crate::error::{GatewayError, ProcessorError};
use async_trait::async_trait;

/// The commerce order processor the plugin runs inside of.
///
/// Implementations own payment records and must apply a payment at most
/// once: a second `process_payment` for the same id has to fail with
/// [`ProcessorError::AlreadyProcessed`].
#[async_trait]
pub trait OrderProcessor: Send + Sync {
    /// The order currently being checked out, cart items included.
    async fn current_order(&self) -> Result<Order, ProcessorError>;
    async fn create_payment(
        &self,
        order_id: u64,
        amount: Money,
    ) -> Result<PaymentRecord, ProcessorError>;
    async fn load_payment_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<PaymentRecord>, ProcessorError>;
    async fn process_payment(&self, payment_id: u64, amount: Money) -> Result<(), ProcessorError>;
}

/// Maps an order's currency to the code the gateway expects.
pub trait CurrencyDirectory: Send + Sync {
    fn currency_code(&self, currency: &str) -> Option<String>;
}

#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Creates the order on the gateway. `Ok(None)` means the gateway
    /// answered without an order.
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<Option<CreateOrderResponse>, GatewayError>;
}

pub trait SignatureValidator: Send + Sync {
    /// Checks `signature` against `body` with the shared `secret`.
    fn validate(&self, body: &[u8], secret: &str, signature: &str) -> bool;
}

pub type OrderProcessorBox = Box<dyn OrderProcessor>;
pub type CurrencyDirectoryBox = Box<dyn CurrencyDirectory>;
pub type GatewayClientBox = Box<dyn GatewayClient>;
pub type SignatureValidatorBox = Box<dyn SignatureValidator>;
