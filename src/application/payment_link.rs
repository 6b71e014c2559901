use super::order_builder::OrderBuilder;
use crate::config::Settings;
use crate::domain::basket::CreateOrderRequest;
use crate::domain::ports::{CurrencyDirectoryBox, GatewayClientBox, OrderProcessorBox};
use crate::error::{CheckoutError, GatewayError, LinkError, Result};
use tracing::{debug, info, instrument, warn};

/// Asks the gateway for a hosted payment page.
///
/// A single attempt per call: any failure is returned to the checkout flow
/// as-is, which is expected to offer the customer a retry.
pub struct PaymentLinkRequester {
    client: GatewayClientBox,
    debug: bool,
}

impl PaymentLinkRequester {
    pub fn new(client: GatewayClientBox, debug: bool) -> Self {
        Self { client, debug }
    }

    #[instrument(skip_all, fields(order_id = %request.merchant_order_id))]
    pub async fn request_link(
        &self,
        request: &CreateOrderRequest,
    ) -> std::result::Result<String, LinkError> {
        let outcome = match self.client.create_order(request).await {
            Ok(Some(response)) => {
                let url = response.payment_url.as_deref().unwrap_or_default().trim();
                if !url.is_empty() {
                    return Ok(url.to_string());
                }
                Err(LinkError::MissingPaymentUrl(response))
            }
            Ok(None) => Err(LinkError::EmptyResponse),
            Err(e) => Err(LinkError::Gateway(e)),
        };

        if let Err(e) = &outcome {
            if self.debug {
                let payload = serde_json::to_string_pretty(request).unwrap_or_default();
                let response = match e {
                    LinkError::MissingPaymentUrl(response) => {
                        serde_json::to_string_pretty(response).unwrap_or_default()
                    }
                    LinkError::Gateway(GatewayError::Status { body, .. }) => body.clone(),
                    _ => String::new(),
                };
                warn!(
                    error = %e,
                    request = %payload,
                    response = %response,
                    "Payment link request failed"
                );
            } else {
                debug!(error = %e, "Payment link request failed");
            }
        }
        outcome
    }
}

/// The checkout step that turns the processor's current order into a
/// payment link.
pub struct CheckoutService {
    settings: Settings,
    processor: OrderProcessorBox,
    currencies: CurrencyDirectoryBox,
    requester: PaymentLinkRequester,
}

impl CheckoutService {
    pub fn new(
        settings: Settings,
        processor: OrderProcessorBox,
        currencies: CurrencyDirectoryBox,
        gateway: GatewayClientBox,
    ) -> Self {
        let requester = PaymentLinkRequester::new(gateway, settings.debug);
        Self {
            settings,
            processor,
            currencies,
            requester,
        }
    }

    /// Creates a payment for the current order and requests its link.
    ///
    /// Returns `Ok(None)` when the gateway did not hand out a link; errors
    /// are reserved for configuration and processor failures.
    pub async fn payment_link(&self) -> Result<Option<String>> {
        let request = self.prepare().await?;
        match self.requester.request_link(&request).await {
            Ok(url) => {
                info!(order_id = %request.merchant_order_id, "Payment link issued");
                Ok(Some(url))
            }
            Err(_) => Ok(None),
        }
    }

    /// Everything up to the gateway call: creates the payment and builds the
    /// request.
    pub async fn prepare(&self) -> Result<CreateOrderRequest> {
        let builder = OrderBuilder::from_settings(&self.settings)?;

        let order = self.processor.current_order().await?;
        let currency = self
            .currencies
            .currency_code(&order.currency)
            .ok_or_else(|| CheckoutError::UnknownCurrency(order.currency.clone()))?;
        let payment = self.processor.create_payment(order.id, order.amount).await?;

        builder.build(&order, &payment, &currency)
    }
}
