use crate::config::Settings;
use crate::domain::notification::{
    CallbackRequest, CallbackResponse, PAYMENT_HASH_PARAM, RequestParams, WebhookNotification,
};
use crate::domain::ports::{OrderProcessorBox, SignatureValidatorBox};
use crate::error::{CallbackError, Result};
use crate::infrastructure::signature::HmacSignatureValidator;
use tracing::{error, info, instrument, warn};

/// What a successfully verified notification led to.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CallbackOutcome {
    /// The payment was marked paid by this notification.
    Applied { payment_id: u64 },
    /// A retried notification for a payment that is already paid.
    AlreadyPaid { payment_id: u64 },
}

/// Validates gateway notifications and applies confirmed payments.
///
/// Each call walks the same path: reject malformed input, check the
/// signature, require a paid status, resolve the payment by hash and apply
/// it with the stored amount. The signature is the only trust boundary; no
/// processor call happens before it has been checked. Every failure ends in
/// `{"status":"error"}`.
pub struct CallbackVerifier {
    secret_key: String,
    validator: SignatureValidatorBox,
    processor: OrderProcessorBox,
}

impl CallbackVerifier {
    pub fn new(
        secret_key: impl Into<String>,
        validator: SignatureValidatorBox,
        processor: OrderProcessorBox,
    ) -> Self {
        Self {
            secret_key: secret_key.into(),
            validator,
            processor,
        }
    }

    /// Uses `api_key` as the shared secret and the configured HMAC digest.
    ///
    /// Only the API key is required here; the merchant id matters for
    /// outbound orders alone.
    pub fn from_settings(settings: &Settings, processor: OrderProcessorBox) -> Result<Self> {
        settings.ensure_api_key()?;
        Ok(Self::new(
            settings.api_key.clone(),
            Box::new(HmacSignatureValidator::new(settings.signature_algorithm)),
            processor,
        ))
    }

    /// Handles one inbound call and produces the terminal response.
    #[instrument(skip_all)]
    pub async fn handle(&self, request: &CallbackRequest) -> CallbackResponse {
        match self
            .verify(&request.body, request.signature.as_deref(), &request.params)
            .await
        {
            Ok(outcome) => {
                info!(?outcome, "Payment notification accepted");
                CallbackResponse::SUCCESS
            }
            Err(e @ (CallbackError::LookupFailed(_) | CallbackError::ProcessingFailed(_))) => {
                error!(error = %e, "Payment notification failed");
                CallbackResponse::ERROR
            }
            Err(e) => {
                warn!(error = %e, "Payment notification rejected");
                CallbackResponse::ERROR
            }
        }
    }

    pub async fn verify(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
        params: &RequestParams,
    ) -> std::result::Result<CallbackOutcome, CallbackError> {
        let signature = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(CallbackError::EmptySignature)?;
        if raw_body.is_empty() {
            return Err(CallbackError::EmptyBody);
        }

        if self.secret_key.is_empty()
            || !self.validator.validate(raw_body, &self.secret_key, signature)
        {
            return Err(CallbackError::InvalidSignature);
        }

        let notification = WebhookNotification::parse(raw_body)?;
        if !notification.status.confirms_payment() {
            return Err(CallbackError::NotPaid(
                notification.status.as_str().to_string(),
            ));
        }

        let hash = params
            .scalar(PAYMENT_HASH_PARAM)
            .ok_or(CallbackError::InvalidPaymentHash)?;

        let payment = self
            .processor
            .load_payment_by_hash(hash)
            .await
            .map_err(CallbackError::LookupFailed)?
            .ok_or_else(|| CallbackError::PaymentNotFound(hash.to_string()))?;

        // The hash travels unsigned in the query; the order id is covered by the signature.
        if let Some(notified) = notification.merchant_order_id.as_deref() {
            if notified != payment.order_id.to_string() {
                return Err(CallbackError::OrderMismatch {
                    notified: notified.to_string(),
                    expected: payment.order_id,
                });
            }
        }

        if payment.is_paid() {
            return Ok(CallbackOutcome::AlreadyPaid {
                payment_id: payment.id,
            });
        }

        self.processor
            .process_payment(payment.id, payment.amount)
            .await
            .map_err(CallbackError::ProcessingFailed)?;

        info!(
            payment_id = payment.id,
            order_id = payment.order_id,
            gateway_order_id = notification.gateway_order_id.as_deref().unwrap_or_default(),
            "Payment applied"
        );
        Ok(CallbackOutcome::Applied {
            payment_id: payment.id,
        })
    }
}
