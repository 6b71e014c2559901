use crate::config::Settings;
use crate::domain::basket::{
    BasketItemType, BasketLine, CreateOrderRequest, Customer, PaymentType, VatRate,
};
use crate::domain::money::{Money, RoundingPolicy};
use crate::domain::notification::PAYMENT_HASH_PARAM;
use crate::domain::order::{CartItem, Order, PaymentRecord};
use crate::error::{CheckoutError, Result};
use chrono::{Days, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use url::Url;

/// Unit of measure sent for every line ("pieces", OKEI code 796).
pub const MEASURE_NAME: &str = "шт.";
pub const MEASURE_CODE: &str = "796";

const ORDER_TAX_SCALE: u32 = 2;

const PROCESS_PATH: &str = "commerce/invoicebox/payment-process";
const SUCCESS_PATH: &str = "commerce/invoicebox/payment-success";
const FAIL_PATH: &str = "commerce/invoicebox/payment-failed";

/// Ratio between what is actually charged and the raw cart sum.
///
/// Exactly one when nothing was discounted, and also when the cart sums to
/// zero so that an empty or free cart never divides by zero. Fails with
/// [`CheckoutError::AmountOverflow`] when the cart sum does not fit a `Decimal`.
pub fn discount_rate(items: &[CartItem], charged: Money) -> Result<Decimal> {
    let undiscounted = items
        .iter()
        .map(CartItem::subtotal)
        .try_fold(Money::ZERO, |acc, line| acc.checked_add(line?))
        .ok_or(CheckoutError::AmountOverflow("cart total"))?;
    if undiscounted == charged || undiscounted.is_zero() {
        return Ok(Decimal::ONE);
    }
    charged
        .value()
        .checked_div(undiscounted.value())
        .ok_or(CheckoutError::AmountOverflow("discount rate"))
}

/// Turns a checked-out order into the gateway's order-creation request.
///
/// Every cart price is scaled by the [`discount_rate`] so that a cart-level
/// discount is spread proportionally over the lines, then split into its
/// VAT-inclusive and VAT-exclusive parts.
#[derive(Debug, Clone)]
pub struct OrderBuilder {
    merchant_id: String,
    description: String,
    vat: VatRate,
    rounding: RoundingPolicy,
    process_url: Url,
    success_url: Url,
    fail_url: Url,
}

impl OrderBuilder {
    /// Refuses to build anything unless merchant id and API key are configured.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.ensure_credentials()?;

        let mut site_url = settings.site_url.clone();
        if !site_url.ends_with('/') {
            site_url.push('/');
        }
        let base = Url::parse(&site_url)
            .map_err(|e| CheckoutError::InvalidSetting(format!("site_url: {}", e)))?;
        let join = |path: &str| {
            base.join(path)
                .map_err(|e| CheckoutError::InvalidSetting(format!("site_url: {}", e)))
        };

        Ok(Self {
            merchant_id: settings.merchant_id.clone(),
            description: settings.order_description.clone(),
            vat: VatRate::parse(&settings.vat),
            rounding: settings.rounding,
            process_url: join(PROCESS_PATH)?,
            success_url: join(SUCCESS_PATH)?,
            fail_url: join(FAIL_PATH)?,
        })
    }

    pub fn vat(&self) -> VatRate {
        self.vat
    }

    pub fn rounding(&self) -> RoundingPolicy {
        self.rounding
    }

    pub fn build(
        &self,
        order: &Order,
        payment: &PaymentRecord,
        currency_code: &str,
    ) -> Result<CreateOrderRequest> {
        self.build_on(order, payment, currency_code, Utc::now().date_naive())
    }

    /// Same as [`build`](Self::build) with a fixed "today".
    pub fn build_on(
        &self,
        order: &Order,
        payment: &PaymentRecord,
        currency_code: &str,
        today: NaiveDate,
    ) -> Result<CreateOrderRequest> {
        let rate = discount_rate(&order.items, payment.amount)?;
        let basket_items = order
            .items
            .iter()
            .map(|item| self.basket_line(item, rate, today))
            .collect::<Result<Vec<_>>>()?;

        let total = payment.amount;
        let vat_amount = total
            .checked_div(self.vat.divisor())
            .and_then(|net| total.checked_sub(net))
            .ok_or(CheckoutError::AmountOverflow("order tax"))?
            .round_to(ORDER_TAX_SCALE);

        let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);

        tracing::debug!(
            order_id = order.id,
            payment_id = payment.id,
            %rate,
            lines = order.items.len(),
            "Built gateway order"
        );

        Ok(CreateOrderRequest {
            description: format!("{} {}", self.description, order.id),
            merchant_id: self.merchant_id.clone(),
            merchant_order_id: order.id.to_string(),
            amount: total.value(),
            vat_amount: vat_amount.value(),
            currency_id: currency_code.to_string(),
            expiration_date: tomorrow.and_time(NaiveTime::MIN).and_utc(),
            basket_items,
            customer: Customer::private(&order.name, &order.phone, &order.email),
            notification_url: self.process_url_for(&payment.hash),
            success_url: self.success_url.to_string(),
            fail_url: self.fail_url.to_string(),
        })
    }

    fn basket_line(&self, item: &CartItem, rate: Decimal, today: NaiveDate) -> Result<BasketLine> {
        let overflow = || CheckoutError::AmountOverflow("basket line");
        let price = item.price.checked_mul(rate).ok_or_else(overflow)?;
        let price_without_vat = price
            .checked_div(self.vat.divisor())
            .ok_or_else(overflow)?;
        let vat_per_unit = price.checked_sub(price_without_vat).ok_or_else(overflow)?;
        let total = price.checked_mul(item.count).ok_or_else(overflow)?;
        let total_vat = vat_per_unit.checked_mul(item.count).ok_or_else(overflow)?;

        let unit = self.rounding.unit_price_scale;
        let line = self.rounding.line_amount_scale;

        Ok(BasketLine {
            sku: item.id.clone(),
            name: item.name.clone(),
            measure: MEASURE_NAME.to_string(),
            measure_code: MEASURE_CODE.to_string(),
            quantity: item.count,
            amount: price.round_to(unit).value(),
            amount_wo_vat: price_without_vat.round_to(unit).value(),
            total_amount: total.round_to(line).value(),
            total_vat_amount: total_vat.round_to(line).value(),
            vat_code: self.vat.code,
            item_type: BasketItemType::Commodity,
            payment_type: PaymentType::FullPrepayment,
            valid_until: today,
        })
    }

    fn process_url_for(&self, hash: &str) -> String {
        let mut url = self.process_url.clone();
        url.query_pairs_mut().append_pair(PAYMENT_HASH_PARAM, hash);
        url.to_string()
    }
}
