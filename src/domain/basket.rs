//! Gateway-facing order payload: basket lines, VAT codes and the
//! order-creation request and response.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Gateway VAT rate categories.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum VatCode {
    #[serde(rename = "VATNONE")]
    VatNone,
    #[serde(rename = "RUS_VAT0")]
    RusVat0,
    #[serde(rename = "RUS_VAT10")]
    RusVat10,
    #[serde(rename = "RUS_VAT20")]
    RusVat20,
}

/// The configured VAT: the percent used for price arithmetic and the code
/// reported to the gateway.
///
/// Only 0, 10 and 20 have a dedicated code. Blank and any other value map to
/// [`VatCode::VatNone`]; the percent itself is still applied when numeric.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct VatRate {
    pub percent: Decimal,
    pub code: VatCode,
}

impl VatRate {
    pub const NONE: Self = Self {
        percent: Decimal::ZERO,
        code: VatCode::VatNone,
    };

    pub fn parse(setting: &str) -> Self {
        let setting = setting.trim();
        if setting.is_empty() {
            return Self::NONE;
        }
        match setting.parse::<Decimal>() {
            // A percent at or below -100 would zero or flip the VAT divisor.
            Ok(percent) if percent > dec!(-100) => Self {
                percent,
                code: Self::code_for(percent),
            },
            _ => {
                tracing::warn!(vat = setting, "Unrecognized VAT setting, sending without VAT");
                Self::NONE
            }
        }
    }

    fn code_for(percent: Decimal) -> VatCode {
        if percent == dec!(0) {
            VatCode::RusVat0
        } else if percent == dec!(10) {
            VatCode::RusVat10
        } else if percent == dec!(20) {
            VatCode::RusVat20
        } else {
            VatCode::VatNone
        }
    }

    /// `1 + percent / 100`; strictly positive.
    pub fn divisor(&self) -> Decimal {
        Decimal::ONE + self.percent / dec!(100)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum BasketItemType {
    Commodity,
    Service,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    FullPrepayment,
    FullPayment,
}

/// One order line as sent to the gateway.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BasketLine {
    pub sku: String,
    pub name: String,
    pub measure: String,
    pub measure_code: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    /// Unit price including VAT.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Unit price excluding VAT.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_wo_vat: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_vat_amount: Decimal,
    pub vat_code: VatCode,
    #[serde(rename = "type")]
    pub item_type: BasketItemType,
    pub payment_type: PaymentType,
    pub valid_until: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Customer {
    Private {
        name: String,
        phone: String,
        email: String,
    },
}

impl Customer {
    /// A private customer; the phone number keeps digits only.
    pub fn private(name: &str, phone: &str, email: &str) -> Self {
        Self::Private {
            name: name.to_string(),
            phone: phone.chars().filter(char::is_ascii_digit).collect(),
            email: email.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub description: String,
    pub merchant_id: String,
    pub merchant_order_id: String,
    /// Order total including VAT.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub vat_amount: Decimal,
    pub currency_id: String,
    pub expiration_date: DateTime<Utc>,
    pub basket_items: Vec<BasketLine>,
    pub customer: Customer,
    pub notification_url: String,
    pub success_url: String,
    pub fail_url: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub payment_url: Option<String>,
}
