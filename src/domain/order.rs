use super::money::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single cart position as kept by the commerce processor.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CartItem {
    pub id: String,
    pub name: String,
    /// Unit price before any cart-level discount.
    pub price: Money,
    /// Quantity; fractional for goods sold by weight.
    pub count: Decimal,
}

impl CartItem {
    /// `price * count`, or `None` if it overflows.
    pub fn subtotal(&self) -> Option<Money> {
        self.price.checked_mul(self.count)
    }
}

/// The order being checked out.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Order {
    pub id: u64,
    /// Currency code as stored with the order, resolved through the currency directory.
    pub currency: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub amount: Money,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Order {
    /// Sum of `price * count` over the cart, ignoring discounts.
    pub fn undiscounted_total(&self) -> Option<Money> {
        self.items
            .iter()
            .map(CartItem::subtotal)
            .try_fold(Money::ZERO, |acc, line| acc.checked_add(line?))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

/// A payment attempt owned by the commerce processor.
///
/// The hash is the opaque token the gateway echoes back in the notification URL.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentRecord {
    pub id: u64,
    #[serde(default)]
    pub order_id: u64,
    pub amount: Money,
    pub hash: String,
    #[serde(default)]
    pub status: PaymentStatus,
}

impl PaymentRecord {
    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}
