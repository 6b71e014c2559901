use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Sub};

/// A monetary value in the order's currency.
///
/// Wraps `rust_decimal::Decimal` so that price arithmetic never goes through
/// binary floating point. Rounding is explicit and always rounds midpoints
/// away from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// `None` when the product no longer fits a `Decimal`.
    pub fn checked_mul(self, factor: Decimal) -> Option<Self> {
        self.0.checked_mul(factor).map(Self)
    }

    /// `None` on overflow or a zero divisor.
    pub fn checked_div(self, divisor: Decimal) -> Option<Self> {
        self.0.checked_div(divisor).map(Self)
    }

    /// Sums without panicking; `None` as soon as the total overflows.
    pub fn checked_sum<I: IntoIterator<Item = Self>>(iter: I) -> Option<Self> {
        iter.into_iter()
            .try_fold(Self::ZERO, |acc, m| acc.checked_add(m))
    }

    /// Rounds to `scale` decimal places, midpoints away from zero.
    pub fn round_to(self, scale: u32) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

/// Scaling by a dimensionless factor (quantity, discount rate).
impl Mul<Decimal> for Money {
    type Output = Self;
    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

/// Division by a dimensionless, non-zero factor.
impl Div<Decimal> for Money {
    type Output = Self;
    fn div(self, rhs: Decimal) -> Self::Output {
        Self(self.0 / rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, m| acc + m)
    }
}

/// How many decimal places each kind of basket amount is rounded to.
///
/// Unit prices go to the gateway with cent precision. Line amounts default
/// to cents as well, which keeps the basket summing to the order total; set
/// `line_amount_scale = 0` to send whole currency units instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoundingPolicy {
    #[serde(default = "default_scale")]
    pub unit_price_scale: u32,
    #[serde(default = "default_scale")]
    pub line_amount_scale: u32,
}

fn default_scale() -> u32 {
    2
}

impl Default for RoundingPolicy {
    fn default() -> Self {
        Self {
            unit_price_scale: default_scale(),
            line_amount_scale: default_scale(),
        }
    }
}

impl RoundingPolicy {
    /// Largest difference between the sum of `lines` rounded line totals and
    /// the exact order total.
    pub fn basket_tolerance(&self, lines: usize) -> Money {
        let half_unit = Decimal::new(5, self.line_amount_scale + 1);
        Money(half_unit * Decimal::from(lines))
    }
}
