#![allow(dead_code)]

use async_trait::async_trait;
use invoicebox_commerce::config::Settings;
use invoicebox_commerce::domain::money::Money;
use invoicebox_commerce::domain::order::{CartItem, Order, PaymentRecord};
use invoicebox_commerce::domain::ports::OrderProcessor;
use invoicebox_commerce::error::ProcessorError;
use invoicebox_commerce::infrastructure::in_memory::InMemoryOrderProcessor;
use rust_decimal::Decimal;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;

pub const SECRET: &str = "test-secret";

pub fn settings() -> Settings {
    Settings {
        merchant_id: "shop-1".to_string(),
        api_key: SECRET.to_string(),
        api_token: "token".to_string(),
        site_url: "https://shop.example/".to_string(),
        vat: "20".to_string(),
        ..Settings::default()
    }
}

pub fn item(id: &str, price: Decimal, count: Decimal) -> CartItem {
    CartItem {
        id: id.to_string(),
        name: format!("Item {}", id),
        price: Money::new(price),
        count,
    }
}

pub fn order(items: Vec<CartItem>, amount: Decimal) -> Order {
    Order {
        id: 42,
        currency: "RUB".to_string(),
        name: "Ivan Petrov".to_string(),
        phone: "+7 (900) 123-45-67".to_string(),
        email: "ivan@example.com".to_string(),
        amount: Money::new(amount),
        items,
    }
}

/// Wraps the in-memory processor and counts every call that touches it.
#[derive(Clone, Default)]
pub struct CountingProcessor {
    pub inner: InMemoryOrderProcessor,
    pub lookups: Arc<AtomicUsize>,
    pub applies: Arc<AtomicUsize>,
}

impl CountingProcessor {
    pub fn new(inner: InMemoryOrderProcessor) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn applies(&self) -> usize {
        self.applies.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderProcessor for CountingProcessor {
    async fn current_order(&self) -> Result<Order, ProcessorError> {
        self.inner.current_order().await
    }

    async fn create_payment(
        &self,
        order_id: u64,
        amount: Money,
    ) -> Result<PaymentRecord, ProcessorError> {
        self.inner.create_payment(order_id, amount).await
    }

    async fn load_payment_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<PaymentRecord>, ProcessorError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.load_payment_by_hash(hash).await
    }

    async fn process_payment(&self, payment_id: u64, amount: Money) -> Result<(), ProcessorError> {
        self.applies.fetch_add(1, Ordering::SeqCst);
        self.inner.process_payment(payment_id, amount).await
    }
}

/// A processor whose backend is down.
pub struct FailingProcessor;

#[async_trait]
impl OrderProcessor for FailingProcessor {
    async fn current_order(&self) -> Result<Order, ProcessorError> {
        Err(ProcessorError::Backend("down".to_string()))
    }

    async fn create_payment(&self, _: u64, _: Money) -> Result<PaymentRecord, ProcessorError> {
        Err(ProcessorError::Backend("down".to_string()))
    }

    async fn load_payment_by_hash(&self, _: &str) -> Result<Option<PaymentRecord>, ProcessorError> {
        Err(ProcessorError::Backend("down".to_string()))
    }

    async fn process_payment(&self, _: u64, _: Money) -> Result<(), ProcessorError> {
        Err(ProcessorError::Backend("down".to_string()))
    }
}

pub fn temp_file(suffix: &str, content: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(suffix).unwrap();
    file.write_all(content).unwrap();
    file.flush().unwrap();
    file
}
