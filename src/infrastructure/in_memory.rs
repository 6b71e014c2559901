use crate::domain::money::Money;
use crate::domain::order::{Order, PaymentRecord, PaymentStatus};
use crate::domain::ports::{CurrencyDirectory, OrderProcessor};
use crate::error::ProcessorError;
use async_trait::async_trait;
use ring::rand::{SecureRandom, SystemRandom};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// A thread-safe in-memory order processor.
///
/// Payments are keyed by hash behind an `Arc<RwLock<..>>`, so clones share
/// state. Applying a payment is a compare-and-set under the write lock, which
/// gives the at-most-once guarantee the notification handler relies on.
/// Used by the CLI and the tests.
#[derive(Default, Clone)]
pub struct InMemoryOrderProcessor {
    order: Arc<RwLock<Option<Order>>>,
    payments: Arc<RwLock<HashMap<String, PaymentRecord>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryOrderProcessor {
    /// Creates a processor with no current order and no payments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a processor holding `order` as the one being checked out.
    pub fn with_order(order: Order) -> Self {
        Self {
            order: Arc::new(RwLock::new(Some(order))),
            ..Self::default()
        }
    }

    /// Seeds existing payment records, e.g. loaded from a file.
    pub async fn load_payments(&self, records: Vec<PaymentRecord>) {
        let mut payments = self.payments.write().await;
        for record in records {
            self.next_id.fetch_max(record.id, Ordering::SeqCst);
            payments.insert(record.hash.clone(), record);
        }
    }

    /// Creates a pending payment and returns it.
    pub async fn insert_payment(&self, order_id: u64, amount: Money) -> PaymentRecord {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let record = PaymentRecord {
            id,
            order_id,
            amount,
            hash: payment_hash(id),
            status: PaymentStatus::Pending,
        };
        self.payments
            .write()
            .await
            .insert(record.hash.clone(), record.clone());
        record
    }

    pub async fn payments(&self) -> Vec<PaymentRecord> {
        let payments = self.payments.read().await;
        let mut records: Vec<_> = payments.values().cloned().collect();
        records.sort_by_key(|p| p.id);
        records
    }
}

/// 16 random bytes, hex encoded. Falls back to a sequential token only if the
/// system RNG is unavailable.
fn payment_hash(id: u64) -> String {
    let mut bytes = [0u8; 16];
    match SystemRandom::new().fill(&mut bytes) {
        Ok(()) => hex::encode(bytes),
        Err(_) => format!("{:032x}", id),
    }
}

#[async_trait]
impl OrderProcessor for InMemoryOrderProcessor {
    async fn current_order(&self) -> Result<Order, ProcessorError> {
        self.order
            .read()
            .await
            .clone()
            .ok_or(ProcessorError::NoCurrentOrder)
    }

    async fn create_payment(
        &self,
        order_id: u64,
        amount: Money,
    ) -> Result<PaymentRecord, ProcessorError> {
        Ok(self.insert_payment(order_id, amount).await)
    }

    async fn load_payment_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<PaymentRecord>, ProcessorError> {
        let payments = self.payments.read().await;
        Ok(payments.get(hash).cloned())
    }

    async fn process_payment(&self, payment_id: u64, amount: Money) -> Result<(), ProcessorError> {
        let mut payments = self.payments.write().await;
        let payment = payments
            .values_mut()
            .find(|p| p.id == payment_id)
            .ok_or(ProcessorError::PaymentNotFound(payment_id))?;

        if payment.is_paid() {
            return Err(ProcessorError::AlreadyProcessed(payment_id));
        }
        if payment.amount != amount {
            return Err(ProcessorError::AmountMismatch {
                id: payment_id,
                expected: payment.amount.value(),
                actual: amount.value(),
            });
        }
        payment.status = PaymentStatus::Paid;
        Ok(())
    }
}

/// Currency directory backed by a fixed map of order currency to gateway code.
#[derive(Debug, Clone)]
pub struct InMemoryCurrencies {
    codes: HashMap<String, String>,
}

impl InMemoryCurrencies {
    pub fn new<I, K, V>(codes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            codes: codes
                .into_iter()
                .map(|(k, v)| (k.into().to_uppercase(), v.into()))
                .collect(),
        }
    }
}

impl Default for InMemoryCurrencies {
    fn default() -> Self {
        Self::new([("RUB", "RUB"), ("USD", "USD"), ("EUR", "EUR")])
    }
}

impl CurrencyDirectory for InMemoryCurrencies {
    fn currency_code(&self, currency: &str) -> Option<String> {
        self.codes.get(&currency.trim().to_uppercase()).cloned()
    }
}
