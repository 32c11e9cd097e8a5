//! In-memory store and ledger.
//!
//! Backed by std `RwLock` (no await happens while a lock is held, so a
//! blocking lock inside async methods is fine). Lock poisoning is
//! reported as a backend error rather than panicking the caller.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::payment::PaymentRecord;
use crate::models::registration::{LifecycleStage, RegistrationRecord};

use super::{PaymentLedger, RegistrationStore, StoreError};

#[derive(Default)]
struct StoreInner {
    records: HashMap<String, RegistrationRecord>,
    /// gateway order ID -> registration ID
    by_order: HashMap<String, String>,
}

#[derive(Default)]
pub struct InMemoryRegistrationStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryRegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("store lock poisoned".to_string())
}

#[async_trait]
impl RegistrationStore for InMemoryRegistrationStore {
    async fn create(&self, record: RegistrationRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let id = record.registration_id().to_string();
        if inner.records.contains_key(&id) {
            return Err(StoreError::DuplicateRegistration(id));
        }
        if let Some(order_id) = record.gateway_order_id() {
            inner.by_order.insert(order_id.to_string(), id.clone());
        }
        inner.records.insert(id, record);
        Ok(())
    }

    async fn get(&self, registration_id: &str) -> Result<Option<RegistrationRecord>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.records.get(registration_id).cloned())
    }

    async fn find_by_gateway_order(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<RegistrationRecord>, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner
            .by_order
            .get(gateway_order_id)
            .and_then(|id| inner.records.get(id))
            .cloned())
    }

    async fn update_guarded(
        &self,
        expected: LifecycleStage,
        record: RegistrationRecord,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let id = record.registration_id().to_string();
        let stored = inner
            .records
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let actual = stored.lifecycle_stage();
        if actual != expected {
            return Err(StoreError::Conflict { expected, actual });
        }

        if let Some(order_id) = record.gateway_order_id() {
            inner.by_order.insert(order_id.to_string(), id.clone());
        }
        inner.records.insert(id, record);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryPaymentLedger {
    entries: RwLock<HashMap<String, PaymentRecord>>,
}

impl InMemoryPaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentLedger for InMemoryPaymentLedger {
    async fn append(&self, record: PaymentRecord) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(record.order_id().to_string(), record);
        Ok(())
    }

    async fn find(&self, order_id: &str) -> Result<Option<PaymentRecord>, StoreError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(order_id).cloned())
    }

    async fn update(&self, record: PaymentRecord) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let id = record.order_id().to_string();
        if !entries.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        entries.insert(id, record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::periods::PeriodId;
    use crate::core::money::{Currency, Money};
    use crate::models::registration::{
        CustomerDetails, PaymentMethod, RegistrationType,
    };
    use crate::pricing::PriceQuote;
    use chrono::Utc;

    fn draft() -> RegistrationRecord {
        RegistrationRecord::new_draft(
            RegistrationType::Regular,
            Some("delegate".to_string()),
            None,
            1,
            None,
            PriceQuote {
                registration_fee: Money::from_minor(39900),
                accommodation_fee: Money::ZERO,
                total_price: Money::from_minor(39900),
                currency: Currency::USD,
                pricing_period: PeriodId::NextRound,
            },
            CustomerDetails {
                email: "x@y.z".to_string(),
                name: None,
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryRegistrationStore::new();
        let rec = draft();
        let id = rec.registration_id().to_string();
        store.create(rec).await.unwrap();

        let fetched = store.get(&id).await.unwrap().unwrap();
        assert_eq!(fetched.registration_id(), id);

        assert!(matches!(
            store.create(fetched).await,
            Err(StoreError::DuplicateRegistration(_))
        ));
    }

    #[tokio::test]
    async fn test_guarded_update_detects_race() {
        let store = InMemoryRegistrationStore::new();
        let mut rec = draft();
        store.create(rec.clone()).await.unwrap();

        rec.link_gateway_order("order_1", PaymentMethod::Test, Utc::now())
            .unwrap();

        // Stored copy is still a Draft, so guarding on Draft works...
        store
            .update_guarded(LifecycleStage::Draft, rec.clone())
            .await
            .unwrap();

        // ...and a second writer guarding on Draft now loses.
        let err = store
            .update_guarded(LifecycleStage::Draft, rec)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Conflict {
                expected: LifecycleStage::Draft,
                actual: LifecycleStage::PendingPayment,
            }
        ));
    }

    #[tokio::test]
    async fn test_stale_draft_reader_cannot_overwrite_link() {
        let store = InMemoryRegistrationStore::new();
        let rec = draft();
        store.create(rec.clone()).await.unwrap();

        // Two writers read the same Draft.
        let mut first = rec.clone();
        let mut second = rec;

        first
            .link_gateway_order("order_A", PaymentMethod::Test, Utc::now())
            .unwrap();
        store
            .update_guarded(LifecycleStage::Draft, first)
            .await
            .unwrap();

        // The stale reader links a different order; the guard must
        // reject it even though the payment status is still pending.
        second
            .link_gateway_order("order_B", PaymentMethod::Test, Utc::now())
            .unwrap();
        let err = store
            .update_guarded(LifecycleStage::Draft, second)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Conflict {
                expected: LifecycleStage::Draft,
                actual: LifecycleStage::PendingPayment,
            }
        ));

        // The losing order never became an alias; the winner's link
        // is intact.
        assert!(store
            .find_by_gateway_order("order_B")
            .await
            .unwrap()
            .is_none());
        let stored = store
            .find_by_gateway_order("order_A")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.gateway_order_id(), Some("order_A"));
    }

    #[tokio::test]
    async fn test_order_index_follows_link() {
        let store = InMemoryRegistrationStore::new();
        let mut rec = draft();
        let id = rec.registration_id().to_string();
        store.create(rec.clone()).await.unwrap();

        rec.link_gateway_order("order_42", PaymentMethod::Test, Utc::now())
            .unwrap();
        store
            .update_guarded(LifecycleStage::Draft, rec)
            .await
            .unwrap();

        let fetched = store
            .find_by_gateway_order("order_42")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.registration_id(), id);
    }
}
