//! Persistence seams: registration store and payment ledger.
//!
//! The coordinator only ever talks to these traits. The in-memory
//! implementations back tests and local runs; a CMS- or
//! database-backed store plugs in behind the same interface.
//!
//! `update_guarded` is the optimistic-concurrency primitive: the write
//! applies only if the stored record's lifecycle stage still matches
//! what the caller read. The stage (not the coarser payment status)
//! is the guard because Draft and PendingPayment share a `pending`
//! payment status, and the Draft -> PendingPayment link is exactly
//! the transition racing order creations must not overwrite. A
//! mismatch means another writer got there first; the caller re-reads
//! and reconciles.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::payment::PaymentRecord;
use crate::models::registration::{LifecycleStage, RegistrationRecord};

pub use memory::{InMemoryPaymentLedger, InMemoryRegistrationStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("registration {0} already exists")]
    DuplicateRegistration(String),

    #[error("registration {0} not found")]
    NotFound(String),

    /// The guarded update lost a race: the stored record moved on.
    #[error("concurrent update: expected stage {expected}, found {actual}")]
    Conflict {
        expected: LifecycleStage,
        actual: LifecycleStage,
    },

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Registration persistence.
///
/// The registration ID assigned at draft creation is the permanent
/// primary key; the gateway order ID is a secondary index added when
/// the order is linked.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn create(&self, record: RegistrationRecord) -> Result<(), StoreError>;

    async fn get(&self, registration_id: &str) -> Result<Option<RegistrationRecord>, StoreError>;

    async fn find_by_gateway_order(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<RegistrationRecord>, StoreError>;

    /// Replace the stored record iff its lifecycle stage still equals
    /// `expected`. Returns `Conflict` otherwise.
    async fn update_guarded(
        &self,
        expected: LifecycleStage,
        record: RegistrationRecord,
    ) -> Result<(), StoreError>;
}

/// Payment ledger persistence. Entries are never deleted.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    async fn append(&self, record: PaymentRecord) -> Result<(), StoreError>;

    async fn find(&self, order_id: &str) -> Result<Option<PaymentRecord>, StoreError>;

    async fn update(&self, record: PaymentRecord) -> Result<(), StoreError>;
}
