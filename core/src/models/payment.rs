//! Gateway payment ledger entries.
//!
//! One entry per gateway order, written when the order is created and
//! updated when the gateway confirms or declines. Entries are
//! append-only from the caller's point of view: they are never
//! deleted, so the ledger remains a complete audit trail even for
//! orders that were abandoned at checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::money::{Currency, Money};
use crate::models::registration::PaymentMethod;

/// Status of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentRecordStatus {
    /// Order created at the gateway, awaiting the customer.
    Created,
    /// Gateway reported a successful capture.
    Confirmed,
    /// Gateway reported failure or the customer abandoned.
    Declined,
}

/// One payment ledger entry, keyed by the gateway order ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    gateway: PaymentMethod,
    order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_id: Option<String>,
    amount: Money,
    currency: Currency,
    status: PaymentRecordStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn new(
        gateway: PaymentMethod,
        order_id: impl Into<String>,
        amount: Money,
        currency: Currency,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            gateway,
            order_id: order_id.into(),
            payment_id: None,
            amount,
            currency,
            status: PaymentRecordStatus::Created,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn gateway(&self) -> PaymentMethod {
        self.gateway
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn payment_id(&self) -> Option<&str> {
        self.payment_id.as_deref()
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn status(&self) -> PaymentRecordStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Record a successful capture. Idempotent.
    pub fn confirm(&mut self, payment_id: impl Into<String>, now: DateTime<Utc>) {
        if self.status != PaymentRecordStatus::Confirmed {
            self.status = PaymentRecordStatus::Confirmed;
            self.payment_id = Some(payment_id.into());
            self.updated_at = now;
        }
    }

    /// Record a decline. Idempotent; never overwrites a confirmation.
    pub fn decline(&mut self, now: DateTime<Utc>) {
        if self.status == PaymentRecordStatus::Created {
            self.status = PaymentRecordStatus::Declined;
            self.updated_at = now;
        }
    }
}
