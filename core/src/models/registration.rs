//! Registration record model
//!
//! Represents one conference registration moving through the payment
//! lifecycle:
//! - Created as a Draft under a temporary `TEMP-REG-` identifier
//! - Linked to a gateway order (temp ID retained as the primary key,
//!   the gateway order ID becomes a lookup alias)
//! - Completed or failed by a gateway confirmation, idempotently
//! - Refunded only from Completed, only by explicit admin action
//!
//! CRITICAL: All money values are i64 minor units. Transitions are
//! monotonic; any backward move is rejected with `InvalidTransition`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::catalog::periods::PeriodId;
use crate::core::money::{Currency, Money};
use crate::pricing::accommodation::AccommodationSelection;
use crate::pricing::PriceQuote;

/// Prefix of temporary registration identifiers.
pub const TEMP_ID_PREFIX: &str = "TEMP-REG-";

/// Category of attendee: which price table the registration consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationType {
    Regular,
    Sponsorship,
}

/// Sponsorship tier. Fixed set; an unknown tier is a parse error at
/// the boundary, never a runtime default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SponsorTier {
    Platinum,
    Gold,
    Silver,
    Exhibitor,
}

impl fmt::Display for SponsorTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SponsorTier::Platinum => "platinum",
            SponsorTier::Gold => "gold",
            SponsorTier::Silver => "silver",
            SponsorTier::Exhibitor => "exhibitor",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for SponsorTier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "platinum" => Ok(SponsorTier::Platinum),
            "gold" => Ok(SponsorTier::Gold),
            "silver" => Ok(SponsorTier::Silver),
            "exhibitor" => Ok(SponsorTier::Exhibitor),
            _ => Err(()),
        }
    }
}

/// Which gateway handled (or will handle) payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Paypal,
    Razorpay,
    Test,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::Razorpay => "razorpay",
            PaymentMethod::Test => "test",
        };
        f.write_str(s)
    }
}

/// Persisted payment status.
///
/// Monotonic: `Pending -> Completed -> Refunded` or
/// `Pending -> Failed`. `Refunded` is reachable only from `Completed`
/// and only via explicit administrative action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        };
        f.write_str(s)
    }
}

/// Lifecycle stage derived from persisted state.
///
/// `Pending` splits into `Draft` (no gateway order yet) and
/// `PendingPayment` (gateway order linked).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStage {
    Draft,
    PendingPayment,
    Completed,
    Failed,
    Refunded,
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleStage::Draft => "draft",
            LifecycleStage::PendingPayment => "pendingPayment",
            LifecycleStage::Completed => "completed",
            LifecycleStage::Failed => "failed",
            LifecycleStage::Refunded => "refunded",
        };
        f.write_str(s)
    }
}

/// Outcome of applying a payment confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The confirmation changed state.
    Applied,
    /// The confirmation had already been applied; no-op success.
    AlreadyApplied,
}

/// Errors from registration state transitions
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("invalid transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: LifecycleStage,
        to: LifecycleStage,
    },

    #[error("registration already linked to gateway order {existing}, refusing {incoming}")]
    AlreadyLinked { existing: String, incoming: String },

    #[error(
        "conflicting transaction for completed payment: recorded {existing}, received {incoming}"
    )]
    ConflictingTransaction { existing: String, incoming: String },
}

/// Contact details captured at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The pricing block persisted on a registration.
///
/// `pricing_period` is absent only for ad-hoc drafts created directly
/// from an order request, where no resolver quote exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingBlock {
    pub registration_fee: Money,
    pub accommodation_fee: Money,
    pub total_price: Money,
    pub currency: Currency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing_period: Option<PeriodId>,
}

impl From<PriceQuote> for PricingBlock {
    fn from(quote: PriceQuote) -> Self {
        Self {
            registration_fee: quote.registration_fee,
            accommodation_fee: quote.accommodation_fee,
            total_price: quote.total_price,
            currency: quote.currency,
            pricing_period: Some(quote.pricing_period),
        }
    }
}

/// One conference registration.
///
/// The registration ID is immutable once persisted. Linking a gateway
/// order populates `gateway_order_id`; it never replaces the primary
/// identifier, so a promotion that fails partway leaves no orphan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    registration_id: String,

    registration_type: RegistrationType,

    /// Catalog registration type id (absent for sponsorships and
    /// ad-hoc drafts).
    #[serde(skip_serializing_if = "Option::is_none")]
    selected_type_id: Option<String>,

    /// Required iff `registration_type` is `Sponsorship`.
    #[serde(skip_serializing_if = "Option::is_none")]
    sponsor_tier: Option<SponsorTier>,

    participant_count: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    accommodation: Option<AccommodationSelection>,

    pricing: PricingBlock,

    customer: CustomerDetails,

    payment_status: PaymentStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    payment_method: Option<PaymentMethod>,

    #[serde(skip_serializing_if = "Option::is_none")]
    gateway_order_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    gateway_transaction_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    failure_reason: Option<String>,

    registration_date: DateTime<Utc>,

    last_updated: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    payment_date: Option<DateTime<Utc>>,
}

impl RegistrationRecord {
    /// Create a Draft from a resolved price quote.
    ///
    /// Assigns a fresh temporary identifier (`TEMP-REG-<uuid>`).
    pub fn new_draft(
        registration_type: RegistrationType,
        selected_type_id: Option<String>,
        sponsor_tier: Option<SponsorTier>,
        participant_count: u32,
        accommodation: Option<AccommodationSelection>,
        quote: PriceQuote,
        customer: CustomerDetails,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            registration_id: new_temp_id(),
            registration_type,
            selected_type_id,
            sponsor_tier,
            participant_count: participant_count.max(1),
            accommodation,
            pricing: quote.into(),
            customer,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            gateway_order_id: None,
            gateway_transaction_id: None,
            failure_reason: None,
            registration_date: now,
            last_updated: now,
            payment_date: None,
        }
    }

    /// Create a minimal Draft directly from an order request (no
    /// resolver quote). Used when an order-creation request names no
    /// existing registration: a record must exist before the gateway
    /// call so nothing is lost if that call never completes.
    pub fn new_adhoc_draft(
        total: Money,
        currency: Currency,
        customer: CustomerDetails,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            registration_id: new_temp_id(),
            registration_type: RegistrationType::Regular,
            selected_type_id: None,
            sponsor_tier: None,
            participant_count: 1,
            accommodation: None,
            pricing: PricingBlock {
                registration_fee: total,
                accommodation_fee: Money::ZERO,
                total_price: total,
                currency,
                pricing_period: None,
            },
            customer,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            gateway_order_id: None,
            gateway_transaction_id: None,
            failure_reason: None,
            registration_date: now,
            last_updated: now,
            payment_date: None,
        }
    }

    /// Get registration ID
    pub fn registration_id(&self) -> &str {
        &self.registration_id
    }

    /// Whether the identifier is still a temporary one.
    pub fn has_temp_id(&self) -> bool {
        self.registration_id.starts_with(TEMP_ID_PREFIX)
    }

    pub fn registration_type(&self) -> RegistrationType {
        self.registration_type
    }

    pub fn selected_type_id(&self) -> Option<&str> {
        self.selected_type_id.as_deref()
    }

    pub fn sponsor_tier(&self) -> Option<SponsorTier> {
        self.sponsor_tier
    }

    pub fn participant_count(&self) -> u32 {
        self.participant_count
    }

    pub fn accommodation(&self) -> Option<&AccommodationSelection> {
        self.accommodation.as_ref()
    }

    pub fn pricing(&self) -> &PricingBlock {
        &self.pricing
    }

    pub fn customer(&self) -> &CustomerDetails {
        &self.customer
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    pub fn gateway_order_id(&self) -> Option<&str> {
        self.gateway_order_id.as_deref()
    }

    pub fn gateway_transaction_id(&self) -> Option<&str> {
        self.gateway_transaction_id.as_deref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn registration_date(&self) -> DateTime<Utc> {
        self.registration_date
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn payment_date(&self) -> Option<DateTime<Utc>> {
        self.payment_date
    }

    /// Derive the lifecycle stage from persisted state.
    pub fn lifecycle_stage(&self) -> LifecycleStage {
        match self.payment_status {
            PaymentStatus::Pending => {
                if self.gateway_order_id.is_some() {
                    LifecycleStage::PendingPayment
                } else {
                    LifecycleStage::Draft
                }
            }
            PaymentStatus::Completed => LifecycleStage::Completed,
            PaymentStatus::Failed => LifecycleStage::Failed,
            PaymentStatus::Refunded => LifecycleStage::Refunded,
        }
    }

    /// Link a gateway order: Draft -> PendingPayment (ID promotion).
    ///
    /// The record keeps its primary identifier; the gateway order ID
    /// becomes a secondary lookup alias.
    ///
    /// # Idempotency
    /// Re-linking the same order ID is a no-op success (safe to repeat
    /// if the first attempt's response was lost). Linking a different
    /// order ID onto an already-linked record is `AlreadyLinked`.
    pub fn link_gateway_order(
        &mut self,
        gateway_order_id: impl Into<String>,
        method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Result<(), RegistrationError> {
        let incoming = gateway_order_id.into();
        match self.lifecycle_stage() {
            LifecycleStage::Draft => {
                self.gateway_order_id = Some(incoming);
                self.payment_method = Some(method);
                self.last_updated = now;
                Ok(())
            }
            LifecycleStage::PendingPayment => {
                // PendingPayment implies the link exists.
                let existing = self.gateway_order_id.clone().unwrap_or_default();
                if existing == incoming {
                    Ok(())
                } else {
                    Err(RegistrationError::AlreadyLinked { existing, incoming })
                }
            }
            from => Err(RegistrationError::InvalidTransition {
                from,
                to: LifecycleStage::PendingPayment,
            }),
        }
    }

    /// Apply a payment confirmation: PendingPayment -> Completed.
    ///
    /// # Idempotency
    /// A repeat confirmation with the same transaction ID (a capture
    /// response racing its webhook) is `AlreadyApplied`. A different
    /// transaction ID on a Completed record is an inconsistency and is
    /// reported, never overwritten.
    pub fn complete_payment(
        &mut self,
        transaction_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<ConfirmOutcome, RegistrationError> {
        let incoming = transaction_id.into();
        match self.lifecycle_stage() {
            LifecycleStage::PendingPayment => {
                self.payment_status = PaymentStatus::Completed;
                self.gateway_transaction_id = Some(incoming);
                self.payment_date = Some(now);
                self.last_updated = now;
                Ok(ConfirmOutcome::Applied)
            }
            LifecycleStage::Completed => {
                match self.gateway_transaction_id.as_deref() {
                    Some(existing) if existing == incoming => Ok(ConfirmOutcome::AlreadyApplied),
                    Some(existing) => Err(RegistrationError::ConflictingTransaction {
                        existing: existing.to_string(),
                        incoming,
                    }),
                    // Completed without a transaction id should not
                    // happen; treat as conflict rather than patching.
                    None => Err(RegistrationError::ConflictingTransaction {
                        existing: String::new(),
                        incoming,
                    }),
                }
            }
            from => Err(RegistrationError::InvalidTransition {
                from,
                to: LifecycleStage::Completed,
            }),
        }
    }

    /// Apply a gateway decline: PendingPayment -> Failed. Terminal.
    ///
    /// # Idempotency
    /// Repeat failure notifications keep the original reason.
    pub fn fail_payment(
        &mut self,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), RegistrationError> {
        match self.lifecycle_stage() {
            LifecycleStage::PendingPayment => {
                self.payment_status = PaymentStatus::Failed;
                self.failure_reason = Some(reason.into());
                self.last_updated = now;
                Ok(())
            }
            LifecycleStage::Failed => Ok(()),
            from => Err(RegistrationError::InvalidTransition {
                from,
                to: LifecycleStage::Failed,
            }),
        }
    }

    /// Administrative refund: Completed -> Refunded only.
    pub fn refund(&mut self, now: DateTime<Utc>) -> Result<(), RegistrationError> {
        match self.lifecycle_stage() {
            LifecycleStage::Completed => {
                self.payment_status = PaymentStatus::Refunded;
                self.last_updated = now;
                Ok(())
            }
            LifecycleStage::Refunded => Ok(()),
            from => Err(RegistrationError::InvalidTransition {
                from,
                to: LifecycleStage::Refunded,
            }),
        }
    }
}

fn new_temp_id() -> String {
    format!("{}{}", TEMP_ID_PREFIX, uuid::Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn draft() -> RegistrationRecord {
        let quote = PriceQuote {
            registration_fee: Money::from_minor(29900),
            accommodation_fee: Money::ZERO,
            total_price: Money::from_minor(59800),
            currency: Currency::USD,
            pricing_period: PeriodId::EarlyBird,
        };
        RegistrationRecord::new_draft(
            RegistrationType::Regular,
            Some("speaker".to_string()),
            None,
            2,
            None,
            quote,
            CustomerDetails {
                email: "attendee@example.com".to_string(),
                name: Some("Dr. Jane Doe".to_string()),
            },
            now(),
        )
    }

    #[test]
    fn test_draft_has_temp_id() {
        let rec = draft();
        assert!(rec.has_temp_id());
        assert_eq!(rec.lifecycle_stage(), LifecycleStage::Draft);
        assert_eq!(rec.payment_status(), PaymentStatus::Pending);
    }

    #[test]
    fn test_link_then_relink_same_order_is_noop() {
        let mut rec = draft();
        rec.link_gateway_order("order_abc", PaymentMethod::Razorpay, now())
            .unwrap();
        assert_eq!(rec.lifecycle_stage(), LifecycleStage::PendingPayment);
        // Primary key unchanged; order id is an alias.
        assert!(rec.has_temp_id());

        rec.link_gateway_order("order_abc", PaymentMethod::Razorpay, now())
            .unwrap();
        assert_eq!(rec.gateway_order_id(), Some("order_abc"));
    }

    #[test]
    fn test_relink_different_order_rejected() {
        let mut rec = draft();
        rec.link_gateway_order("order_abc", PaymentMethod::Razorpay, now())
            .unwrap();
        let err = rec
            .link_gateway_order("order_xyz", PaymentMethod::Razorpay, now())
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::AlreadyLinked {
                existing: "order_abc".to_string(),
                incoming: "order_xyz".to_string(),
            }
        );
    }

    #[test]
    fn test_complete_is_idempotent_for_same_transaction() {
        let mut rec = draft();
        rec.link_gateway_order("order_abc", PaymentMethod::Paypal, now())
            .unwrap();

        let first = rec.complete_payment("txn_1", now()).unwrap();
        assert_eq!(first, ConfirmOutcome::Applied);
        let second = rec.complete_payment("txn_1", now()).unwrap();
        assert_eq!(second, ConfirmOutcome::AlreadyApplied);
        assert_eq!(rec.payment_status(), PaymentStatus::Completed);
    }

    #[test]
    fn test_conflicting_transaction_reported() {
        let mut rec = draft();
        rec.link_gateway_order("order_abc", PaymentMethod::Paypal, now())
            .unwrap();
        rec.complete_payment("txn_1", now()).unwrap();

        let err = rec.complete_payment("txn_2", now()).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::ConflictingTransaction {
                existing: "txn_1".to_string(),
                incoming: "txn_2".to_string(),
            }
        );
        // Record untouched by the conflicting confirmation.
        assert_eq!(rec.gateway_transaction_id(), Some("txn_1"));
    }

    #[test]
    fn test_cannot_complete_draft() {
        let mut rec = draft();
        let err = rec.complete_payment("txn_1", now()).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::InvalidTransition {
                from: LifecycleStage::Draft,
                to: LifecycleStage::Completed,
            }
        );
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut rec = draft();
        rec.link_gateway_order("order_abc", PaymentMethod::Razorpay, now())
            .unwrap();
        rec.fail_payment("card declined", now()).unwrap();

        assert!(rec.complete_payment("txn_1", now()).is_err());
        // Repeat failure keeps the original reason.
        rec.fail_payment("network glitch", now()).unwrap();
        assert_eq!(rec.failure_reason(), Some("card declined"));
    }

    #[test]
    fn test_refund_only_from_completed() {
        let mut rec = draft();
        assert!(rec.refund(now()).is_err());

        rec.link_gateway_order("order_abc", PaymentMethod::Paypal, now())
            .unwrap();
        assert!(rec.refund(now()).is_err());

        rec.complete_payment("txn_1", now()).unwrap();
        rec.refund(now()).unwrap();
        assert_eq!(rec.payment_status(), PaymentStatus::Refunded);

        // No way back.
        assert!(rec.complete_payment("txn_1", now()).is_err());
    }
}
