//! Reconciliation coordinator.
//!
//! Drives the payment lifecycle across the store, the ledger, and the
//! gateway adapters:
//!
//! 1. `create_draft` persists a priced registration under a temporary
//!    ID before any gateway traffic, so an abandoned checkout still
//!    leaves an auditable record.
//! 2. `create_order` gets-or-creates the draft, creates the gateway
//!    order, and links it with a guarded write. The persisted total is
//!    authoritative: a client-supplied amount that disagrees with it
//!    is rejected, never charged.
//! 3. `confirm` applies a gateway outcome idempotently. Duplicate
//!    confirmations (capture response racing a webhook) are no-op
//!    successes; a different transaction ID on a completed record is
//!    an inconsistency and is reported.
//!
//! Guarded writes that lose a race are retried a bounded number of
//! times from a fresh read. Every attempt starts from stored state, so
//! a retry can discover the work was already done and converge.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::money::{Currency, Money};
use crate::gateway::{GatewayError, OrderRequest, PaymentGateway};
use crate::models::payment::PaymentRecord;
use crate::models::registration::{
    ConfirmOutcome, CustomerDetails, LifecycleStage, PaymentMethod, PaymentStatus,
    RegistrationError, RegistrationRecord, RegistrationType,
};
use crate::pricing::{self, PricingError, RegistrationKind, RegistrationSelection};
use crate::store::{PaymentLedger, RegistrationStore, StoreError};
use crate::PricingCatalog;

/// Bounded retries for guarded writes that lose a race.
const MAX_RECONCILE_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("no registration linked to gateway order {0}")]
    UnknownOrder(String),

    #[error("registration {0} not found")]
    UnknownRegistration(String),

    #[error("no gateway configured for payment method {0}")]
    UnsupportedPaymentMethod(PaymentMethod),

    #[error(
        "order amount disagrees with stored total: expected {expected} {currency}, got {provided}"
    )]
    AmountMismatch {
        expected: Money,
        provided: Money,
        currency: Currency,
    },

    #[error("order currency disagrees with stored registration: expected {expected}, got {provided}")]
    CurrencyMismatch {
        expected: Currency,
        provided: Currency,
    },

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A request to create a gateway order.
#[derive(Debug, Clone)]
pub struct OrderIntent {
    /// Existing registration to pay for; `None` creates an ad-hoc
    /// draft from the amount below.
    pub registration_id: Option<String>,
    pub amount: Money,
    pub currency: Currency,
    pub customer: CustomerDetails,
    pub method: PaymentMethod,
}

/// What the caller gets back from `create_order`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedOrder {
    pub order_id: String,
    pub registration_id: String,
    pub amount: Money,
    pub currency: Currency,
    pub status: String,
}

/// Gateway-reported outcome being confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationStatus {
    Completed,
    Failed,
}

/// Result of a confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub registration_id: String,
    pub payment_status: PaymentStatus,
    pub outcome: ConfirmOutcome,
}

pub struct ReconciliationCoordinator {
    store: Arc<dyn RegistrationStore>,
    ledger: Arc<dyn PaymentLedger>,
    gateways: HashMap<PaymentMethod, Arc<dyn PaymentGateway>>,
}

impl ReconciliationCoordinator {
    pub fn new(store: Arc<dyn RegistrationStore>, ledger: Arc<dyn PaymentLedger>) -> Self {
        Self {
            store,
            ledger,
            gateways: HashMap::new(),
        }
    }

    /// Register a gateway adapter for its payment method.
    pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateways.insert(gateway.method(), gateway);
        self
    }

    /// Price a selection and persist the resulting draft.
    pub async fn create_draft(
        &self,
        catalog: &PricingCatalog,
        selection: RegistrationSelection,
        customer: CustomerDetails,
    ) -> Result<RegistrationRecord, CoordinatorError> {
        let quote = pricing::resolve(catalog, &selection)?;

        let (registration_type, selected_type_id, sponsor_tier) = match &selection.kind {
            RegistrationKind::Regular { type_id } => {
                (RegistrationType::Regular, Some(type_id.clone()), None)
            }
            RegistrationKind::Sponsorship { tier } => {
                (RegistrationType::Sponsorship, None, Some(*tier))
            }
        };

        let record = RegistrationRecord::new_draft(
            registration_type,
            selected_type_id,
            sponsor_tier,
            selection.participant_count,
            selection.accommodation.clone(),
            quote,
            customer,
            Utc::now(),
        );
        self.store.create(record.clone()).await?;

        info!(
            registration_id = record.registration_id(),
            total_minor = quote.total_price.minor_units(),
            currency = %quote.currency,
            period = %quote.pricing_period,
            "draft registration created"
        );
        Ok(record)
    }

    /// Create a gateway order for a registration and link it.
    ///
    /// Repeating the call for an already-linked registration returns
    /// the existing order instead of creating a second one.
    pub async fn create_order(
        &self,
        intent: OrderIntent,
    ) -> Result<CreatedOrder, CoordinatorError> {
        let gateway = self
            .gateways
            .get(&intent.method)
            .cloned()
            .ok_or(CoordinatorError::UnsupportedPaymentMethod(intent.method))?;

        let record = self.get_or_create_draft(&intent).await?;
        let total = record.pricing().total_price;
        let currency = record.pricing().currency;

        if currency != intent.currency {
            return Err(CoordinatorError::CurrencyMismatch {
                expected: currency,
                provided: intent.currency,
            });
        }
        // The persisted quote is authoritative; the client-supplied
        // amount only confirms what the customer saw.
        if total != intent.amount {
            return Err(CoordinatorError::AmountMismatch {
                expected: total,
                provided: intent.amount,
                currency,
            });
        }

        if let Some(existing) = record.gateway_order_id() {
            let status = match self.ledger.find(existing).await? {
                Some(entry) => format!("{:?}", entry.status()).to_lowercase(),
                None => "created".to_string(),
            };
            info!(
                registration_id = record.registration_id(),
                order_id = existing,
                "order already linked, returning existing"
            );
            return Ok(CreatedOrder {
                order_id: existing.to_string(),
                registration_id: record.registration_id().to_string(),
                amount: total,
                currency,
                status,
            });
        }

        let order = gateway
            .create_order(&OrderRequest {
                amount: total,
                currency,
                registration_id: record.registration_id().to_string(),
                customer_email: record.customer().email.clone(),
                customer_name: record.customer().name.clone(),
            })
            .await?;

        let linked = self
            .link_order(record, &order.id, intent.method)
            .await?;

        self.ledger
            .append(PaymentRecord::new(
                intent.method,
                order.id.clone(),
                total,
                currency,
                Utc::now(),
            ))
            .await?;

        info!(
            registration_id = linked.registration_id(),
            order_id = %order.id,
            gateway = %intent.method,
            amount_minor = total.minor_units(),
            "gateway order created and linked"
        );

        Ok(CreatedOrder {
            order_id: order.id,
            registration_id: linked.registration_id().to_string(),
            amount: total,
            currency,
            status: order.status,
        })
    }

    /// Apply a gateway confirmation to the linked registration.
    pub async fn confirm(
        &self,
        gateway_order_id: &str,
        transaction_id: &str,
        status: ConfirmationStatus,
    ) -> Result<Confirmation, CoordinatorError> {
        let mut last_conflict: Option<StoreError> = None;

        for attempt in 0..MAX_RECONCILE_ATTEMPTS {
            let mut record = self
                .store
                .find_by_gateway_order(gateway_order_id)
                .await?
                .ok_or_else(|| CoordinatorError::UnknownOrder(gateway_order_id.to_string()))?;

            // The index is only trusted if the record still carries
            // this link; a stale alias must not confirm anything.
            if record.gateway_order_id() != Some(gateway_order_id) {
                return Err(CoordinatorError::UnknownOrder(gateway_order_id.to_string()));
            }

            let prior = record.lifecycle_stage();
            let now = Utc::now();

            let outcome = match status {
                ConfirmationStatus::Completed => record.complete_payment(transaction_id, now)?,
                ConfirmationStatus::Failed => {
                    let was_failed = record.payment_status() == PaymentStatus::Failed;
                    record.fail_payment(format!("gateway declined {transaction_id}"), now)?;
                    if was_failed {
                        ConfirmOutcome::AlreadyApplied
                    } else {
                        ConfirmOutcome::Applied
                    }
                }
            };

            if outcome == ConfirmOutcome::AlreadyApplied {
                return Ok(Confirmation {
                    registration_id: record.registration_id().to_string(),
                    payment_status: record.payment_status(),
                    outcome,
                });
            }

            match self.store.update_guarded(prior, record.clone()).await {
                Ok(()) => {
                    self.settle_ledger(gateway_order_id, transaction_id, status)
                        .await?;
                    info!(
                        registration_id = record.registration_id(),
                        order_id = gateway_order_id,
                        payment_status = %record.payment_status(),
                        "payment confirmation applied"
                    );
                    return Ok(Confirmation {
                        registration_id: record.registration_id().to_string(),
                        payment_status: record.payment_status(),
                        outcome,
                    });
                }
                Err(StoreError::Conflict { expected, actual }) => {
                    warn!(
                        order_id = gateway_order_id,
                        attempt,
                        %expected,
                        %actual,
                        "confirmation lost a write race, re-reading"
                    );
                    last_conflict = Some(StoreError::Conflict { expected, actual });
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(CoordinatorError::Store(last_conflict.unwrap_or(
            StoreError::Backend("reconcile attempts exhausted".to_string()),
        )))
    }

    /// Administrative refund. Only a completed registration can be
    /// refunded; the gateway-side money movement happens out of band.
    pub async fn refund(&self, registration_id: &str) -> Result<RegistrationRecord, CoordinatorError> {
        for _ in 0..MAX_RECONCILE_ATTEMPTS {
            let mut record = self
                .store
                .get(registration_id)
                .await?
                .ok_or_else(|| CoordinatorError::UnknownRegistration(registration_id.to_string()))?;

            let prior = record.lifecycle_stage();
            record.refund(Utc::now())?;
            if prior == LifecycleStage::Refunded {
                return Ok(record);
            }

            match self.store.update_guarded(prior, record.clone()).await {
                Ok(()) => {
                    info!(registration_id, "registration refunded");
                    return Ok(record);
                }
                Err(StoreError::Conflict { .. }) => continue,
                Err(other) => return Err(other.into()),
            }
        }

        Err(CoordinatorError::Store(StoreError::Backend(
            "reconcile attempts exhausted".to_string(),
        )))
    }

    pub async fn get_registration(
        &self,
        registration_id: &str,
    ) -> Result<RegistrationRecord, CoordinatorError> {
        self.store
            .get(registration_id)
            .await?
            .ok_or_else(|| CoordinatorError::UnknownRegistration(registration_id.to_string()))
    }

    async fn get_or_create_draft(
        &self,
        intent: &OrderIntent,
    ) -> Result<RegistrationRecord, CoordinatorError> {
        match &intent.registration_id {
            Some(id) => self
                .store
                .get(id)
                .await?
                .ok_or_else(|| CoordinatorError::UnknownRegistration(id.clone())),
            None => {
                let record = RegistrationRecord::new_adhoc_draft(
                    intent.amount,
                    intent.currency,
                    intent.customer.clone(),
                    Utc::now(),
                );
                self.store.create(record.clone()).await?;
                info!(
                    registration_id = record.registration_id(),
                    "ad-hoc draft created for direct order"
                );
                Ok(record)
            }
        }
    }

    /// Link the gateway order with a guarded write, reconciling the
    /// case where a concurrent request linked the same order first.
    async fn link_order(
        &self,
        mut record: RegistrationRecord,
        order_id: &str,
        method: PaymentMethod,
    ) -> Result<RegistrationRecord, CoordinatorError> {
        let prior = record.lifecycle_stage();
        record.link_gateway_order(order_id, method, Utc::now())?;

        match self.store.update_guarded(prior, record.clone()).await {
            Ok(()) => Ok(record),
            Err(StoreError::Conflict { .. }) => {
                let current = self
                    .store
                    .get(record.registration_id())
                    .await?
                    .ok_or_else(|| {
                        CoordinatorError::UnknownRegistration(record.registration_id().to_string())
                    })?;
                match current.gateway_order_id() {
                    Some(existing) if existing == order_id => Ok(current),
                    Some(existing) => Err(RegistrationError::AlreadyLinked {
                        existing: existing.to_string(),
                        incoming: order_id.to_string(),
                    }
                    .into()),
                    None => Err(StoreError::Conflict {
                        expected: prior,
                        actual: current.lifecycle_stage(),
                    }
                    .into()),
                }
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn settle_ledger(
        &self,
        order_id: &str,
        transaction_id: &str,
        status: ConfirmationStatus,
    ) -> Result<(), CoordinatorError> {
        // A missing entry (order created before the ledger existed) is
        // tolerated; the registration record remains the source of truth.
        if let Some(mut entry) = self.ledger.find(order_id).await? {
            let now = Utc::now();
            match status {
                ConfirmationStatus::Completed => entry.confirm(transaction_id, now),
                ConfirmationStatus::Failed => entry.decline(now),
            }
            self.ledger.update(entry).await?;
        }
        Ok(())
    }
}
