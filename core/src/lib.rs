//! # Registration Core
//!
//! Pricing and payment-reconciliation core for conference
//! registrations.
//!
//! ## Architecture
//!
//! - **catalog**: validated price tables (registration types, sponsor
//!   tiers, hotel room rates) keyed by currency and pricing period,
//!   with a TTL cache in front of the source
//! - **pricing**: resolves a selection into an immutable price quote;
//!   accommodation add-ons priced as nightly rate x nights
//! - **models**: the registration record state machine and the payment
//!   ledger entry
//! - **gateway**: PayPal, Razorpay, and sandbox adapters behind one
//!   trait, with retryable/terminal error classification
//! - **store**: persistence seams with guarded (optimistic) updates
//! - **coordinator**: orchestrates draft -> order -> confirmation with
//!   idempotent, race-tolerant writes
//!
//! ## Critical Invariants
//!
//! 1. All money values are i64 minor units (cents/paise/pence).
//!    Floating point appears only at the configuration and HTTP
//!    boundaries.
//! 2. A missing price entry is a configuration error, never a zero.
//! 3. Registration state moves forward only; confirmations are
//!    idempotent and conflicting transactions are reported, not
//!    overwritten.
//! 4. The record is persisted before any gateway call, so a failed
//!    checkout never loses the registration.

pub mod catalog;
pub mod coordinator;
pub mod core;
pub mod gateway;
pub mod models;
pub mod pricing;
pub mod store;

pub use crate::core::money::{Currency, Money, MoneyError};
pub use catalog::cache::{CachedCatalog, CatalogSource};
pub use catalog::periods::{PeriodId, PricingPeriod};
pub use catalog::{CatalogConfig, CatalogError, PricingCatalog};
pub use coordinator::{
    Confirmation, ConfirmationStatus, CoordinatorError, CreatedOrder, OrderIntent,
    ReconciliationCoordinator,
};
pub use gateway::{
    GatewayError, GatewayOrder, OrderRequest, PayPalConfig, PayPalGateway, PaymentGateway,
    RazorpayConfig, RazorpayGateway, SandboxGateway,
};
pub use models::{
    ConfirmOutcome, CustomerDetails, LifecycleStage, PaymentMethod, PaymentRecord,
    PaymentRecordStatus, PaymentStatus, PricingBlock, RegistrationError, RegistrationRecord,
    RegistrationType, SponsorTier,
};
pub use pricing::accommodation::{AccommodationSelection, RoomType};
pub use pricing::{resolve, PriceQuote, PricingError, RegistrationKind, RegistrationSelection};
pub use store::{
    InMemoryPaymentLedger, InMemoryRegistrationStore, PaymentLedger, RegistrationStore, StoreError,
};
