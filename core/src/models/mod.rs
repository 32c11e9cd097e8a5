//! Domain models: registration records and payment ledger entries.

pub mod payment;
pub mod registration;

pub use payment::{PaymentRecord, PaymentRecordStatus};
pub use registration::{
    ConfirmOutcome, CustomerDetails, LifecycleStage, PaymentMethod, PaymentStatus, PricingBlock,
    RegistrationError, RegistrationRecord, RegistrationType, SponsorTier, TEMP_ID_PREFIX,
};
