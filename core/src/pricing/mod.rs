//! Pricing resolution.
//!
//! Turns a registration selection (type or sponsor tier, currency,
//! as-of instant, optional accommodation, participant count) into an
//! immutable `PriceQuote`.
//!
//! # Critical Invariants
//!
//! 1. A missing price entry is a configuration error, never a zero.
//! 2. Participant count multiplies the registration fee only;
//!    accommodation is chosen independently of head count.
//! 3. Quotes are tagged with the pricing period used, for audit and
//!    later re-verification.

pub mod accommodation;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::periods::{self, PeriodId};
use crate::catalog::PricingCatalog;
use crate::core::money::{Currency, Money};
use crate::models::registration::SponsorTier;
use accommodation::AccommodationSelection;

/// Errors from pricing resolution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("unknown registration type: {0}")]
    UnknownRegistrationType(String),

    #[error("no active pricing period at {as_of}")]
    NoActivePricingPeriod { as_of: DateTime<Utc> },

    #[error("no price configured for {type_id} in {currency} during {period}")]
    MissingPriceEntry {
        type_id: String,
        currency: Currency,
        period: PeriodId,
    },

    #[error("unknown hotel or room type: {hotel_id} / {room_type}")]
    UnknownHotelOrRoomType {
        hotel_id: String,
        room_type: String,
    },

    #[error("accommodation nights must be at least 1, got {0}")]
    InvalidNights(u32),

    #[error("malformed accommodation key: {0}")]
    MalformedAccommodationKey(String),

    #[error("participant count must be at least 1")]
    InvalidParticipantCount,

    #[error("price computation overflowed")]
    AmountOverflow,
}

/// Which price table a selection consults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum RegistrationKind {
    /// A regular attendee category, priced from the registration type
    /// table.
    Regular { type_id: String },

    /// A sponsorship package, priced from the sponsor tier table with
    /// the same currency/period keys.
    Sponsorship { tier: SponsorTier },
}

/// Everything needed to price a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationSelection {
    pub kind: RegistrationKind,
    pub currency: Currency,
    /// Instant the price is being resolved for (normally "now";
    /// injectable for tests and re-verification).
    pub as_of: DateTime<Utc>,
    pub accommodation: Option<AccommodationSelection>,
    pub participant_count: u32,
}

/// An immutable price quote.
///
/// `total = registration_fee * participant_count + accommodation_fee`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub registration_fee: Money,
    pub accommodation_fee: Money,
    pub total_price: Money,
    pub currency: Currency,
    pub pricing_period: PeriodId,
}

/// Resolve a selection against the catalog.
///
/// # Example
/// ```
/// # use chrono::{TimeZone, Utc};
/// # use registration_core::catalog::CatalogConfig;
/// # use registration_core::{resolve, Currency, RegistrationKind, RegistrationSelection};
/// # let catalog = CatalogConfig::sample().build().unwrap();
/// let quote = resolve(
///     &catalog,
///     &RegistrationSelection {
///         kind: RegistrationKind::Regular { type_id: "speaker".into() },
///         currency: Currency::USD,
///         as_of: Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap(),
///         accommodation: None,
///         participant_count: 2,
///     },
/// )
/// .unwrap();
/// assert_eq!(quote.total_price.minor_units(), quote.registration_fee.minor_units() * 2);
/// ```
pub fn resolve(
    catalog: &PricingCatalog,
    selection: &RegistrationSelection,
) -> Result<PriceQuote, PricingError> {
    if selection.participant_count == 0 {
        return Err(PricingError::InvalidParticipantCount);
    }

    let period = periods::select_active(catalog.periods(), selection.as_of)
        .ok_or(PricingError::NoActivePricingPeriod {
            as_of: selection.as_of,
        })?
        .id;

    let registration_fee = match &selection.kind {
        RegistrationKind::Regular { type_id } => {
            catalog.registration_price(type_id, selection.currency, period)?
        }
        RegistrationKind::Sponsorship { tier } => {
            catalog.sponsor_price(*tier, selection.currency, period)?
        }
    };

    let accommodation_fee = match &selection.accommodation {
        Some(sel) => accommodation::calculate(catalog, sel, selection.currency)?,
        None => Money::ZERO,
    };

    // Head count scales the registration fee only.
    let total_price = registration_fee
        .checked_mul(selection.participant_count.max(1))
        .and_then(|fees| fees.checked_add(accommodation_fee))
        .map_err(|_| PricingError::AmountOverflow)?;

    Ok(PriceQuote {
        registration_fee,
        accommodation_fee,
        total_price,
        currency: selection.currency,
        pricing_period: period,
    })
}
