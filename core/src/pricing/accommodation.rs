//! Accommodation add-on pricing.
//!
//! The registration UI encodes a hotel choice as a composite key
//! `"<hotelId>-<roomType>-<nights>"` (e.g. `grand-palace-double-3`).
//! This module parses that key into a validated selection and computes
//! the add-on fee as nightly rate x nights.
//!
//! An unknown hotel/room combination is a hard error. The pricing core
//! never substitutes zero or a placeholder for a missing rate; "N/A"
//! is a display concern that lives outside this crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::catalog::PricingCatalog;
use crate::core::money::{Currency, Money};
use crate::pricing::PricingError;

/// Hotel room category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Single,
    Double,
    Triple,
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RoomType::Single => "single",
            RoomType::Double => "double",
            RoomType::Triple => "triple",
        };
        f.write_str(s)
    }
}

impl FromStr for RoomType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(RoomType::Single),
            "double" => Ok(RoomType::Double),
            "triple" => Ok(RoomType::Triple),
            _ => Err(()),
        }
    }
}

/// A validated accommodation choice: which hotel, which room, how long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccommodationSelection {
    pub hotel_id: String,
    pub room_type: RoomType,
    pub nights: u32,
}

impl AccommodationSelection {
    /// Create a selection, validating `nights >= 1` at the boundary.
    pub fn new(
        hotel_id: impl Into<String>,
        room_type: RoomType,
        nights: u32,
    ) -> Result<Self, PricingError> {
        if nights == 0 {
            return Err(PricingError::InvalidNights(nights));
        }
        Ok(Self {
            hotel_id: hotel_id.into(),
            room_type,
            nights,
        })
    }

    /// Parse the UI composite key `"<hotelId>-<roomType>-<nights>"`.
    ///
    /// Hotel IDs may themselves contain hyphens, so the room type and
    /// nights are taken from the tail of the key.
    ///
    /// # Example
    /// ```
    /// use registration_core::{AccommodationSelection, RoomType};
    ///
    /// let sel = AccommodationSelection::parse_composite("grand-palace-double-3").unwrap();
    /// assert_eq!(sel.hotel_id, "grand-palace");
    /// assert_eq!(sel.room_type, RoomType::Double);
    /// assert_eq!(sel.nights, 3);
    /// ```
    pub fn parse_composite(key: &str) -> Result<Self, PricingError> {
        let malformed = || PricingError::MalformedAccommodationKey(key.to_string());

        let (rest, nights_str) = key.rsplit_once('-').ok_or_else(malformed)?;
        let (hotel_id, room_str) = rest.rsplit_once('-').ok_or_else(malformed)?;
        if hotel_id.is_empty() {
            return Err(malformed());
        }

        let room_type = room_str.parse::<RoomType>().map_err(|_| malformed())?;
        let nights = nights_str.parse::<u32>().map_err(|_| malformed())?;
        Self::new(hotel_id, room_type, nights)
    }

    /// Render back to the UI composite key format.
    pub fn composite_key(&self) -> String {
        format!("{}-{}-{}", self.hotel_id, self.room_type, self.nights)
    }
}

/// Compute the accommodation fee: nightly rate x nights.
///
/// Fails with `UnknownHotelOrRoomType` when the catalog has no rate
/// for the (hotel, room type, currency) combination.
pub fn calculate(
    catalog: &PricingCatalog,
    selection: &AccommodationSelection,
    currency: Currency,
) -> Result<Money, PricingError> {
    if selection.nights == 0 {
        return Err(PricingError::InvalidNights(selection.nights));
    }
    let rate = catalog.room_rate(&selection.hotel_id, selection.room_type, currency)?;
    rate.checked_mul(selection.nights)
        .map_err(|_| PricingError::AmountOverflow)
}
