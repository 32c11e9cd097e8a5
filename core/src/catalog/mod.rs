//! Pricing catalog: the validated price tables consulted by the
//! resolver.
//!
//! The catalog is built once at startup from a `CatalogConfig`
//! (CMS-sourced or file-sourced, major-unit decimal prices) and
//! validated eagerly: an incomplete currency/period grid, a
//! non-positive price, or an overlapping period configuration fails
//! the build. Unknown keys therefore fail fast at load time instead of
//! surfacing as "Unknown Hotel" strings at request time.
//!
//! All prices inside a built catalog are `Money` (i64 minor units).

pub mod cache;
pub mod periods;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::core::money::{Currency, Money, MoneyError};
use crate::models::registration::SponsorTier;
use crate::pricing::accommodation::RoomType;
use crate::pricing::PricingError;
use periods::{PeriodId, PricingPeriod};

/// Errors detected while building a catalog from configuration.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no pricing periods configured")]
    NoPeriods,

    #[error("pricing period {0} has start on or after end")]
    InvalidPeriodWindow(PeriodId),

    #[error("pricing period {0} configured more than once")]
    DuplicatePeriod(PeriodId),

    #[error("pricing periods {first} and {second} overlap")]
    OverlappingPeriods { first: PeriodId, second: PeriodId },

    #[error("registration type {0} configured more than once")]
    DuplicateRegistrationType(String),

    #[error("no price for {entry} in {currency} during {period}")]
    MissingPrice {
        entry: String,
        currency: Currency,
        period: PeriodId,
    },

    #[error("duplicate price for {entry} in {currency} during {period}")]
    DuplicatePrice {
        entry: String,
        currency: Currency,
        period: PeriodId,
    },

    #[error("price for {entry} must be positive")]
    NonPositivePrice { entry: String },

    #[error("hotel {hotel_id} room {room_type} configured more than once")]
    DuplicateHotelRoom {
        hotel_id: String,
        room_type: RoomType,
    },

    #[error("no nightly rate for hotel {hotel_id} room {room_type} in {currency}")]
    MissingRoomRate {
        hotel_id: String,
        room_type: RoomType,
        currency: Currency,
    },

    #[error("duplicate nightly rate for hotel {hotel_id} room {room_type} in {currency}")]
    DuplicateRoomRate {
        hotel_id: String,
        room_type: RoomType,
        currency: Currency,
    },

    #[error("invalid amount for {entry}: {source}")]
    InvalidAmount {
        entry: String,
        #[source]
        source: MoneyError,
    },

    #[error("catalog source error: {0}")]
    Source(String),
}

/// One (currency, period) -> price cell of a price grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceEntry {
    pub currency: Currency,
    pub period: PeriodId,
    /// Major-unit decimal amount as configured (e.g. `299.0`).
    pub amount: f64,
}

/// Price grid for one regular attendee category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationTypeConfig {
    pub id: String,
    pub name: String,
    pub prices: Vec<PriceEntry>,
}

/// Price grid for one sponsorship tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorTierConfig {
    pub tier: SponsorTier,
    pub prices: Vec<PriceEntry>,
}

/// Nightly rate for one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRateEntry {
    pub currency: Currency,
    /// Major-unit decimal nightly rate.
    pub per_night: f64,
}

/// Rates for one room category of a hotel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRateConfig {
    pub room_type: RoomType,
    pub rates: Vec<RoomRateEntry>,
}

/// One hotel with its room categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelConfig {
    pub id: String,
    pub name: String,
    pub rooms: Vec<RoomRateConfig>,
}

/// Raw catalog configuration, as loaded from the CMS or a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogConfig {
    pub pricing_periods: Vec<PricingPeriod>,
    pub registration_types: Vec<RegistrationTypeConfig>,
    pub sponsor_tiers: Vec<SponsorTierConfig>,
    pub hotels: Vec<HotelConfig>,
}

impl CatalogConfig {
    /// Validate and convert into a queryable `PricingCatalog`.
    pub fn build(self) -> Result<PricingCatalog, CatalogError> {
        PricingCatalog::from_config(self)
    }

    /// A small fully-populated catalog used by doctests and demos.
    ///
    /// Early bird runs Jan-Mar 2026, next round Mar-Jun, spot
    /// registration from June onward.
    pub fn sample() -> Self {
        use chrono::TimeZone;
        let ts = |m: u32, d: u32| chrono::Utc.with_ymd_and_hms(2026, m, d, 0, 0, 0).unwrap();

        // [earlyBird, nextRound, spotRegistration] per currency
        fn grid(usd: [f64; 3], eur: [f64; 3], gbp: [f64; 3], inr: [f64; 3]) -> Vec<PriceEntry> {
            const PERIODS: [PeriodId; 3] = [
                PeriodId::EarlyBird,
                PeriodId::NextRound,
                PeriodId::SpotRegistration,
            ];
            let mut out = Vec::with_capacity(12);
            for (currency, amounts) in [
                (Currency::USD, usd),
                (Currency::EUR, eur),
                (Currency::GBP, gbp),
                (Currency::INR, inr),
            ] {
                for (period, amount) in PERIODS.into_iter().zip(amounts) {
                    out.push(PriceEntry {
                        currency,
                        period,
                        amount,
                    });
                }
            }
            out
        }

        fn rates(usd: f64, eur: f64, gbp: f64, inr: f64) -> Vec<RoomRateEntry> {
            vec![
                RoomRateEntry {
                    currency: Currency::USD,
                    per_night: usd,
                },
                RoomRateEntry {
                    currency: Currency::EUR,
                    per_night: eur,
                },
                RoomRateEntry {
                    currency: Currency::GBP,
                    per_night: gbp,
                },
                RoomRateEntry {
                    currency: Currency::INR,
                    per_night: inr,
                },
            ]
        }

        CatalogConfig {
            pricing_periods: vec![
                PricingPeriod {
                    id: PeriodId::EarlyBird,
                    start_date: ts(1, 1),
                    end_date: ts(3, 1),
                    is_active: true,
                },
                PricingPeriod {
                    id: PeriodId::NextRound,
                    start_date: ts(3, 1),
                    end_date: ts(6, 1),
                    is_active: true,
                },
                PricingPeriod {
                    id: PeriodId::SpotRegistration,
                    start_date: ts(6, 1),
                    end_date: ts(7, 1),
                    is_active: true,
                },
            ],
            registration_types: vec![
                RegistrationTypeConfig {
                    id: "speaker".to_string(),
                    name: "Speaker Registration".to_string(),
                    prices: grid(
                        [299.0, 399.0, 499.0],
                        [279.0, 369.0, 459.0],
                        [239.0, 319.0, 399.0],
                        [24900.0, 33100.0, 41400.0],
                    ),
                },
                RegistrationTypeConfig {
                    id: "delegate".to_string(),
                    name: "Delegate Registration".to_string(),
                    prices: grid(
                        [399.0, 499.0, 599.0],
                        [369.0, 459.0, 549.0],
                        [319.0, 399.0, 479.0],
                        [33100.0, 41400.0, 49700.0],
                    ),
                },
            ],
            sponsor_tiers: vec![
                SponsorTierConfig {
                    tier: SponsorTier::Platinum,
                    prices: grid(
                        [7500.0; 3],
                        [6900.0; 3],
                        [5900.0; 3],
                        [622500.0; 3],
                    ),
                },
                SponsorTierConfig {
                    tier: SponsorTier::Gold,
                    prices: grid([6000.0; 3], [5500.0; 3], [4700.0; 3], [498000.0; 3]),
                },
                SponsorTierConfig {
                    tier: SponsorTier::Silver,
                    prices: grid([5000.0; 3], [4600.0; 3], [3900.0; 3], [415000.0; 3]),
                },
                SponsorTierConfig {
                    tier: SponsorTier::Exhibitor,
                    prices: grid([3000.0; 3], [2750.0; 3], [2350.0; 3], [249000.0; 3]),
                },
            ],
            hotels: vec![
                HotelConfig {
                    id: "grand-palace".to_string(),
                    name: "Grand Palace Hotel".to_string(),
                    rooms: vec![
                        RoomRateConfig {
                            room_type: RoomType::Single,
                            rates: rates(150.0, 140.0, 120.0, 12450.0),
                        },
                        RoomRateConfig {
                            room_type: RoomType::Double,
                            rates: rates(250.0, 230.0, 200.0, 20750.0),
                        },
                        RoomRateConfig {
                            room_type: RoomType::Triple,
                            rates: rates(320.0, 295.0, 255.0, 26560.0),
                        },
                    ],
                },
                HotelConfig {
                    id: "city-inn".to_string(),
                    name: "City Inn".to_string(),
                    rooms: vec![
                        RoomRateConfig {
                            room_type: RoomType::Single,
                            rates: rates(90.0, 83.0, 71.0, 7470.0),
                        },
                        RoomRateConfig {
                            room_type: RoomType::Double,
                            rates: rates(140.0, 129.0, 111.0, 11620.0),
                        },
                    ],
                },
            ],
        }
    }
}

/// Validated, queryable price tables.
///
/// Read-only after construction; share behind an `Arc` (see
/// [`cache::CachedCatalog`]).
#[derive(Debug, Clone)]
pub struct PricingCatalog {
    periods: Vec<PricingPeriod>,
    registration_names: HashMap<String, String>,
    registration_prices: HashMap<(String, Currency, PeriodId), Money>,
    sponsor_prices: HashMap<(SponsorTier, Currency, PeriodId), Money>,
    room_rates: HashMap<(String, RoomType, Currency), Money>,
}

impl PricingCatalog {
    fn from_config(config: CatalogConfig) -> Result<Self, CatalogError> {
        let periods = validate_periods(config.pricing_periods)?;
        let period_ids: Vec<PeriodId> = periods.iter().map(|p| p.id).collect();

        let mut registration_names = HashMap::new();
        let mut registration_prices = HashMap::new();
        for rt in &config.registration_types {
            if registration_names
                .insert(rt.id.clone(), rt.name.clone())
                .is_some()
            {
                return Err(CatalogError::DuplicateRegistrationType(rt.id.clone()));
            }
            load_price_grid(
                &rt.id,
                &rt.prices,
                &period_ids,
                |currency, period, price| {
                    registration_prices.insert((rt.id.clone(), currency, period), price)
                },
            )?;
        }

        let mut sponsor_prices = HashMap::new();
        let mut seen_tiers = HashSet::new();
        for tier_cfg in &config.sponsor_tiers {
            if !seen_tiers.insert(tier_cfg.tier) {
                return Err(CatalogError::DuplicateRegistrationType(
                    tier_cfg.tier.to_string(),
                ));
            }
            load_price_grid(
                &tier_cfg.tier.to_string(),
                &tier_cfg.prices,
                &period_ids,
                |currency, period, price| {
                    sponsor_prices.insert((tier_cfg.tier, currency, period), price)
                },
            )?;
        }

        let mut room_rates = HashMap::new();
        for hotel in &config.hotels {
            for room in &hotel.rooms {
                let mut seen = HashSet::new();
                for rate in &room.rates {
                    if !seen.insert(rate.currency) {
                        return Err(CatalogError::DuplicateRoomRate {
                            hotel_id: hotel.id.clone(),
                            room_type: room.room_type,
                            currency: rate.currency,
                        });
                    }
                    let entry = format!("{}/{}", hotel.id, room.room_type);
                    let money = Money::from_major(rate.per_night).map_err(|source| {
                        CatalogError::InvalidAmount {
                            entry: entry.clone(),
                            source,
                        }
                    })?;
                    if !money.is_positive() {
                        return Err(CatalogError::NonPositivePrice { entry });
                    }
                    if room_rates
                        .insert((hotel.id.clone(), room.room_type, rate.currency), money)
                        .is_some()
                    {
                        return Err(CatalogError::DuplicateHotelRoom {
                            hotel_id: hotel.id.clone(),
                            room_type: room.room_type,
                        });
                    }
                }
                for currency in Currency::ALL {
                    if !room_rates.contains_key(&(hotel.id.clone(), room.room_type, currency)) {
                        return Err(CatalogError::MissingRoomRate {
                            hotel_id: hotel.id.clone(),
                            room_type: room.room_type,
                            currency,
                        });
                    }
                }
            }
        }

        Ok(Self {
            periods,
            registration_names,
            registration_prices,
            sponsor_prices,
            room_rates,
        })
    }

    /// Configured pricing periods, sorted by start date.
    pub fn periods(&self) -> &[PricingPeriod] {
        &self.periods
    }

    /// Whether a registration type id exists in the catalog.
    pub fn has_registration_type(&self, type_id: &str) -> bool {
        self.registration_names.contains_key(type_id)
    }

    /// Price for a regular registration type.
    pub fn registration_price(
        &self,
        type_id: &str,
        currency: Currency,
        period: PeriodId,
    ) -> Result<Money, PricingError> {
        if !self.registration_names.contains_key(type_id) {
            return Err(PricingError::UnknownRegistrationType(type_id.to_string()));
        }
        self.registration_prices
            .get(&(type_id.to_string(), currency, period))
            .copied()
            .ok_or(PricingError::MissingPriceEntry {
                type_id: type_id.to_string(),
                currency,
                period,
            })
    }

    /// Price for a sponsorship tier.
    pub fn sponsor_price(
        &self,
        tier: SponsorTier,
        currency: Currency,
        period: PeriodId,
    ) -> Result<Money, PricingError> {
        self.sponsor_prices
            .get(&(tier, currency, period))
            .copied()
            .ok_or(PricingError::MissingPriceEntry {
                type_id: tier.to_string(),
                currency,
                period,
            })
    }

    /// Nightly rate for a hotel room.
    pub fn room_rate(
        &self,
        hotel_id: &str,
        room_type: RoomType,
        currency: Currency,
    ) -> Result<Money, PricingError> {
        self.room_rates
            .get(&(hotel_id.to_string(), room_type, currency))
            .copied()
            .ok_or_else(|| PricingError::UnknownHotelOrRoomType {
                hotel_id: hotel_id.to_string(),
                room_type: room_type.to_string(),
            })
    }
}

fn validate_periods(mut periods: Vec<PricingPeriod>) -> Result<Vec<PricingPeriod>, CatalogError> {
    if periods.is_empty() {
        return Err(CatalogError::NoPeriods);
    }

    let mut seen = HashSet::new();
    for period in &periods {
        if period.start_date >= period.end_date {
            return Err(CatalogError::InvalidPeriodWindow(period.id));
        }
        if !seen.insert(period.id) {
            return Err(CatalogError::DuplicatePeriod(period.id));
        }
    }

    periods.sort_by_key(|p| p.start_date);

    // Windows are half-open, so a shared boundary instant is fine;
    // genuine overlap of active windows is an operator mistake.
    for pair in periods.windows(2) {
        if pair[0].is_active && pair[1].is_active && pair[1].start_date < pair[0].end_date {
            return Err(CatalogError::OverlappingPeriods {
                first: pair[0].id,
                second: pair[1].id,
            });
        }
    }

    Ok(periods)
}

/// Validate one price grid: every configured period x every supported
/// currency must carry exactly one positive price.
fn load_price_grid<F>(
    entry: &str,
    prices: &[PriceEntry],
    period_ids: &[PeriodId],
    mut insert: F,
) -> Result<(), CatalogError>
where
    F: FnMut(Currency, PeriodId, Money) -> Option<Money>,
{
    let mut seen = HashSet::new();
    for price in prices {
        if !seen.insert((price.currency, price.period)) {
            return Err(CatalogError::DuplicatePrice {
                entry: entry.to_string(),
                currency: price.currency,
                period: price.period,
            });
        }
        let money =
            Money::from_major(price.amount).map_err(|source| CatalogError::InvalidAmount {
                entry: entry.to_string(),
                source,
            })?;
        if !money.is_positive() {
            return Err(CatalogError::NonPositivePrice {
                entry: entry.to_string(),
            });
        }
        insert(price.currency, price.period, money);
    }

    for &period in period_ids {
        for currency in Currency::ALL {
            if !seen.contains(&(currency, period)) {
                return Err(CatalogError::MissingPrice {
                    entry: entry.to_string(),
                    currency,
                    period,
                });
            }
        }
    }

    Ok(())
}
