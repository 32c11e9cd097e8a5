//! Pricing resolution against the sample catalog.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use registration_core::{
    resolve, AccommodationSelection, CatalogConfig, Currency, Money, PricingCatalog, PricingError,
    RegistrationKind, RegistrationSelection, RoomType, SponsorTier,
};
use registration_core::catalog::periods::PeriodId;

fn catalog() -> PricingCatalog {
    CatalogConfig::sample().build().unwrap()
}

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn selection(kind: RegistrationKind, as_of: DateTime<Utc>) -> RegistrationSelection {
    RegistrationSelection {
        kind,
        currency: Currency::USD,
        as_of,
        accommodation: None,
        participant_count: 1,
    }
}

#[test]
fn test_early_bird_speaker_scales_with_participants() {
    let mut sel = selection(
        RegistrationKind::Regular {
            type_id: "speaker".to_string(),
        },
        at(2026, 2, 1),
    );
    sel.participant_count = 2;

    let quote = resolve(&catalog(), &sel).unwrap();
    assert_eq!(quote.registration_fee, Money::from_minor(29900));
    assert_eq!(quote.total_price, Money::from_minor(59800));
    assert_eq!(quote.pricing_period, PeriodId::EarlyBird);
}

#[test]
fn test_accommodation_added_once_regardless_of_headcount() {
    let mut sel = selection(
        RegistrationKind::Regular {
            type_id: "delegate".to_string(),
        },
        at(2026, 4, 1),
    );
    sel.participant_count = 3;
    sel.accommodation = Some(AccommodationSelection::new("grand-palace", RoomType::Double, 3).unwrap());

    let quote = resolve(&catalog(), &sel).unwrap();
    // nextRound delegate: 499.00 x 3 participants
    assert_eq!(quote.registration_fee, Money::from_minor(49900));
    // double at 250.00/night x 3 nights, once
    assert_eq!(quote.accommodation_fee, Money::from_minor(75000));
    assert_eq!(quote.total_price, Money::from_minor(3 * 49900 + 75000));
}

#[test]
fn test_spot_fallback_after_all_windows_close() {
    let sel = selection(
        RegistrationKind::Regular {
            type_id: "speaker".to_string(),
        },
        at(2026, 9, 15),
    );
    let quote = resolve(&catalog(), &sel).unwrap();
    assert_eq!(quote.pricing_period, PeriodId::SpotRegistration);
    assert_eq!(quote.registration_fee, Money::from_minor(49900));
}

#[test]
fn test_no_period_before_first_window() {
    let sel = selection(
        RegistrationKind::Regular {
            type_id: "speaker".to_string(),
        },
        at(2025, 11, 1),
    );
    assert!(matches!(
        resolve(&catalog(), &sel),
        Err(PricingError::NoActivePricingPeriod { .. })
    ));
}

#[test]
fn test_sponsor_tier_pricing_is_flat_across_periods() {
    let cat = catalog();
    for as_of in [at(2026, 2, 1), at(2026, 4, 1), at(2026, 6, 15)] {
        let quote = resolve(
            &cat,
            &selection(
                RegistrationKind::Sponsorship {
                    tier: SponsorTier::Gold,
                },
                as_of,
            ),
        )
        .unwrap();
        assert_eq!(quote.registration_fee, Money::from_minor(600_000));
    }
}

#[test]
fn test_unknown_registration_type_rejected() {
    let sel = selection(
        RegistrationKind::Regular {
            type_id: "vip".to_string(),
        },
        at(2026, 2, 1),
    );
    assert_eq!(
        resolve(&catalog(), &sel),
        Err(PricingError::UnknownRegistrationType("vip".to_string()))
    );
}

#[test]
fn test_zero_participants_rejected() {
    let mut sel = selection(
        RegistrationKind::Regular {
            type_id: "speaker".to_string(),
        },
        at(2026, 2, 1),
    );
    sel.participant_count = 0;
    assert_eq!(
        resolve(&catalog(), &sel),
        Err(PricingError::InvalidParticipantCount)
    );
}

#[test]
fn test_unknown_hotel_rejected() {
    let mut sel = selection(
        RegistrationKind::Regular {
            type_id: "speaker".to_string(),
        },
        at(2026, 2, 1),
    );
    sel.accommodation = Some(AccommodationSelection::new("no-such-hotel", RoomType::Single, 2).unwrap());
    assert!(matches!(
        resolve(&catalog(), &sel),
        Err(PricingError::UnknownHotelOrRoomType { .. })
    ));
}

proptest! {
    #[test]
    fn prop_accommodation_fee_is_rate_times_nights(nights in 1u32..=30) {
        let cat = catalog();
        let sel = AccommodationSelection::new("city-inn", RoomType::Double, nights).unwrap();
        let fee = registration_core::pricing::accommodation::calculate(&cat, &sel, Currency::USD).unwrap();
        prop_assert_eq!(fee.minor_units(), 14000 * i64::from(nights));
    }

    #[test]
    fn prop_total_is_fee_times_count_plus_accommodation(count in 1u32..=20, nights in 1u32..=14) {
        let cat = catalog();
        let sel = RegistrationSelection {
            kind: RegistrationKind::Regular { type_id: "delegate".to_string() },
            currency: Currency::EUR,
            as_of: at(2026, 2, 1),
            accommodation: Some(AccommodationSelection::new("grand-palace", RoomType::Single, nights).unwrap()),
            participant_count: count,
        };
        let quote = resolve(&cat, &sel).unwrap();
        prop_assert_eq!(
            quote.total_price.minor_units(),
            quote.registration_fee.minor_units() * i64::from(count)
                + quote.accommodation_fee.minor_units()
        );
    }
}
