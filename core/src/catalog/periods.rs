//! Pricing period windows and active-period selection.
//!
//! A conference runs three named pricing windows: early bird, next
//! round, and spot registration. Exactly one window applies to any
//! given instant; selection is deterministic and never guesses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a pricing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PeriodId {
    EarlyBird,
    NextRound,
    SpotRegistration,
}

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PeriodId::EarlyBird => "earlyBird",
            PeriodId::NextRound => "nextRound",
            PeriodId::SpotRegistration => "spotRegistration",
        };
        f.write_str(s)
    }
}

/// A named time window during which a fixed price table applies.
///
/// # Boundary Semantics
/// Containment is half-open `[start, end)`:
/// - `at < start`: not yet open
/// - `at == start`: open
/// - `at == end`: closed (the next window owns this instant)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPeriod {
    pub id: PeriodId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
}

impl PricingPeriod {
    /// Whether this window contains the given instant.
    ///
    /// Inactive windows never contain anything.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.is_active && at >= self.start_date && at < self.end_date
    }
}

/// Select the pricing period that applies at `at`.
///
/// Rules, in order:
/// 1. Among active windows containing `at`, the earliest-starting one
///    wins (early bird takes precedence over later rounds if an
///    operator misconfigures an overlap).
/// 2. If no window contains `at` but `at` is at or after the start of
///    the spot-registration window, spot registration applies:
///    walk-in pricing does not expire.
/// 3. Otherwise there is no active period and the caller must fail,
///    not guess.
pub fn select_active(periods: &[PricingPeriod], at: DateTime<Utc>) -> Option<&PricingPeriod> {
    let containing = periods
        .iter()
        .filter(|p| p.contains(at))
        .min_by_key(|p| p.start_date);
    if containing.is_some() {
        return containing;
    }

    periods
        .iter()
        .find(|p| p.id == PeriodId::SpotRegistration && p.is_active && at >= p.start_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn three_periods() -> Vec<PricingPeriod> {
        vec![
            PricingPeriod {
                id: PeriodId::EarlyBird,
                start_date: ts(2026, 1, 1),
                end_date: ts(2026, 3, 1),
                is_active: true,
            },
            PricingPeriod {
                id: PeriodId::NextRound,
                start_date: ts(2026, 3, 1),
                end_date: ts(2026, 6, 1),
                is_active: true,
            },
            PricingPeriod {
                id: PeriodId::SpotRegistration,
                start_date: ts(2026, 6, 1),
                end_date: ts(2026, 7, 1),
                is_active: true,
            },
        ]
    }

    #[test]
    fn test_selects_containing_window() {
        let periods = three_periods();
        let p = select_active(&periods, ts(2026, 2, 15)).unwrap();
        assert_eq!(p.id, PeriodId::EarlyBird);
    }

    #[test]
    fn test_half_open_boundary() {
        let periods = three_periods();
        // The shared boundary instant belongs to the later window.
        let p = select_active(&periods, ts(2026, 3, 1)).unwrap();
        assert_eq!(p.id, PeriodId::NextRound);
    }

    #[test]
    fn test_earliest_start_wins_on_overlap() {
        let mut periods = three_periods();
        // Misconfigured overlap: next round opened a month early.
        periods[1].start_date = ts(2026, 2, 1);
        let p = select_active(&periods, ts(2026, 2, 15)).unwrap();
        assert_eq!(p.id, PeriodId::EarlyBird);
    }

    #[test]
    fn test_spot_fallback_after_all_windows() {
        let periods = three_periods();
        let p = select_active(&periods, ts(2026, 8, 15)).unwrap();
        assert_eq!(p.id, PeriodId::SpotRegistration);
    }

    #[test]
    fn test_none_before_first_window() {
        let periods = three_periods();
        assert!(select_active(&periods, ts(2025, 12, 1)).is_none());
    }

    #[test]
    fn test_inactive_window_skipped() {
        let mut periods = three_periods();
        periods[0].is_active = false;
        assert!(select_active(&periods, ts(2026, 2, 15)).is_none());
    }
}
