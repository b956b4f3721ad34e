// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use chrono::{DateTime, FixedOffset, TimeZone};
use fluxion_period_types::INTERVAL_MINUTES;

use crate::builder::RawPeriod;

/// Drop periods covering fewer than `min_minutes` of qualifying intervals
pub fn filter_min_length<'a>(periods: Vec<RawPeriod<'a>>, min_minutes: u32) -> Vec<RawPeriod<'a>> {
    periods
        .into_iter()
        .filter(|period| period.len() as i64 * INTERVAL_MINUTES >= i64::from(min_minutes))
        .collect()
}

/// Drop periods that have already fully elapsed.
///
/// A period goes when its end is at or before local midnight of `now`'s day, or
/// strictly before `now`. One that started yesterday and ends later today stays.
pub fn filter_relevant<'a>(
    periods: Vec<RawPeriod<'a>>,
    now: DateTime<FixedOffset>,
) -> Vec<RawPeriod<'a>> {
    let midnight_today = local_midnight(now);
    periods
        .into_iter()
        .filter(|period| {
            period
                .end()
                .is_some_and(|end| end > midnight_today && end >= now)
        })
        .collect()
}

/// Start of `now`'s local calendar day
pub fn local_midnight(now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let naive_midnight = now.date_naive().and_time(chrono::NaiveTime::MIN);
    // fixed offsets never produce ambiguous or skipped local times
    now.offset()
        .from_local_datetime(&naive_midnight)
        .single()
        .unwrap_or(now)
}
