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

//! Day-local reference prices.
//!
//! "Cheapest" is always a same-day comparison, so every local calendar day gets
//! its own reference (min for best price, max for peak price) and average.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use fluxion_period_types::{DayReference, PriceInterval, ReferenceData};

use crate::stats;

/// Group intervals by local calendar date, keeping chronological order inside each day
pub fn split_by_day(intervals: &[PriceInterval]) -> BTreeMap<NaiveDate, Vec<&PriceInterval>> {
    let mut days: BTreeMap<NaiveDate, Vec<&PriceInterval>> = BTreeMap::new();
    for interval in intervals {
        days.entry(interval.local_date()).or_default().push(interval);
    }
    days
}

/// Max price for peak mode, min price for best mode
pub fn reference(day_intervals: &[&PriceInterval], reverse_sort: bool) -> Option<f64> {
    let prices: Vec<f64> = day_intervals.iter().map(|i| i.price).collect();
    let (min, max) = stats::min_max(&prices)?;
    Some(if reverse_sort { max } else { min })
}

/// Arithmetic mean of the day's prices
pub fn average(day_intervals: &[&PriceInterval]) -> Option<f64> {
    let prices: Vec<f64> = day_intervals.iter().map(|i| i.price).collect();
    stats::mean(&prices)
}

/// Reference rows for every day present in `intervals`
pub fn day_references(
    intervals: &[PriceInterval],
    reverse_sort: bool,
) -> BTreeMap<NaiveDate, DayReference> {
    split_by_day(intervals)
        .into_iter()
        .filter_map(|(date, day)| {
            let prices: Vec<f64> = day.iter().map(|i| i.price).collect();
            let (min_price, max_price) = stats::min_max(&prices)?;
            Some((
                date,
                DayReference {
                    date,
                    reference_price: reference(&day, reverse_sort)?,
                    average_price: average(&day)?,
                    min_price,
                    max_price,
                    interval_count: day.len(),
                },
            ))
        })
        .collect()
}

/// Output-facing copy of the per-day references, ordered by date
pub fn to_reference_data(days: &BTreeMap<NaiveDate, DayReference>) -> ReferenceData {
    ReferenceData {
        days: days.values().cloned().collect(),
    }
}
