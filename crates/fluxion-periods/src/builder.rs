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

//! Period builder: one chronological pass deciding which intervals form periods.
//!
//! ## Membership test
//!
//! An interval on day `d` qualifies when all of these hold (best price / peak price):
//!
//! | Test | Best price | Peak price |
//! |------|-----------|------------|
//! | flex | `p <= ref + |ref| * flex` | `p >= ref - |ref| * flex` |
//! | average side | `p <= avg` | `p >= avg` |
//! | min distance | `p <= avg - |avg| * dist` | `p >= avg + |avg| * dist` |
//! | level | `level ∈ level_filter` | same |
//!
//! For positive references the flex test is the usual `(p - ref) / ref * 100 <= flex`
//! (best) or `>= -flex` (peak). Using `|ref|` keeps the band pointing the right way on
//! days with negative prices.
//!
//! ## Gaps and day boundaries
//!
//! Up to `gap_count` consecutive failing intervals are skipped without closing the
//! period. A longer streak, a hole in the data or a local date change closes it.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use fluxion_period_types::{
    DayReference, PeriodConfig, PriceInterval, PriceLevel, Thresholds, interval_duration,
};
use tracing::trace;

/// Chronological run of qualifying intervals, not yet summarized
#[derive(Debug, Clone, PartialEq)]
pub struct RawPeriod<'a> {
    pub intervals: Vec<&'a PriceInterval>,
}

impl<'a> RawPeriod<'a> {
    pub fn first(&self) -> Option<&'a PriceInterval> {
        self.intervals.first().copied()
    }

    pub fn last(&self) -> Option<&'a PriceInterval> {
        self.intervals.last().copied()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn start(&self) -> Option<DateTime<FixedOffset>> {
        self.first().map(|i| i.starts_at)
    }

    /// Exclusive end of the last interval
    pub fn end(&self) -> Option<DateTime<FixedOffset>> {
        self.last().map(PriceInterval::ends_at)
    }
}

/// Criteria for one segmentation pass
#[derive(Debug, Clone, Copy)]
pub struct SegmentationCriteria<'c> {
    pub config: &'c PeriodConfig,
    /// Flex and min-distance of the current attempt
    pub thresholds: Thresholds,
}

impl<'c> SegmentationCriteria<'c> {
    pub fn new(config: &'c PeriodConfig, thresholds: Thresholds) -> Self {
        Self { config, thresholds }
    }

    fn reverse_sort(&self) -> bool {
        self.config.reverse_sort
    }

    /// Flex band test against the day reference
    pub fn within_flex(&self, price: f64, day: &DayReference) -> bool {
        let reference = day.reference_price;
        let band = reference.abs() * self.thresholds.flex_pct / 100.0;
        if self.reverse_sort() {
            price >= reference - band
        } else {
            price <= reference + band
        }
    }

    /// Correct side of the day average
    pub fn on_average_side(&self, price: f64, day: &DayReference) -> bool {
        if self.reverse_sort() {
            price >= day.average_price
        } else {
            price <= day.average_price
        }
    }

    /// Far enough from the day average
    pub fn far_enough_from_average(&self, price: f64, day: &DayReference) -> bool {
        let average = day.average_price;
        let distance = average.abs() * self.thresholds.min_distance_from_avg_pct / 100.0;
        if self.reverse_sort() {
            price >= average + distance
        } else {
            price <= average - distance
        }
    }

    /// Flex, average side and min distance, ignoring the level filter
    pub fn price_qualifies(&self, price: f64, day: &DayReference) -> bool {
        self.within_flex(price, day)
            && self.on_average_side(price, day)
            && self.far_enough_from_average(price, day)
    }

    /// Full membership test for one interval
    pub fn qualifies(&self, price: f64, level: PriceLevel, day: &DayReference) -> bool {
        self.price_qualifies(price, day) && self.config.accepts_level(level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Outside,
    Inside { gap_streak: u32 },
}

/// Segment `intervals` into raw periods.
///
/// `intervals` must be sorted and deduplicated by start; `prices` holds the
/// segmentation price for each interval (see [`crate::outlier::smooth_outliers`]).
pub fn build_periods<'a>(
    intervals: &'a [PriceInterval],
    prices: &[f64],
    days: &BTreeMap<NaiveDate, DayReference>,
    criteria: &SegmentationCriteria<'_>,
) -> Vec<RawPeriod<'a>> {
    let mut periods = Vec::new();
    let mut current: Vec<&'a PriceInterval> = Vec::new();
    let mut state = ScanState::Outside;
    let mut previous: Option<&PriceInterval> = None;

    for (interval, &price) in intervals.iter().zip(prices) {
        let breaks_chain = previous.is_some_and(|prev| {
            prev.local_date() != interval.local_date()
                || interval.starts_at - prev.starts_at != interval_duration()
        });
        if breaks_chain {
            close(&mut current, &mut periods);
            state = ScanState::Outside;
        }
        previous = Some(interval);

        let Some(day) = days.get(&interval.local_date()) else {
            continue;
        };

        if criteria.qualifies(price, interval.level, day) {
            current.push(interval);
            state = ScanState::Inside { gap_streak: 0 };
            continue;
        }

        if let ScanState::Inside { gap_streak } = state {
            if gap_streak < criteria.config.gap_count {
                trace!(at = %interval.starts_at, gap_streak = gap_streak + 1, "tolerating gap");
                state = ScanState::Inside {
                    gap_streak: gap_streak + 1,
                };
            } else {
                close(&mut current, &mut periods);
                state = ScanState::Outside;
            }
        }
    }

    close(&mut current, &mut periods);
    periods
}

fn close<'a>(current: &mut Vec<&'a PriceInterval>, periods: &mut Vec<RawPeriod<'a>>) {
    if !current.is_empty() {
        periods.push(RawPeriod {
            intervals: std::mem::take(current),
        });
    }
}
