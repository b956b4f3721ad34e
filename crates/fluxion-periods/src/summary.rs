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

//! Raw periods to [`PeriodSummary`] values.
//!
//! Every statistic comes from the billed interval prices, never from the
//! smoothed prices the builder segmented on.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use fluxion_period_types::{
    DayReference, PeriodConfig, PeriodSummary, PriceLevel, RatingLevel, Thresholds, Volatility,
};

use crate::builder::RawPeriod;
use crate::stats;

/// Relaxation facts stamped onto every summary of one result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxationMarks {
    pub level: u32,
    pub original: Thresholds,
    pub applied: Thresholds,
}

impl RelaxationMarks {
    /// Marks for an unrelaxed run
    pub fn unrelaxed(original: Thresholds) -> Self {
        Self {
            level: 0,
            original,
            applied: original,
        }
    }
}

/// Summarize chronologically ordered raw periods.
///
/// Position fields count only the periods passed in, so call this after all filters.
pub fn summarize(
    periods: &[RawPeriod<'_>],
    days: &BTreeMap<NaiveDate, DayReference>,
    config: &PeriodConfig,
    marks: RelaxationMarks,
) -> Vec<PeriodSummary> {
    let total = periods.len();
    periods
        .iter()
        .enumerate()
        .filter_map(|(idx, period)| summarize_one(period, days, config, marks, idx + 1, total))
        .collect()
}

fn summarize_one(
    period: &RawPeriod<'_>,
    days: &BTreeMap<NaiveDate, DayReference>,
    config: &PeriodConfig,
    marks: RelaxationMarks,
    position: usize,
    total: usize,
) -> Option<PeriodSummary> {
    let first = period.first()?;
    let start = first.starts_at;
    let end = period.end()?;

    let prices: Vec<f64> = period.intervals.iter().map(|i| i.price).collect();
    let price_avg = stats::mean(&prices)?;
    let (price_min, price_max) = stats::min_max(&prices)?;
    let price_median = stats::median(&prices)?;

    let differences: Vec<f64> = period.intervals.iter().map(|i| i.difference_pct).collect();
    let rating_difference_pct = stats::mean(&differences).unwrap_or(0.0);
    let rating_level = RatingLevel::classify(
        rating_difference_pct,
        config.rating_threshold_low_pct,
        config.rating_threshold_high_pct,
    );

    let (volatility, coefficient_of_variation_pct) = classify_volatility(&prices, config);

    let price_diff_from_day_avg_pct = days
        .get(&first.local_date())
        .filter(|day| day.average_price != 0.0)
        .map(|day| (price_avg - day.average_price) / day.average_price.abs() * 100.0)
        .unwrap_or(0.0);

    Some(PeriodSummary {
        start,
        end,
        interval_count: period.len(),
        duration_minutes: (end - start).num_minutes(),
        level: median_level(period.intervals.iter().map(|i| i.level)),
        rating_level,
        rating_difference_pct,
        price_avg,
        price_min,
        price_max,
        price_spread: price_max - price_min,
        price_median,
        price_diff_from_day_avg_pct,
        volatility,
        coefficient_of_variation_pct,
        period_position: position,
        periods_total: total,
        periods_remaining: total - position,
        relaxation_active: marks.level > 0,
        relaxation_level: marks.level,
        relaxation_threshold_original_pct: marks.original.flex_pct,
        relaxation_threshold_applied_pct: marks.applied.flex_pct,
        min_distance_applied_pct: marks.applied.min_distance_from_avg_pct,
    })
}

/// Median level by ordinal rank, lower-middle element for even counts
pub fn median_level(levels: impl IntoIterator<Item = PriceLevel>) -> PriceLevel {
    let mut sorted: Vec<PriceLevel> = levels.into_iter().collect();
    if sorted.is_empty() {
        return PriceLevel::Normal;
    }
    sorted.sort_by_key(|level| level.rank());
    sorted[(sorted.len() - 1) / 2]
}

/// Volatility class and the CV it came from (0 when undefined)
pub fn classify_volatility(prices: &[f64], config: &PeriodConfig) -> (Volatility, f64) {
    match stats::coefficient_of_variation_pct(prices) {
        Some(cv) => (
            Volatility::classify(
                cv,
                config.volatility_threshold_moderate_pct,
                config.volatility_threshold_high_pct,
                config.volatility_threshold_very_high_pct,
            ),
            cv,
        ),
        None => (Volatility::Low, 0.0),
    }
}
