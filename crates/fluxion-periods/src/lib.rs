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

//! Best/peak price period detection for FluxION.
//!
//! Finds contiguous windows of quarter-hour intervals that are among the
//! cheapest (best price) or most expensive (peak price) of their local day and
//! summarizes them.
//!
//! ## Pipeline
//!
//! 1. **Prepare**: sort by start, drop duplicates and non-finite prices
//! 2. **Reference**: per-day reference (min or max) and average
//! 3. **Smooth**: interpolate short spikes between qualifying neighbours, for segmentation only
//! 4. **Build**: one chronological scan into raw periods
//! 5. **Merge**: stitch periods split at midnight
//! 6. **Filter**: minimum length, then drop fully elapsed periods
//! 7. **Summarize**: level, rating, volatility, price statistics
//!
//! Steps 3-7 repeat with looser thresholds while fewer than `min_periods`
//! periods are found (see [`relaxation`]).
//!
//! The engine is pure: no I/O, no clock. `now` is always passed in, so equal
//! inputs give equal outputs.

pub mod builder;
pub mod filters;
pub mod merge;
pub mod outlier;
pub mod reference;
pub mod relaxation;
pub mod stats;
pub mod summary;

use chrono::{DateTime, FixedOffset};
use tracing::{debug, info, warn};

pub use fluxion_period_types::*;

use crate::reference::to_reference_data;
use crate::relaxation::{PreparedInput, detect_with_relaxation};

/// Detect periods in already typed intervals.
///
/// Input order does not matter. Duplicate starts keep the first occurrence;
/// non-finite prices are skipped and reported as warnings.
pub fn detect_periods(
    intervals: &[PriceInterval],
    config: &PeriodConfig,
    now: DateTime<FixedOffset>,
) -> PeriodDetection {
    let mut warnings = Vec::new();
    let mut skipped = 0;

    let mut clean: Vec<PriceInterval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        if interval.price.is_finite() {
            clean.push(interval.clone());
        } else {
            let error = IntervalError::NonFiniteTotal(interval.starts_at);
            warn!("{error}");
            warnings.push(DetectionWarning::from(&error));
            skipped += 1;
        }
    }

    run_detection(clean, config, now, skipped, warnings)
}

/// Detect periods in loosely typed records from the price integration.
///
/// Records missing `starts_at` or `total` are skipped and counted in
/// `metadata.skipped_intervals`.
pub fn detect_periods_from_raw(
    raw: &[RawPriceInterval],
    config: &PeriodConfig,
    now: DateTime<FixedOffset>,
) -> PeriodDetection {
    let mut warnings = Vec::new();
    let mut skipped = 0;

    let mut clean: Vec<PriceInterval> = Vec::with_capacity(raw.len());
    for record in raw {
        match PriceInterval::try_from(record) {
            Ok(interval) => clean.push(interval),
            Err(error) => {
                warn!("{error}");
                warnings.push(DetectionWarning::from(&error));
                skipped += 1;
            }
        }
    }

    run_detection(clean, config, now, skipped, warnings)
}

fn run_detection(
    mut intervals: Vec<PriceInterval>,
    config: &PeriodConfig,
    now: DateTime<FixedOffset>,
    skipped_intervals: usize,
    mut warnings: Vec<DetectionWarning>,
) -> PeriodDetection {
    // stable sort keeps the first of equal starts ahead of later ones
    intervals.sort_by_key(|interval| interval.starts_at);
    let before_dedup = intervals.len();
    intervals.dedup_by_key(|interval| interval.starts_at);
    if intervals.len() < before_dedup {
        debug!(
            dropped = before_dedup - intervals.len(),
            "dropped intervals with duplicate start times"
        );
    }

    let input = PreparedInput::new(&intervals, config);
    let relaxed = detect_with_relaxation(&input, config, now);
    warnings.extend(relaxed.warning);

    info!(
        mode = config.mode().label(),
        intervals = intervals.len(),
        periods = relaxed.periods.len(),
        relaxation_level = relaxed.outcome.level,
        "period detection finished"
    );

    PeriodDetection {
        metadata: DetectionMetadata {
            total_periods: relaxed.periods.len(),
            config: config.clone(),
            relaxation: relaxed.outcome,
            skipped_intervals,
            warnings,
        },
        periods: relaxed.periods,
        reference_data: to_reference_data(&input.days),
    }
}
