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

//! Relaxation controller.
//!
//! Re-runs the pipeline (build, merge, length filter, relevance filter,
//! summarize) with progressively looser flex and min-distance thresholds until
//! `min_periods` is reached or the attempts run out.
//!
//! The controller keeps the result with the most periods seen so far, and a
//! later attempt wins ties. Asking for more attempts can therefore never shrink
//! the result.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use fluxion_period_types::{
    DayReference, DetectionWarning, PeriodConfig, PeriodSummary, PriceInterval,
    RelaxationOutcome, Thresholds,
};
use tracing::{debug, info, warn};

use crate::builder::{SegmentationCriteria, build_periods};
use crate::filters::{filter_min_length, filter_relevant};
use crate::merge::merge_midnight_adjacent;
use crate::outlier::smooth_outliers;
use crate::reference::day_references;
use crate::summary::{RelaxationMarks, summarize};

/// Everything that does not change between relaxation attempts
#[derive(Debug, Clone)]
pub struct PreparedInput<'a> {
    /// Sorted, deduplicated, finite intervals
    pub intervals: &'a [PriceInterval],
    pub days: BTreeMap<NaiveDate, DayReference>,
}

impl<'a> PreparedInput<'a> {
    pub fn new(intervals: &'a [PriceInterval], config: &PeriodConfig) -> Self {
        Self {
            intervals,
            days: day_references(intervals, config.reverse_sort),
        }
    }
}

/// One full pipeline run with the given thresholds.
///
/// Spike smoothing runs here, so each attempt judges spikes against its own thresholds.
pub fn run_pipeline(
    input: &PreparedInput<'_>,
    config: &PeriodConfig,
    marks: RelaxationMarks,
    now: DateTime<FixedOffset>,
) -> Vec<PeriodSummary> {
    let criteria = SegmentationCriteria::new(config, marks.applied);
    let prices = smooth_outliers(input.intervals, &input.days, &criteria, &config.outlier);
    let raw = build_periods(input.intervals, &prices, &input.days, &criteria);
    let built = raw.len();
    let merged = merge_midnight_adjacent(raw);
    let long_enough = filter_min_length(merged, config.min_period_length_minutes);
    let relevant = filter_relevant(long_enough, now);

    debug!(
        mode = config.mode().label(),
        level = marks.level,
        flex_pct = marks.applied.flex_pct,
        min_distance_pct = marks.applied.min_distance_from_avg_pct,
        built,
        kept = relevant.len(),
        "pipeline run finished"
    );

    summarize(&relevant, &input.days, config, marks)
}

/// Summaries plus what the controller did to get them
#[derive(Debug, Clone, PartialEq)]
pub struct RelaxedDetection {
    pub periods: Vec<PeriodSummary>,
    pub outcome: RelaxationOutcome,
    pub warning: Option<DetectionWarning>,
}

struct Candidate {
    level: u32,
    applied: Thresholds,
    periods: Vec<PeriodSummary>,
}

/// Run the pipeline, relaxing thresholds while fewer than `min_periods` are found
pub fn detect_with_relaxation(
    input: &PreparedInput<'_>,
    config: &PeriodConfig,
    now: DateTime<FixedOffset>,
) -> RelaxedDetection {
    let original = config.thresholds();
    let first = run_pipeline(input, config, RelaxationMarks::unrelaxed(original), now);
    let mut best = Candidate {
        level: 0,
        applied: original,
        periods: first,
    };
    let mut attempts_run = 1;

    let target = config.relaxation_target();
    let Some(required) = target.filter(|_| !input.intervals.is_empty()) else {
        return finish(best, attempts_run, original, target, None);
    };

    let mut attempt = 0;
    while best.periods.len() < required as usize && attempt < config.relaxation_attempts {
        attempt += 1;
        let applied = config.relaxation_step.apply(original, attempt);
        let marks = RelaxationMarks {
            level: attempt,
            original,
            applied,
        };
        let periods = run_pipeline(input, config, marks, now);
        attempts_run += 1;

        debug!(
            attempt,
            found = periods.len(),
            required,
            "relaxation attempt"
        );

        if periods.len() >= best.periods.len() {
            best = Candidate {
                level: attempt,
                applied,
                periods,
            };
        }
    }

    let found = best.periods.len();
    let warning = if found < required as usize {
        let warning = DetectionWarning::MinPeriodsUnreachable {
            required,
            found,
            attempts: config.relaxation_attempts,
            applied_flex_pct: best.applied.flex_pct,
        };
        warn!(mode = config.mode().label(), "{warning}");
        Some(warning)
    } else {
        if best.level > 0 {
            info!(
                mode = config.mode().label(),
                level = best.level,
                flex_pct = best.applied.flex_pct,
                found,
                "minimum period count reached by relaxation"
            );
        }
        None
    };

    finish(best, attempts_run, original, target, warning)
}

fn finish(
    best: Candidate,
    attempts_run: u32,
    original: Thresholds,
    target: Option<u32>,
    warning: Option<DetectionWarning>,
) -> RelaxedDetection {
    let outcome = RelaxationOutcome {
        active: best.level > 0,
        level: best.level,
        attempts_run,
        target,
        target_met: target.is_none_or(|required| best.periods.len() >= required as usize),
        original_flex_pct: original.flex_pct,
        applied_flex_pct: best.applied.flex_pct,
        original_min_distance_pct: original.min_distance_from_avg_pct,
        applied_min_distance_pct: best.applied.min_distance_from_avg_pct,
    };
    RelaxedDetection {
        periods: best.periods,
        outcome,
        warning,
    }
}
