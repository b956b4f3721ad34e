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

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PeriodConfig;
use crate::interval::{IntervalError, PriceLevel, RatingLevel};

// ============= Volatility =============

/// Price dispersion inside a window, from the coefficient of variation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Volatility {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl Volatility {
    /// Classify a CV (%) against the three thresholds.
    ///
    /// Each band includes its lower bound, so a CV exactly at a threshold lands in the higher band.
    #[must_use]
    pub fn classify(cv_pct: f64, moderate_pct: f64, high_pct: f64, very_high_pct: f64) -> Self {
        if cv_pct >= very_high_pct {
            Self::VeryHigh
        } else if cv_pct >= high_pct {
            Self::High
        } else if cv_pct >= moderate_pct {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Moderate => "MODERATE",
            Self::High => "HIGH",
            Self::VeryHigh => "VERY_HIGH",
        }
    }
}

impl std::fmt::Display for Volatility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============= Period Summary =============

/// One detected best/peak price window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// Start of the first interval
    pub start: DateTime<FixedOffset>,
    /// Exclusive end (last interval start + 15 minutes)
    pub end: DateTime<FixedOffset>,
    /// Number of qualifying intervals inside the window
    pub interval_count: usize,
    /// Span between start and end
    pub duration_minutes: i64,

    /// Median level by ordinal rank
    pub level: PriceLevel,
    /// Rating of the mean difference
    pub rating_level: RatingLevel,
    /// Mean of the intervals' trailing-24h differences (%)
    pub rating_difference_pct: f64,

    pub price_avg: f64,
    pub price_min: f64,
    pub price_max: f64,
    pub price_spread: f64,
    pub price_median: f64,
    /// Period mean against the start day's mean (%)
    pub price_diff_from_day_avg_pct: f64,

    pub volatility: Volatility,
    pub coefficient_of_variation_pct: f64,

    /// 1-based position among the returned periods
    pub period_position: usize,
    pub periods_total: usize,
    pub periods_remaining: usize,

    pub relaxation_active: bool,
    /// 0 means the original thresholds were used
    pub relaxation_level: u32,
    pub relaxation_threshold_original_pct: f64,
    pub relaxation_threshold_applied_pct: f64,
    pub min_distance_applied_pct: f64,
}

impl PeriodSummary {
    /// Whether `at` falls inside [start, end)
    #[must_use]
    pub fn contains(&self, at: DateTime<FixedOffset>) -> bool {
        self.start <= at && at < self.end
    }
}

// ============= Reference Data =============

/// Day-local statistics the builder compared against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayReference {
    pub date: NaiveDate,
    /// Min for best price, max for peak price
    pub reference_price: f64,
    pub average_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub interval_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub days: Vec<DayReference>,
}

impl ReferenceData {
    #[must_use]
    pub fn for_date(&self, date: NaiveDate) -> Option<&DayReference> {
        self.days.iter().find(|day| day.date == date)
    }

    /// How far `price` sits from its day's average (%), None for unknown days
    #[must_use]
    pub fn diff_from_average_pct(&self, date: NaiveDate, price: f64) -> Option<f64> {
        let day = self.for_date(date)?;
        if day.average_price == 0.0 {
            return None;
        }
        Some((price - day.average_price) / day.average_price.abs() * 100.0)
    }
}

// ============= Result Envelope =============

/// Non-fatal conditions the caller may want to surface
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionWarning {
    #[error("skipped malformed interval: {reason}")]
    MalformedInterval { reason: String },

    #[error(
        "only {found} of {required} periods found after {attempts} relaxation attempts (flex {applied_flex_pct:.1}%)"
    )]
    MinPeriodsUnreachable {
        required: u32,
        found: usize,
        attempts: u32,
        applied_flex_pct: f64,
    },
}

impl From<&IntervalError> for DetectionWarning {
    fn from(error: &IntervalError) -> Self {
        Self::MalformedInterval {
            reason: error.to_string(),
        }
    }
}

/// What the relaxation controller did
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelaxationOutcome {
    pub active: bool,
    /// Attempt index of the returned result. The attempt with the most periods
    /// wins, so this can stay below `relaxation_attempts` even when the target is missed.
    pub level: u32,
    /// Pipeline runs performed, including the unrelaxed one
    pub attempts_run: u32,
    pub target: Option<u32>,
    pub target_met: bool,
    pub original_flex_pct: f64,
    pub applied_flex_pct: f64,
    pub original_min_distance_pct: f64,
    pub applied_min_distance_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionMetadata {
    pub total_periods: usize,
    /// Config the detection ran with
    pub config: PeriodConfig,
    pub relaxation: RelaxationOutcome,
    pub skipped_intervals: usize,
    pub warnings: Vec<DetectionWarning>,
}

/// Full output of one detection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodDetection {
    pub periods: Vec<PeriodSummary>,
    pub metadata: DetectionMetadata,
    pub reference_data: ReferenceData,
}

impl PeriodDetection {
    /// Period containing `at`, if any
    #[must_use]
    pub fn active_period(&self, at: DateTime<FixedOffset>) -> Option<&PeriodSummary> {
        self.periods.iter().find(|p| p.contains(at))
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.metadata.warnings.is_empty()
    }
}
