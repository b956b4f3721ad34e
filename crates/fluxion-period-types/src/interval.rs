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

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of one price interval in minutes
pub const INTERVAL_MINUTES: i64 = 15;

/// Length of one price interval as a chrono duration
#[must_use]
pub fn interval_duration() -> Duration {
    Duration::minutes(INTERVAL_MINUTES)
}

// ============= Price Level =============

/// Price level as published by the upstream price provider
///
/// Ordering follows the ordinal rank, so `VeryCheap < Cheap < ... < VeryExpensive`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceLevel {
    VeryCheap,
    Cheap,
    #[default]
    Normal,
    Expensive,
    VeryExpensive,
}

impl PriceLevel {
    /// All levels in ordinal order
    pub const ALL: [PriceLevel; 5] = [
        Self::VeryCheap,
        Self::Cheap,
        Self::Normal,
        Self::Expensive,
        Self::VeryExpensive,
    ];

    /// Ordinal rank (-2..=2), NORMAL is zero
    #[must_use]
    pub fn rank(self) -> i8 {
        match self {
            Self::VeryCheap => -2,
            Self::Cheap => -1,
            Self::Normal => 0,
            Self::Expensive => 1,
            Self::VeryExpensive => 2,
        }
    }

    /// Parse upstream spellings ("VERY_CHEAP", "very_cheap", "very cheap")
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "VERY_CHEAP" => Some(Self::VeryCheap),
            "CHEAP" => Some(Self::Cheap),
            "NORMAL" => Some(Self::Normal),
            "EXPENSIVE" => Some(Self::Expensive),
            "VERY_EXPENSIVE" => Some(Self::VeryExpensive),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryCheap => "VERY_CHEAP",
            Self::Cheap => "CHEAP",
            Self::Normal => "NORMAL",
            Self::Expensive => "EXPENSIVE",
            Self::VeryExpensive => "VERY_EXPENSIVE",
        }
    }
}

impl std::fmt::Display for PriceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============= Rating Level =============

/// Rating of a price against its trailing 24h average
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RatingLevel {
    Low,
    #[default]
    Normal,
    High,
}

impl RatingLevel {
    /// Classify a percentage difference against the low/high thresholds.
    ///
    /// `<= threshold_low` is LOW, `>= threshold_high` is HIGH, anything between is NORMAL.
    #[must_use]
    pub fn classify(difference_pct: f64, threshold_low_pct: f64, threshold_high_pct: f64) -> Self {
        if difference_pct <= threshold_low_pct {
            Self::Low
        } else if difference_pct >= threshold_high_pct {
            Self::High
        } else {
            Self::Normal
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LOW" => Some(Self::Low),
            "NORMAL" => Some(Self::Normal),
            "HIGH" => Some(Self::High),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Normal => "NORMAL",
            Self::High => "HIGH",
        }
    }
}

impl std::fmt::Display for RatingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============= Price Interval =============

/// One quarter-hour price quote, already enriched with level and rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceInterval {
    /// Local start time of the interval (15-minute aligned)
    pub starts_at: DateTime<FixedOffset>,

    /// Total price in the major currency unit (e.g. EUR/kWh)
    pub price: f64,

    /// Upstream price level
    pub level: PriceLevel,

    /// Rating against the trailing 24h average
    pub rating_level: RatingLevel,

    /// Signed difference to the trailing 24h average (%)
    pub difference_pct: f64,
}

impl PriceInterval {
    /// Interval with NORMAL level/rating and no difference
    #[must_use]
    pub fn new(starts_at: DateTime<FixedOffset>, price: f64) -> Self {
        Self {
            starts_at,
            price,
            level: PriceLevel::Normal,
            rating_level: RatingLevel::Normal,
            difference_pct: 0.0,
        }
    }

    /// Exclusive end of the interval
    #[must_use]
    pub fn ends_at(&self) -> DateTime<FixedOffset> {
        self.starts_at + interval_duration()
    }

    /// Local calendar day this interval belongs to
    #[must_use]
    pub fn local_date(&self) -> NaiveDate {
        self.starts_at.date_naive()
    }
}

/// Loosely-typed interval record as delivered by the price integration.
///
/// Every field is optional; see [`PriceInterval::try_from`] for which ones are required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPriceInterval {
    #[serde(default)]
    pub starts_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub level: Option<PriceLevel>,
    #[serde(default)]
    pub rating_level: Option<RatingLevel>,
    #[serde(default)]
    pub difference: Option<f64>,
}

/// Why a raw interval could not be used
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntervalError {
    #[error("interval is missing starts_at")]
    MissingStart,

    #[error("interval starting at {0} is missing its total price")]
    MissingTotal(DateTime<FixedOffset>),

    #[error("interval starting at {0} has a non-finite total price")]
    NonFiniteTotal(DateTime<FixedOffset>),
}

impl TryFrom<&RawPriceInterval> for PriceInterval {
    type Error = IntervalError;

    fn try_from(raw: &RawPriceInterval) -> Result<Self, Self::Error> {
        let starts_at = raw.starts_at.ok_or(IntervalError::MissingStart)?;
        let price = raw.total.ok_or(IntervalError::MissingTotal(starts_at))?;
        if !price.is_finite() {
            return Err(IntervalError::NonFiniteTotal(starts_at));
        }

        Ok(Self {
            starts_at,
            price,
            level: raw.level.unwrap_or_default(),
            rating_level: raw.rating_level.unwrap_or_default(),
            difference_pct: raw.difference.filter(|d| d.is_finite()).unwrap_or(0.0),
        })
    }
}

impl From<&PriceInterval> for RawPriceInterval {
    fn from(interval: &PriceInterval) -> Self {
        Self {
            starts_at: Some(interval.starts_at),
            total: Some(interval.price),
            level: Some(interval.level),
            rating_level: Some(interval.rating_level),
            difference: Some(interval.difference_pct),
        }
    }
}
