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

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::interval::PriceLevel;

/// Which question a detection run answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodMode {
    /// Cheapest windows (minimizing)
    BestPrice,
    /// Most expensive windows (maximizing)
    PeakPrice,
}

impl PeriodMode {
    #[must_use]
    pub fn from_reverse_sort(reverse_sort: bool) -> Self {
        if reverse_sort {
            Self::PeakPrice
        } else {
            Self::BestPrice
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::BestPrice => "best price",
            Self::PeakPrice => "peak price",
        }
    }
}

/// Settings for isolated spike smoothing ahead of segmentation.
///
/// A spike is a short run of intervals failing the current attempt's price tests
/// while both neighbours pass them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    pub enabled: bool,

    /// Longest run of failing intervals still treated as a spike (multiple of 15)
    pub max_run_minutes: u32,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_run_minutes: 15,
        }
    }
}

/// Flex and minimum-distance thresholds used by one segmentation pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub flex_pct: f64,
    pub min_distance_from_avg_pct: f64,
}

/// How thresholds widen on each relaxation attempt.
///
/// Attempt `k` is always computed from the original thresholds, so the step is
/// deterministic and attempt `k + 1` is never stricter than attempt `k`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelaxationStep {
    /// flex grows by `k * flex_step_pct`, distance shrinks by `k * distance_step_pct` (floored at 0)
    Linear {
        flex_step_pct: f64,
        distance_step_pct: f64,
    },

    /// flex becomes `max(flex, min_flex_pct) * factor^k`, distance becomes `distance / factor^k`
    Geometric { factor: f64, min_flex_pct: f64 },
}

impl Default for RelaxationStep {
    fn default() -> Self {
        Self::Linear {
            flex_step_pct: 5.0,
            distance_step_pct: 2.5,
        }
    }
}

impl RelaxationStep {
    /// Thresholds for relaxation attempt `attempt` (0 returns the originals)
    #[must_use]
    pub fn apply(&self, original: Thresholds, attempt: u32) -> Thresholds {
        if attempt == 0 {
            return original;
        }
        let k = f64::from(attempt);

        match *self {
            Self::Linear {
                flex_step_pct,
                distance_step_pct,
            } => Thresholds {
                flex_pct: original.flex_pct + k * flex_step_pct.max(0.0),
                min_distance_from_avg_pct: (original.min_distance_from_avg_pct
                    - k * distance_step_pct.max(0.0))
                .max(0.0),
            },
            Self::Geometric {
                factor,
                min_flex_pct,
            } => {
                let scale = factor.max(1.0).powf(k);
                Thresholds {
                    flex_pct: original.flex_pct.max(min_flex_pct) * scale,
                    min_distance_from_avg_pct: original.min_distance_from_avg_pct / scale,
                }
            }
        }
    }
}

/// Configuration of one best-price or peak-price detection
///
/// Missing fields deserialize from [`PeriodConfig::best_price`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodConfig {
    /// true = peak price (maximizing), false = best price (minimizing)
    pub reverse_sort: bool,

    /// Tolerance band around the day reference price (%), sign is applied per mode
    pub flex_pct: f64,

    /// Required separation from the day average (%)
    pub min_distance_from_avg_pct: f64,

    /// Minimum period length, multiple of 15
    pub min_period_length_minutes: u32,

    /// Allowed upstream levels, None accepts every level
    pub level_filter: Option<BTreeSet<PriceLevel>>,

    /// Consecutive non-qualifying intervals tolerated inside a period
    pub gap_count: u32,

    pub rating_threshold_low_pct: f64,
    pub rating_threshold_high_pct: f64,

    pub volatility_threshold_moderate_pct: f64,
    pub volatility_threshold_high_pct: f64,
    pub volatility_threshold_very_high_pct: f64,

    pub relaxation_enabled: bool,

    /// Target number of periods, relaxation only runs when set
    pub min_periods: Option<u32>,

    pub relaxation_attempts: u32,

    pub relaxation_step: RelaxationStep,

    /// Spike smoothing
    pub outlier: OutlierConfig,
}

impl PeriodConfig {
    /// Defaults for cheapest-window detection
    #[must_use]
    pub fn best_price() -> Self {
        Self {
            reverse_sort: false,
            flex_pct: 15.0,
            min_distance_from_avg_pct: 5.0,
            min_period_length_minutes: 60,
            level_filter: None,
            gap_count: 0,
            rating_threshold_low_pct: -10.0,
            rating_threshold_high_pct: 10.0,
            volatility_threshold_moderate_pct: 15.0,
            volatility_threshold_high_pct: 30.0,
            volatility_threshold_very_high_pct: 50.0,
            relaxation_enabled: true,
            min_periods: Some(2),
            relaxation_attempts: 4,
            relaxation_step: RelaxationStep::default(),
            outlier: OutlierConfig::default(),
        }
    }

    /// Defaults for most-expensive-window detection
    #[must_use]
    pub fn peak_price() -> Self {
        Self {
            reverse_sort: true,
            flex_pct: 20.0,
            min_period_length_minutes: 30,
            min_periods: Some(1),
            ..Self::best_price()
        }
    }

    /// Defaults for the given mode
    #[must_use]
    pub fn for_mode(mode: PeriodMode) -> Self {
        match mode {
            PeriodMode::BestPrice => Self::best_price(),
            PeriodMode::PeakPrice => Self::peak_price(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> PeriodMode {
        PeriodMode::from_reverse_sort(self.reverse_sort)
    }

    /// Unrelaxed flex and min-distance thresholds
    #[must_use]
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            flex_pct: self.flex_pct,
            min_distance_from_avg_pct: self.min_distance_from_avg_pct,
        }
    }

    /// Minimum period count relaxation should try to reach, if relaxation applies at all
    #[must_use]
    pub fn relaxation_target(&self) -> Option<u32> {
        if self.relaxation_enabled {
            self.min_periods.filter(|&target| target > 0)
        } else {
            None
        }
    }

    /// Whether an upstream level passes the level filter
    #[must_use]
    pub fn accepts_level(&self, level: PriceLevel) -> bool {
        self.level_filter
            .as_ref()
            .is_none_or(|allowed| allowed.contains(&level))
    }
}

impl Default for PeriodConfig {
    fn default() -> Self {
        Self::best_price()
    }
}

/// Level filter accepting `level` and everything cheaper
#[must_use]
pub fn levels_at_most(level: PriceLevel) -> BTreeSet<PriceLevel> {
    PriceLevel::ALL.into_iter().filter(|l| *l <= level).collect()
}

/// Level filter accepting `level` and everything more expensive
#[must_use]
pub fn levels_at_least(level: PriceLevel) -> BTreeSet<PriceLevel> {
    PriceLevel::ALL.into_iter().filter(|l| *l >= level).collect()
}
