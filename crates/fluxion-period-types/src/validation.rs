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

//! Caller-side validation of [`PeriodConfig`].
//!
//! The detection engine trusts its config; integrations run [`PeriodConfig::validate`]
//! before handing user options to it.

use serde::{Deserialize, Serialize};

use crate::config::{PeriodConfig, RelaxationStep};
use crate::interval::INTERVAL_MINUTES;

/// Upper bound on relaxation attempts accepted from user options
pub const MAX_RELAXATION_ATTEMPTS: u32 = 12;

/// Validation result with detailed field-level errors and warnings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the configuration is valid
    pub valid: bool,
    /// Validation errors (prevent config from being used)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (config can be used but may not be optimal)
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationIssue {
            field: field.into(),
            message: message.into(),
            severity: ValidationSeverity::Error,
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            field: field.into(),
            message: message.into(),
            severity: ValidationSeverity::Warning,
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Merge another validation result into this one, prefixing its field paths
    pub fn merge_prefixed(&mut self, prefix: &str, other: ValidationResult) {
        self.valid = self.valid && other.valid;
        let prefixed = |mut issue: ValidationIssue| {
            issue.field = format!("{prefix}.{}", issue.field);
            issue
        };
        self.errors.extend(other.errors.into_iter().map(prefixed));
        self.warnings.extend(other.warnings.into_iter().map(prefixed));
    }
}

/// A validation issue (error or warning)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Field name (e.g., "flex_pct")
    pub field: String,
    pub message: String,
    pub severity: ValidationSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    Error,
    Warning,
}

impl PeriodConfig {
    /// Check user-supplied options before they reach the engine
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::success();

        let interval = INTERVAL_MINUTES as u32;
        if self.min_period_length_minutes == 0 {
            result.add_error("min_period_length_minutes", "must be at least 15 minutes");
        } else if !self.min_period_length_minutes.is_multiple_of(interval) {
            result.add_error(
                "min_period_length_minutes",
                format!(
                    "must be a multiple of {interval} minutes, got {}",
                    self.min_period_length_minutes
                ),
            );
        }

        if !(0.0..=100.0).contains(&self.flex_pct) {
            result.add_error("flex_pct", "must be between 0 and 100");
        } else if self.flex_pct > 50.0 {
            result.add_warning(
                "flex_pct",
                "flex above 50% admits most of the day and produces few, long periods",
            );
        }

        if !(0.0..100.0).contains(&self.min_distance_from_avg_pct) {
            result.add_error(
                "min_distance_from_avg_pct",
                "must be at least 0 and below 100",
            );
        }

        if self.rating_threshold_low_pct >= self.rating_threshold_high_pct {
            result.add_error(
                "rating_threshold_low_pct",
                "must be below rating_threshold_high_pct",
            );
        }

        let volatility = [
            self.volatility_threshold_moderate_pct,
            self.volatility_threshold_high_pct,
            self.volatility_threshold_very_high_pct,
        ];
        if volatility.iter().any(|t| *t < 0.0) {
            result.add_error("volatility_threshold_moderate_pct", "must not be negative");
        } else if !volatility.windows(2).all(|pair| pair[0] < pair[1]) {
            result.add_error(
                "volatility_threshold_high_pct",
                "volatility thresholds must increase: moderate < high < very high",
            );
        }

        if let Some(levels) = &self.level_filter
            && levels.is_empty()
        {
            result.add_error("level_filter", "an empty level filter rejects every interval");
        }

        let min_intervals = self.min_period_length_minutes / interval;
        if self.gap_count > 0 && self.gap_count >= min_intervals.max(1) {
            result.add_warning(
                "gap_count",
                format!(
                    "{} tolerated gaps are as long as the minimum period ({} intervals)",
                    self.gap_count, min_intervals
                ),
            );
        }

        if self.relaxation_attempts > MAX_RELAXATION_ATTEMPTS {
            result.add_error(
                "relaxation_attempts",
                format!("must be at most {MAX_RELAXATION_ATTEMPTS}"),
            );
        }

        match self.min_periods {
            Some(0) => result.add_warning("min_periods", "0 disables the minimum period target"),
            None if self.relaxation_enabled => result.add_warning(
                "min_periods",
                "relaxation is enabled but has no target period count",
            ),
            _ => {}
        }

        match self.relaxation_step {
            RelaxationStep::Linear {
                flex_step_pct,
                distance_step_pct,
            } => {
                if flex_step_pct < 0.0 || distance_step_pct < 0.0 {
                    result.add_error("relaxation_step", "linear steps must not be negative");
                } else if flex_step_pct == 0.0 && distance_step_pct == 0.0 && self.relaxation_enabled
                {
                    result.add_error("relaxation_step", "a zero step never relaxes anything");
                }
            }
            RelaxationStep::Geometric {
                factor,
                min_flex_pct,
            } => {
                if factor <= 1.0 {
                    result.add_error("relaxation_step", "geometric factor must be above 1");
                }
                if min_flex_pct < 0.0 {
                    result.add_error("relaxation_step", "min_flex_pct must not be negative");
                }
            }
        }

        let outlier = &self.outlier;
        if outlier.enabled
            && (outlier.max_run_minutes < interval
                || !outlier.max_run_minutes.is_multiple_of(interval))
        {
            result.add_error(
                "outlier.max_run_minutes",
                format!("must be a positive multiple of {interval} minutes"),
            );
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutlierConfig;
    use std::collections::BTreeSet;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PeriodConfig::best_price().validate().valid);
        assert!(PeriodConfig::peak_price().validate().valid);
    }

    #[test]
    fn test_min_length_must_be_quarter_hour_multiple() {
        let config = PeriodConfig {
            min_period_length_minutes: 50,
            ..PeriodConfig::best_price()
        };
        let result = config.validate();
        assert!(!result.valid);
        assert_eq!(result.errors[0].field, "min_period_length_minutes");
    }

    #[test]
    fn test_volatility_thresholds_must_increase() {
        let config = PeriodConfig {
            volatility_threshold_high_pct: 60.0,
            ..PeriodConfig::best_price()
        };
        assert!(config.validate().has_errors());
    }

    #[test]
    fn test_empty_level_filter_is_rejected() {
        let config = PeriodConfig {
            level_filter: Some(BTreeSet::new()),
            ..PeriodConfig::best_price()
        };
        assert!(config.validate().has_errors());
    }

    #[test]
    fn test_geometric_factor_must_grow() {
        let config = PeriodConfig {
            relaxation_step: RelaxationStep::Geometric {
                factor: 1.0,
                min_flex_pct: 5.0,
            },
            ..PeriodConfig::best_price()
        };
        assert!(config.validate().has_errors());
    }

    #[test]
    fn test_outlier_run_must_be_quarter_hours() {
        let config = PeriodConfig {
            outlier: OutlierConfig {
                enabled: true,
                max_run_minutes: 20,
            },
            ..PeriodConfig::best_price()
        };
        assert!(config.validate().has_errors());

        let disabled = PeriodConfig {
            outlier: OutlierConfig {
                enabled: false,
                max_run_minutes: 20,
            },
            ..PeriodConfig::best_price()
        };
        assert!(!disabled.validate().has_errors());
    }

    #[test]
    fn test_relaxation_without_target_warns() {
        let config = PeriodConfig {
            min_periods: None,
            ..PeriodConfig::best_price()
        };
        let result = config.validate();
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_merge_prefixed_fields() {
        let mut combined = ValidationResult::success();
        let bad = PeriodConfig {
            flex_pct: 150.0,
            ..PeriodConfig::peak_price()
        };
        combined.merge_prefixed("peak", bad.validate());
        assert!(!combined.valid);
        assert_eq!(combined.errors[0].field, "peak.flex_pct");
    }
}
