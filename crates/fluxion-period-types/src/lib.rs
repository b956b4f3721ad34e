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

//! Data model for FluxION best/peak price period detection.

pub mod config;
pub mod interval;
pub mod period;
pub mod validation;

pub use config::{
    OutlierConfig, PeriodConfig, PeriodMode, RelaxationStep, Thresholds, levels_at_least,
    levels_at_most,
};
pub use interval::{
    INTERVAL_MINUTES, IntervalError, PriceInterval, PriceLevel, RatingLevel, RawPriceInterval,
    interval_duration,
};
pub use period::{
    DayReference, DetectionMetadata, DetectionWarning, PeriodDetection, PeriodSummary,
    ReferenceData, RelaxationOutcome, Volatility,
};
pub use validation::{ValidationIssue, ValidationResult, ValidationSeverity};
