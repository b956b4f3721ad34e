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

//! Best/peak price period simulator for FluxION
//!
//! Feeds the period detection engine from synthetic day-ahead curves, JSON or
//! CSV interval dumps and SQLite price tables, then prints what it found.
//!
//! # Features
//!
//! - **Price Scenarios**: Seeded synthetic curves laid out on local quarter-hours
//! - **Enrichment**: Level, rating and difference for sources that only carry prices
//! - **Both Modes**: Best price and peak price detection side by side
//! - **Batch Runs**: Many scenarios from one TOML file with a summary table
//!
//! # Example
//!
//! ```ignore
//! use fluxion_period_sim::{
//!     cli::{DataLoader, SyntheticLoader},
//!     enrichment::EnrichmentSettings,
//!     report::run_detection,
//! };
//!
//! let source = loader.load(None)?;
//! let report = run_detection(source, &[PeriodConfig::best_price()], &EnrichmentSettings::default(), None);
//! for period in &report.results[0].detection.periods {
//!     println!("{} - {}: {:.4}", period.start, period.end, period.price_avg);
//! }
//! ```

pub mod cli;
pub mod enrichment;
pub mod price_scenarios;
pub mod report;

// Re-exports for convenience
pub use enrichment::{EnrichmentSettings, LevelBands, enrich};
pub use price_scenarios::{PRICE_PRESETS, PriceScenario, PriceScenarioPreset, ScenarioOptions};
pub use report::{DetectionReport, ModeResult, run_detection};
