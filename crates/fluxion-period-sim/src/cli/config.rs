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

//! TOML configuration: period options and batch runs.
//!
//! `[best]` and `[peak]` tables only list what differs from the mode defaults,
//! so every field is optional here and resolved against
//! [`PeriodConfig::for_mode`].

use std::collections::BTreeSet;
use std::fs;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate};
use fluxion_periods::{OutlierConfig, PeriodConfig, PeriodMode, PriceLevel, RelaxationStep};
use serde::{Deserialize, Serialize};

use crate::enrichment::EnrichmentSettings;

/// Partial [`PeriodConfig`] as written by users
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeriodConfigPatch {
    pub flex_pct: Option<f64>,
    pub min_distance_from_avg_pct: Option<f64>,
    pub min_period_length_minutes: Option<u32>,
    pub level_filter: Option<BTreeSet<PriceLevel>>,
    pub gap_count: Option<u32>,
    pub rating_threshold_low_pct: Option<f64>,
    pub rating_threshold_high_pct: Option<f64>,
    pub volatility_threshold_moderate_pct: Option<f64>,
    pub volatility_threshold_high_pct: Option<f64>,
    pub volatility_threshold_very_high_pct: Option<f64>,
    pub relaxation_enabled: Option<bool>,
    /// 0 turns relaxation off
    pub min_periods: Option<u32>,
    pub relaxation_attempts: Option<u32>,
    pub relaxation_step: Option<RelaxationStep>,
    pub outlier: Option<OutlierConfig>,
}

impl PeriodConfigPatch {
    /// Overlay the fields that are set onto `base`
    pub fn apply(&self, mut base: PeriodConfig) -> PeriodConfig {
        macro_rules! overlay {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = self.$field {
                    base.$field = value;
                })*
            };
        }
        overlay!(
            flex_pct,
            min_distance_from_avg_pct,
            min_period_length_minutes,
            gap_count,
            rating_threshold_low_pct,
            rating_threshold_high_pct,
            volatility_threshold_moderate_pct,
            volatility_threshold_high_pct,
            volatility_threshold_very_high_pct,
            relaxation_enabled,
            relaxation_attempts,
            relaxation_step,
            outlier,
        );

        if let Some(levels) = &self.level_filter {
            base.level_filter = Some(levels.clone());
        }
        if let Some(target) = self.min_periods {
            base.min_periods = Some(target);
        }
        base
    }
}

/// Period options file: `[best]`, `[peak]` and `[enrichment]`, all optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodConfigFile {
    #[serde(default)]
    pub best: PeriodConfigPatch,
    #[serde(default)]
    pub peak: PeriodConfigPatch,
    #[serde(default)]
    pub enrichment: EnrichmentSettings,
}

impl PeriodConfigFile {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse TOML config: {path}"))
    }

    /// Mode defaults with the matching table applied
    pub fn resolve(&self, mode: PeriodMode) -> PeriodConfig {
        let patch = match mode {
            PeriodMode::BestPrice => &self.best,
            PeriodMode::PeakPrice => &self.peak,
        };
        patch.apply(PeriodConfig::for_mode(mode))
    }
}

/// Root configuration structure for batch runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub settings: BatchSettings,

    #[serde(flatten)]
    pub periods: PeriodConfigFile,

    pub scenarios: Vec<ScenarioConfig>,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Parameters shared by every scenario of a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettings {
    /// IANA zone for synthetic days and database rows
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Evaluation time; defaults to the start of each scenario's data
    #[serde(default)]
    pub now: Option<DateTime<FixedOffset>>,

    /// "best", "peak" or both
    #[serde(default = "default_modes")]
    pub modes: Vec<String>,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            now: None,
            modes: default_modes(),
        }
    }
}

/// Individual scenario configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,

    #[serde(flatten)]
    pub source: ScenarioSource,
}

/// Source of scenario prices
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioSource {
    Synthetic {
        /// usual_day, elevated_day, volatile, negative, flat
        price_scenario: String,
        #[serde(default = "default_days")]
        days: u32,
        #[serde(default)]
        seed: u64,
        /// Defaults to today in the batch timezone
        #[serde(default)]
        start_date: Option<NaiveDate>,
    },
    Json {
        json_path: String,
    },
    Csv {
        csv_path: String,
    },
    Database {
        db_path: String,
        date: NaiveDate,
    },
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for per-scenario CSV files, none by default
    #[serde(default)]
    pub csv_dir: Option<String>,
}

fn default_timezone() -> String {
    "Europe/Prague".to_owned()
}

fn default_modes() -> Vec<String> {
    vec!["best".to_owned(), "peak".to_owned()]
}

fn default_days() -> u32 {
    1
}

/// Parse "best" / "peak" / "both" into modes
pub fn parse_modes<S: AsRef<str>>(names: &[S]) -> Result<Vec<PeriodMode>> {
    let mut modes = Vec::new();
    for name in names {
        let wanted: &[PeriodMode] = match name.as_ref().trim().to_lowercase().as_str() {
            "best" | "best_price" => &[PeriodMode::BestPrice],
            "peak" | "peak_price" => &[PeriodMode::PeakPrice],
            "both" => &[PeriodMode::BestPrice, PeriodMode::PeakPrice],
            other => anyhow::bail!("Unknown mode '{other}'. Expected best, peak or both."),
        };
        for mode in wanted {
            if !modes.contains(mode) {
                modes.push(*mode);
            }
        }
    }
    Ok(modes)
}

impl BatchConfig {
    /// Load batch configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;

        let config: BatchConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {path}"))?;

        Ok(config)
    }

    /// Generate example batch config as TOML string
    pub fn example_toml() -> String {
        r#"# FluxION Period Simulator - Batch Configuration Example

[settings]
timezone = "Europe/Prague"
modes = ["best", "peak"]
# now = "2025-03-10T00:00:00+01:00"

# Only list what differs from the mode defaults
[best]
flex_pct = 15.0
min_period_length_minutes = 60
min_periods = 2

[peak]
flex_pct = 20.0
min_periods = 1

[enrichment]
rating_threshold_low_pct = -10.0
rating_threshold_high_pct = 10.0

# Scenario 1: Synthetic usual day over two days
[[scenarios]]
name = "usual_two_days"
type = "synthetic"
price_scenario = "usual_day"
days = 2
seed = 42
start_date = "2025-03-10"

# Scenario 2: Negative midday prices
[[scenarios]]
name = "negative_midday"
type = "synthetic"
price_scenario = "negative"
start_date = "2025-06-01"

# Scenario 3: CSV dump
[[scenarios]]
name = "csv_dump"
type = "csv"
csv_path = "prices.csv"

# Scenario 4: SQLite price table
[[scenarios]]
name = "db_day"
type = "database"
db_path = "prices.db"
date = "2025-03-10"

[output]
# csv_dir = "./period_results"
"#
        .to_owned()
    }
}
