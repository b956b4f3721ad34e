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

//! Runs the detection engine over a loaded price source.

use chrono::{DateTime, FixedOffset, Local};
use fluxion_periods::{PeriodConfig, PeriodDetection, PeriodMode, detect_periods_from_raw};
use serde::Serialize;
use tracing::info;

use crate::cli::data_loaders::PriceSource;
use crate::enrichment::{EnrichmentSettings, enrich};

/// Detection output of one mode
#[derive(Debug, Clone, Serialize)]
pub struct ModeResult {
    pub mode: PeriodMode,
    pub detection: PeriodDetection,
}

/// Everything one source produced, ready for the formatters
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub source: String,
    pub now: DateTime<FixedOffset>,
    pub interval_count: usize,
    pub results: Vec<ModeResult>,
}

impl DetectionReport {
    pub fn result(&self, mode: PeriodMode) -> Option<&ModeResult> {
        self.results.iter().find(|result| result.mode == mode)
    }
}

/// Enrich the source and run one detection per config.
///
/// Without an explicit `now` the earliest interval start is used, so every
/// loaded period counts as relevant.
pub fn run_detection(
    source: PriceSource,
    configs: &[PeriodConfig],
    enrichment: &EnrichmentSettings,
    now: Option<DateTime<FixedOffset>>,
) -> DetectionReport {
    let PriceSource { name, mut records } = source;
    enrich(&mut records, enrichment);

    let now = now
        .or_else(|| records.iter().filter_map(|r| r.starts_at).min())
        .unwrap_or_else(|| Local::now().fixed_offset());

    let results = configs
        .iter()
        .map(|config| ModeResult {
            mode: config.mode(),
            detection: detect_periods_from_raw(&records, config, now),
        })
        .collect::<Vec<_>>();

    info!(
        source = %name,
        intervals = records.len(),
        modes = results.len(),
        "simulation finished"
    );

    DetectionReport {
        source: name,
        now,
        interval_count: records.len(),
        results,
    }
}
