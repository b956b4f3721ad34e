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

#![allow(dead_code)]

use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use fluxion_periods::{PeriodConfig, PriceInterval};

/// Route engine logs to the test harness (`RUST_LOG=debug cargo test -- --nocapture`)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Local midnight of 2025-03-10 + `days`, CET
pub fn midnight(days: i64) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(3600)
        .unwrap()
        .with_ymd_and_hms(2025, 3, 10, 0, 0, 0)
        .unwrap()
        + Duration::days(days)
}

/// Consecutive quarter-hours starting at `start`
pub fn intervals_at(start: DateTime<FixedOffset>, prices: &[f64]) -> Vec<PriceInterval> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| PriceInterval::new(start + Duration::minutes(i as i64 * 15), p))
        .collect()
}

/// Typical day-ahead shape: night and midday valleys, morning and evening peaks
pub fn realistic_day(day: i64, scale: f64, midday_dip: f64) -> Vec<PriceInterval> {
    let prices: Vec<f64> = (0..96)
        .map(|i| {
            let h = i as f64 / 4.0;
            let bump = |center: f64, width: f64| (-(h - center).powi(2) / width).exp();
            let jitter = 0.004 * ((i * 7) % 5) as f64;
            scale
                * (0.20 - 0.06 * bump(3.5, 4.0) + 0.08 * bump(8.0, 2.0) + 0.10 * bump(19.0, 3.0))
                - midday_dip * bump(13.0, 3.0)
                + jitter
        })
        .collect();
    intervals_at(midnight(day), &prices)
}

/// Three days, the last one with negative midday prices
pub fn three_days() -> Vec<PriceInterval> {
    let mut data = realistic_day(0, 1.0, 0.04);
    data.extend(realistic_day(1, 1.1, 0.06));
    data.extend(realistic_day(2, 0.9, 0.30));
    data
}

/// Flex 0, distance 0, relaxation off
pub fn strict_best(min_length: u32) -> PeriodConfig {
    PeriodConfig {
        flex_pct: 0.0,
        min_distance_from_avg_pct: 0.0,
        min_period_length_minutes: min_length,
        relaxation_enabled: false,
        ..PeriodConfig::best_price()
    }
}
