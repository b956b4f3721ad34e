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

//! Trailing-24h enrichment for sources that only carry bare prices.
//!
//! The detection engine expects `level`, `rating_level` and `difference` to be
//! filled by the price integration. CSV dumps, SQLite tables and synthetic
//! scenarios lack them, so the simulator derives them here. Values already
//! present in a record are left alone.

use std::collections::VecDeque;

use chrono::Duration;
use fluxion_periods::{PriceLevel, RatingLevel, RawPriceInterval};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Difference bands (%) mapping the trailing-24h comparison to a price level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelBands {
    pub very_cheap_pct: f64,
    pub cheap_pct: f64,
    pub expensive_pct: f64,
    pub very_expensive_pct: f64,
}

impl Default for LevelBands {
    fn default() -> Self {
        Self {
            very_cheap_pct: -30.0,
            cheap_pct: -10.0,
            expensive_pct: 10.0,
            very_expensive_pct: 30.0,
        }
    }
}

impl LevelBands {
    pub fn classify(&self, difference_pct: f64) -> PriceLevel {
        if difference_pct <= self.very_cheap_pct {
            PriceLevel::VeryCheap
        } else if difference_pct <= self.cheap_pct {
            PriceLevel::Cheap
        } else if difference_pct >= self.very_expensive_pct {
            PriceLevel::VeryExpensive
        } else if difference_pct >= self.expensive_pct {
            PriceLevel::Expensive
        } else {
            PriceLevel::Normal
        }
    }
}

/// Enrichment settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentSettings {
    pub levels: LevelBands,
    pub rating_threshold_low_pct: f64,
    pub rating_threshold_high_pct: f64,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            levels: LevelBands::default(),
            rating_threshold_low_pct: -10.0,
            rating_threshold_high_pct: 10.0,
        }
    }
}

/// Fill missing level, rating and difference from the trailing-24h mean.
///
/// The window for an interval starting at `t` is every usable record in
/// `[t - 24h, t)`. The very first interval has no history and compares against
/// itself. Records without a start or a finite total are left untouched for the
/// engine to reject.
pub fn enrich(records: &mut [RawPriceInterval], settings: &EnrichmentSettings) {
    let mut usable: Vec<usize> = (0..records.len())
        .filter(|&idx| {
            records[idx].starts_at.is_some() && records[idx].total.is_some_and(f64::is_finite)
        })
        .collect();
    usable.sort_by_key(|&idx| records[idx].starts_at);

    let window_length = Duration::hours(24);
    let mut window: VecDeque<(chrono::DateTime<chrono::FixedOffset>, f64)> = VecDeque::new();
    let mut window_sum = 0.0;
    let mut filled = 0;

    for idx in usable {
        let (Some(starts_at), Some(price)) = (records[idx].starts_at, records[idx].total) else {
            continue;
        };

        while let Some(&(oldest, oldest_price)) = window.front() {
            if starts_at - oldest > window_length {
                window_sum -= oldest_price;
                window.pop_front();
            } else {
                break;
            }
        }

        let trailing_mean = if window.is_empty() {
            price
        } else {
            window_sum / window.len() as f64
        };
        let difference_pct = if trailing_mean == 0.0 {
            0.0
        } else {
            (price - trailing_mean) / trailing_mean.abs() * 100.0
        };

        let record = &mut records[idx];
        if record.difference.is_none() {
            record.difference = Some(difference_pct);
            filled += 1;
        }
        let difference = record.difference.unwrap_or(difference_pct);
        if record.rating_level.is_none() {
            record.rating_level = Some(RatingLevel::classify(
                difference,
                settings.rating_threshold_low_pct,
                settings.rating_threshold_high_pct,
            ));
        }
        if record.level.is_none() {
            record.level = Some(settings.levels.classify(difference));
        }

        window.push_back((starts_at, price));
        window_sum += price;
    }

    debug!(filled, total = records.len(), "enriched price records");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, TimeZone};

    fn start() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 10, 0, 0, 0)
            .unwrap()
    }

    fn bare(prices: &[f64]) -> Vec<RawPriceInterval> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| RawPriceInterval {
                starts_at: Some(start() + Duration::minutes(i as i64 * 15)),
                total: Some(p),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_level_bands() {
        let bands = LevelBands::default();
        assert_eq!(bands.classify(-30.0), PriceLevel::VeryCheap);
        assert_eq!(bands.classify(-20.0), PriceLevel::Cheap);
        assert_eq!(bands.classify(0.0), PriceLevel::Normal);
        assert_eq!(bands.classify(10.0), PriceLevel::Expensive);
        assert_eq!(bands.classify(45.0), PriceLevel::VeryExpensive);
    }

    #[test]
    fn test_difference_against_trailing_mean() {
        let mut records = bare(&[0.20, 0.20, 0.10, 0.40]);
        enrich(&mut records, &EnrichmentSettings::default());

        // first record has no history
        assert_eq!(records[0].difference, Some(0.0));
        assert_eq!(records[0].level, Some(PriceLevel::Normal));

        // 0.10 against mean 0.20
        assert_eq!(records[2].difference, Some(-50.0));
        assert_eq!(records[2].rating_level, Some(RatingLevel::Low));
        assert_eq!(records[2].level, Some(PriceLevel::VeryCheap));

        // 0.40 against mean (0.20 + 0.20 + 0.10) / 3
        let diff = records[3].difference.unwrap();
        assert!((diff - 140.0).abs() < 1e-9);
        assert_eq!(records[3].rating_level, Some(RatingLevel::High));
    }

    #[test]
    fn test_window_drops_history_older_than_a_day() {
        let mut records = bare(&[1.0, 0.10]);
        records[1].starts_at = Some(start() + Duration::hours(25));
        enrich(&mut records, &EnrichmentSettings::default());
        assert_eq!(records[1].difference, Some(0.0));
    }

    #[test]
    fn test_upstream_values_are_kept() {
        let mut records = bare(&[0.20, 0.10]);
        records[1].level = Some(PriceLevel::Expensive);
        records[1].difference = Some(5.0);
        enrich(&mut records, &EnrichmentSettings::default());

        assert_eq!(records[1].level, Some(PriceLevel::Expensive));
        assert_eq!(records[1].difference, Some(5.0));
        // rating follows the kept difference
        assert_eq!(records[1].rating_level, Some(RatingLevel::Normal));
    }

    #[test]
    fn test_unusable_records_are_untouched() {
        let mut records = bare(&[0.20, 0.10]);
        records[0].total = None;
        records.push(RawPriceInterval {
            starts_at: None,
            total: Some(0.3),
            ..Default::default()
        });
        enrich(&mut records, &EnrichmentSettings::default());

        assert_eq!(records[0].difference, None);
        assert_eq!(records[2].level, None);
        assert_eq!(records[1].difference, Some(0.0));
    }

    #[test]
    fn test_unsorted_records_use_chronological_history() {
        let mut records = bare(&[0.20, 0.10]);
        records.reverse();
        enrich(&mut records, &EnrichmentSettings::default());
        // records[0] is now the later 0.10 interval
        assert_eq!(records[0].difference, Some(-50.0));
    }
}
