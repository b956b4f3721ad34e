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

//! Spike smoothing ahead of segmentation.
//!
//! A short run of failing intervals between two qualifying neighbours would
//! otherwise split one continuous period into two. Qualification is the period
//! builder's own test with the thresholds of the current relaxation attempt, so
//! a wider flex can turn a neighbour into an anchor. The smoothed prices feed
//! only the builder; summaries keep the billed prices.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use fluxion_period_types::{
    DayReference, INTERVAL_MINUTES, OutlierConfig, PriceInterval, interval_duration,
};
use tracing::debug;

use crate::builder::SegmentationCriteria;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Qualifies,
    FailsOnPrice,
    /// Level filter or unknown day, never smoothed
    Excluded,
}

/// Segmentation prices aligned 1:1 with `intervals` (sorted chronologically).
///
/// A run of at most `max_run_minutes` whose intervals fail `criteria` on price
/// alone is replaced by linear interpolation between its neighbours, provided
/// both neighbours qualify and sit with the run in one unbroken quarter-hour
/// chain on the same local day. The price tests are one-sided bounds, so the
/// interpolated prices qualify as well.
pub fn smooth_outliers(
    intervals: &[PriceInterval],
    days: &BTreeMap<NaiveDate, DayReference>,
    criteria: &SegmentationCriteria<'_>,
    settings: &OutlierConfig,
) -> Vec<f64> {
    let mut smoothed: Vec<f64> = intervals.iter().map(|i| i.price).collect();
    let n = intervals.len();
    if !settings.enabled || n < 3 {
        return smoothed;
    }

    let max_run = usize::try_from(i64::from(settings.max_run_minutes) / INTERVAL_MINUTES)
        .unwrap_or(1)
        .max(1);

    let verdicts: Vec<Verdict> = intervals
        .iter()
        .map(|interval| match days.get(&interval.local_date()) {
            Some(day) if criteria.qualifies(interval.price, interval.level, day) => {
                Verdict::Qualifies
            }
            Some(_) if criteria.config.accepts_level(interval.level) => Verdict::FailsOnPrice,
            _ => Verdict::Excluded,
        })
        .collect();

    let mut i = 1;
    while i + 1 < n {
        let Some(run_len) = spike_len(intervals, &verdicts, i, max_run) else {
            i += 1;
            continue;
        };

        let left = intervals[i - 1].price;
        let right = intervals[i + run_len].price;
        let (low, high) = (left.min(right), left.max(right));
        for offset in 0..run_len {
            let weight = (offset + 1) as f64 / (run_len + 1) as f64;
            smoothed[i + offset] = (left + (right - left) * weight).clamp(low, high);
        }
        debug!(
            start = %intervals[i].starts_at,
            run_len,
            flex_pct = criteria.thresholds.flex_pct,
            "smoothed price spike between {:.4} and {:.4}",
            left,
            right
        );
        // the right neighbour can anchor the next spike
        i += run_len + 1;
    }

    smoothed
}

/// Length of the spike run starting at `start`, if it is one
fn spike_len(
    intervals: &[PriceInterval],
    verdicts: &[Verdict],
    start: usize,
    max_run: usize,
) -> Option<usize> {
    if verdicts[start - 1] != Verdict::Qualifies {
        return None;
    }

    for idx in start..intervals.len() {
        if !chained(&intervals[idx - 1], &intervals[idx]) {
            return None;
        }
        match verdicts[idx] {
            Verdict::Qualifies => return (idx > start).then_some(idx - start),
            Verdict::FailsOnPrice if idx - start < max_run => {}
            _ => return None,
        }
    }

    None
}

fn chained(prev: &PriceInterval, next: &PriceInterval) -> bool {
    prev.local_date() == next.local_date() && next.starts_at - prev.starts_at == interval_duration()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::day_references;
    use chrono::{DateTime, Duration, FixedOffset, TimeZone};
    use fluxion_period_types::{PeriodConfig, PriceLevel, levels_at_most};

    fn intervals_from(base_hour: u32, prices: &[f64]) -> Vec<PriceInterval> {
        let base: DateTime<FixedOffset> = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 10, base_hour, 0, 0)
            .unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PriceInterval::new(base + Duration::minutes(i as i64 * 15), p))
            .collect()
    }

    fn config(reverse_sort: bool, flex_pct: f64, max_run_minutes: u32) -> PeriodConfig {
        PeriodConfig {
            reverse_sort,
            flex_pct,
            min_distance_from_avg_pct: 0.0,
            outlier: OutlierConfig {
                enabled: true,
                max_run_minutes,
            },
            ..PeriodConfig::best_price()
        }
    }

    fn smooth(data: &[PriceInterval], config: &PeriodConfig) -> Vec<f64> {
        let days = day_references(data, config.reverse_sort);
        let criteria = SegmentationCriteria::new(config, config.thresholds());
        smooth_outliers(data, &days, &criteria, &config.outlier)
    }

    #[test]
    fn test_single_upward_spike_is_interpolated_for_best_price() {
        let data = intervals_from(0, &[0.10, 0.10, 0.30, 0.10, 0.10]);
        let smoothed = smooth(&data, &config(false, 0.0, 15));
        assert_eq!(smoothed.len(), data.len());
        assert!((smoothed[2] - 0.10).abs() < 1e-12);
        assert_eq!(smoothed[0], 0.10);
    }

    #[test]
    fn test_uneven_qualifying_neighbours_anchor_the_spike() {
        // ref 0.10, flex 20% accepts up to 0.12
        let data = intervals_from(0, &[0.10, 0.30, 0.115]);
        let smoothed = smooth(&data, &config(false, 20.0, 15));
        assert!((smoothed[1] - 0.1075).abs() < 1e-12);

        // at 10% the right neighbour fails, so nothing is anchored
        let tight = smooth(&data, &config(false, 10.0, 15));
        assert_eq!(tight, vec![0.10, 0.30, 0.115]);
    }

    #[test]
    fn test_upward_spike_is_kept_for_peak_price() {
        let data = intervals_from(0, &[0.10, 0.10, 0.30, 0.10, 0.10]);
        let smoothed = smooth(&data, &config(true, 0.0, 15));
        assert_eq!(smoothed[2], 0.30);
    }

    #[test]
    fn test_downward_dip_is_interpolated_for_peak_price() {
        // ref 0.42, flex 10% accepts down to 0.378
        let data = intervals_from(0, &[0.40, 0.40, 0.05, 0.42, 0.40]);
        let smoothed = smooth(&data, &config(true, 10.0, 15));
        assert!((smoothed[2] - 0.41).abs() < 1e-12);
    }

    #[test]
    fn test_run_longer_than_limit_is_kept() {
        let data = intervals_from(0, &[0.10, 0.30, 0.30, 0.10]);
        let short = smooth(&data, &config(false, 0.0, 15));
        assert_eq!(short[1], 0.30);

        let long = smooth(&data, &config(false, 0.0, 30));
        assert!((long[1] - 0.10).abs() < 1e-12);
        assert!((long[2] - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_missing_interval_blocks_smoothing() {
        let mut data = intervals_from(0, &[0.10, 0.30, 0.10]);
        data[2].starts_at += Duration::minutes(15);
        let smoothed = smooth(&data, &config(false, 0.0, 15));
        assert_eq!(smoothed[1], 0.30);
    }

    #[test]
    fn test_spike_before_midnight_is_kept() {
        // 23:00 to 23:45 on one day, 00:00 on the next
        let data = intervals_from(23, &[0.30, 0.30, 0.10, 0.30, 0.10]);
        let smoothed = smooth(&data, &config(false, 0.0, 15));
        assert_eq!(smoothed[3], 0.30);
    }

    #[test]
    fn test_level_filtered_interval_is_not_smoothed() {
        let mut data = intervals_from(0, &[0.10, 0.10, 0.30, 0.10]);
        for interval in &mut data {
            interval.level = PriceLevel::Cheap;
        }
        data[2].level = PriceLevel::Expensive;
        let filtered = PeriodConfig {
            level_filter: Some(levels_at_most(PriceLevel::Cheap)),
            ..config(false, 0.0, 15)
        };
        assert_eq!(smooth(&data, &filtered)[2], 0.30);
    }

    #[test]
    fn test_disabled_smoothing_returns_billed_prices() {
        let data = intervals_from(0, &[0.10, 0.10, 0.30, 0.10, 0.10]);
        let off = PeriodConfig {
            outlier: OutlierConfig {
                enabled: false,
                max_run_minutes: 15,
            },
            ..config(false, 0.0, 15)
        };
        assert_eq!(smooth(&data, &off), vec![0.10, 0.10, 0.30, 0.10, 0.10]);
    }

    #[test]
    fn test_timestamps_and_count_untouched() {
        let data = intervals_from(0, &[0.2, 0.5, 0.2, 0.5, 0.2]);
        let before = data.clone();
        let smoothed = smooth(&data, &config(false, 0.0, 15));
        assert_eq!(smoothed.len(), 5);
        assert_eq!(data, before);
    }
}
