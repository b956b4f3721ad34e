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

// Hand-built price curves with known answers

mod common;

use chrono::Duration;
use common::{init_tracing, intervals_at, midnight, realistic_day, strict_best};
use fluxion_periods::{
    DetectionWarning, OutlierConfig, PeriodConfig, PriceInterval, RelaxationStep, detect_periods,
};

// ============= Basic segmentation =============

#[test]
fn test_three_cheapest_quarters_form_45_minute_period() {
    init_tracing();
    let data = intervals_at(midnight(0), &[0.10, 0.10, 0.10, 0.20]);
    let detection = detect_periods(&data, &strict_best(30), midnight(0));

    assert_eq!(detection.periods.len(), 1);
    let period = &detection.periods[0];
    assert_eq!(period.start, midnight(0));
    assert_eq!(period.end, midnight(0) + Duration::minutes(45));
    assert_eq!(period.duration_minutes, 45);
    assert_eq!(period.interval_count, 3);
    assert_eq!(period.price_avg, 0.10);
    assert_eq!(period.period_position, 1);
    assert_eq!(period.periods_remaining, 0);
    assert!(!period.relaxation_active);
}

#[test]
fn test_same_curve_with_one_hour_minimum_is_empty() {
    let data = intervals_at(midnight(0), &[0.10, 0.10, 0.10, 0.20]);
    let detection = detect_periods(&data, &strict_best(60), midnight(0));
    assert!(detection.periods.is_empty());
    assert_eq!(detection.metadata.total_periods, 0);
}

#[test]
fn test_peak_mode_finds_most_expensive_run() {
    let data = intervals_at(midnight(0), &[0.10, 0.30, 0.30, 0.10]);
    let config = PeriodConfig {
        flex_pct: 0.0,
        min_distance_from_avg_pct: 0.0,
        relaxation_enabled: false,
        ..PeriodConfig::peak_price()
    };
    let detection = detect_periods(&data, &config, midnight(0));

    assert_eq!(detection.periods.len(), 1);
    assert_eq!(detection.periods[0].start, midnight(0) + Duration::minutes(15));
    assert_eq!(detection.periods[0].duration_minutes, 30);
    assert_eq!(detection.reference_data.days[0].reference_price, 0.30);
}

// ============= Midnight =============

fn cheap_around_midnight(evening_slots: &[usize]) -> Vec<PriceInterval> {
    let mut evening = vec![0.30; 96];
    for &slot in evening_slots {
        evening[slot] = 0.10;
    }
    let mut morning = vec![0.30; 96];
    morning[0] = 0.10;
    morning[1] = 0.10;

    let mut data = intervals_at(midnight(0), &evening);
    data.extend(intervals_at(midnight(1), &morning));
    data
}

#[test]
fn test_period_across_midnight_is_one_period() {
    let data = cheap_around_midnight(&[94, 95]);
    let detection = detect_periods(&data, &strict_best(30), midnight(0));

    assert_eq!(detection.periods.len(), 1);
    let period = &detection.periods[0];
    assert_eq!(period.start, midnight(1) - Duration::minutes(30));
    assert_eq!(period.end, midnight(1) + Duration::minutes(30));
    assert_eq!(period.duration_minutes, 60);
    assert_eq!(period.interval_count, 4);
}

#[test]
fn test_half_hour_gap_at_midnight_keeps_two_periods() {
    let data = cheap_around_midnight(&[93, 94]);
    let detection = detect_periods(&data, &strict_best(30), midnight(0));

    assert_eq!(detection.periods.len(), 2);
    assert_eq!(detection.periods[0].end, midnight(1) - Duration::minutes(15));
    assert_eq!(detection.periods[1].start, midnight(1));
}

#[test]
fn test_period_running_past_midnight_survives_next_day() {
    let data = cheap_around_midnight(&[94, 95]);
    let now = midnight(1) + Duration::minutes(15);
    let detection = detect_periods(&data, &strict_best(30), now);

    assert_eq!(detection.periods.len(), 1);
    assert!(detection.periods[0].contains(now));
    assert_eq!(
        detection.active_period(now).map(|p| p.start),
        Some(midnight(1) - Duration::minutes(30))
    );
}

// ============= Relevance =============

#[test]
fn test_elapsed_periods_are_not_returned() {
    let mut data = realistic_day(0, 1.0, 0.04);
    data.extend(realistic_day(1, 1.1, 0.06));
    let config = PeriodConfig::best_price();

    let everything = detect_periods(&data, &config, midnight(0));
    let now = midnight(1) + Duration::hours(12);
    let later = detect_periods(&data, &config, now);

    assert!(later.periods.len() <= everything.periods.len());
    for period in &later.periods {
        assert!(period.end >= now, "{} ended before {now}", period.end);
        assert!(period.end > midnight(1));
    }
}

// ============= Relaxation =============

fn relaxation_config() -> PeriodConfig {
    PeriodConfig {
        relaxation_enabled: true,
        min_periods: Some(2),
        relaxation_attempts: 3,
        relaxation_step: RelaxationStep::Linear {
            flex_step_pct: 5.0,
            distance_step_pct: 2.5,
        },
        ..strict_best(30)
    }
}

#[test]
fn test_relaxation_finds_second_period() {
    init_tracing();
    // 0.112 qualifies from 15% flex on (third attempt)
    let data = intervals_at(
        midnight(0),
        &[0.10, 0.10, 0.40, 0.40, 0.112, 0.112, 0.40, 0.40],
    );
    let config = relaxation_config();

    let unrelaxed = detect_periods(
        &data,
        &PeriodConfig {
            relaxation_enabled: false,
            ..config.clone()
        },
        midnight(0),
    );
    assert_eq!(unrelaxed.periods.len(), 1);

    let detection = detect_periods(&data, &config, midnight(0));
    assert_eq!(detection.periods.len(), 2);
    assert!(detection.metadata.relaxation.active);
    assert_eq!(detection.metadata.relaxation.level, 3);
    assert!(detection.metadata.relaxation.target_met);
    assert!(!detection.has_warnings());
    for period in &detection.periods {
        assert!(period.relaxation_active);
        assert!(period.relaxation_level >= 1);
        assert_eq!(period.relaxation_threshold_original_pct, 0.0);
        assert_eq!(period.relaxation_threshold_applied_pct, 15.0);
    }
}

#[test]
fn test_unreachable_minimum_returns_best_effort_with_warning() {
    let data = intervals_at(
        midnight(0),
        &[0.10, 0.10, 0.40, 0.40, 0.20, 0.20, 0.40, 0.40],
    );
    let detection = detect_periods(&data, &relaxation_config(), midnight(0));

    assert_eq!(detection.periods.len(), 1);
    assert!(detection.periods[0].relaxation_active);
    assert_eq!(detection.periods[0].relaxation_level, 3);
    assert_eq!(detection.metadata.relaxation.attempts_run, 4);
    assert!(!detection.metadata.relaxation.target_met);
    assert!(matches!(
        detection.metadata.warnings.as_slice(),
        [DetectionWarning::MinPeriodsUnreachable {
            required: 2,
            found: 1,
            attempts: 3,
            ..
        }]
    ));
}

fn unsmoothed(config: PeriodConfig) -> PeriodConfig {
    PeriodConfig {
        outlier: OutlierConfig {
            enabled: false,
            ..config.outlier
        },
        ..config
    }
}

#[test]
fn test_gap_tolerance_joins_split_valley() {
    let data = intervals_at(
        midnight(0),
        &[0.40, 0.10, 0.10, 0.25, 0.10, 0.10, 0.40, 0.40],
    );

    let split = detect_periods(&data, &unsmoothed(strict_best(60)), midnight(0));
    assert!(split.periods.is_empty());

    let config = PeriodConfig {
        gap_count: 1,
        ..unsmoothed(strict_best(60))
    };
    let joined = detect_periods(&data, &config, midnight(0));
    assert_eq!(joined.periods.len(), 1);
    assert_eq!(joined.periods[0].interval_count, 4);
    assert_eq!(joined.periods[0].duration_minutes, 75);
    // the skipped 0.25 never enters the statistics
    assert_eq!(joined.periods[0].price_max, 0.10);
}

// ============= Spike smoothing =============

#[test]
fn test_smoothed_spike_joins_valley_with_billed_price() {
    let data = intervals_at(
        midnight(0),
        &[0.40, 0.10, 0.10, 0.25, 0.10, 0.10, 0.40, 0.40],
    );
    let detection = detect_periods(&data, &strict_best(60), midnight(0));

    assert_eq!(detection.periods.len(), 1);
    let period = &detection.periods[0];
    assert_eq!(period.start, midnight(0) + Duration::minutes(15));
    assert_eq!(period.interval_count, 5);
    assert_eq!(period.duration_minutes, 75);
    assert_eq!(period.price_max, 0.25);
}

#[test]
fn test_spike_next_to_dearer_dip_is_smoothed_with_default_settings() {
    // 0.115 sits within 20% of the 0.10 reference but far from it in absolute terms
    let data = intervals_at(
        midnight(0),
        &[0.40, 0.10, 0.10, 0.30, 0.115, 0.115, 0.40, 0.40],
    );
    let config = PeriodConfig {
        flex_pct: 20.0,
        relaxation_enabled: false,
        ..PeriodConfig::best_price()
    };
    let detection = detect_periods(&data, &config, midnight(0));

    assert_eq!(detection.periods.len(), 1);
    assert_eq!(detection.periods[0].start, midnight(0) + Duration::minutes(15));
    assert_eq!(detection.periods[0].end, midnight(0) + Duration::minutes(90));
}
