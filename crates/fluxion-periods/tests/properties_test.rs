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

// Invariants checked over a three-day curve and a spread of configurations

mod common;

use chrono::Duration;
use common::{init_tracing, midnight, three_days};
use fluxion_periods::{
    OutlierConfig, PeriodConfig, PeriodDetection, PriceLevel, RelaxationStep, detect_periods,
    levels_at_least, levels_at_most,
};

fn configurations() -> Vec<(&'static str, PeriodConfig)> {
    vec![
        ("best default", PeriodConfig::best_price()),
        ("peak default", PeriodConfig::peak_price()),
        (
            "best with gaps",
            PeriodConfig {
                gap_count: 2,
                ..PeriodConfig::best_price()
            },
        ),
        (
            "best unsmoothed",
            PeriodConfig {
                outlier: OutlierConfig {
                    enabled: false,
                    ..OutlierConfig::default()
                },
                ..PeriodConfig::best_price()
            },
        ),
        (
            "best 45 minute spikes",
            PeriodConfig {
                outlier: OutlierConfig {
                    enabled: true,
                    max_run_minutes: 45,
                },
                ..PeriodConfig::best_price()
            },
        ),
        (
            "best cheap levels only",
            PeriodConfig {
                level_filter: Some(levels_at_most(PriceLevel::Normal)),
                ..PeriodConfig::best_price()
            },
        ),
        (
            "peak geometric",
            PeriodConfig {
                min_periods: Some(4),
                relaxation_step: RelaxationStep::Geometric {
                    factor: 1.5,
                    min_flex_pct: 5.0,
                },
                level_filter: Some(levels_at_least(PriceLevel::Normal)),
                ..PeriodConfig::peak_price()
            },
        ),
        (
            "best long and wide",
            PeriodConfig {
                flex_pct: 40.0,
                min_distance_from_avg_pct: 0.0,
                min_period_length_minutes: 120,
                relaxation_enabled: false,
                ..PeriodConfig::best_price()
            },
        ),
    ]
}

fn check_invariants(name: &str, config: &PeriodConfig, detection: &PeriodDetection) {
    let periods = &detection.periods;
    assert_eq!(detection.metadata.total_periods, periods.len(), "{name}");

    for (idx, period) in periods.iter().enumerate() {
        assert!(period.start < period.end, "{name}: empty window");
        assert!(
            period.duration_minutes >= i64::from(config.min_period_length_minutes),
            "{name}: {} min period below minimum",
            period.duration_minutes
        );
        assert!(
            period.interval_count as i64 * 15 <= period.duration_minutes,
            "{name}: more intervals than the window holds"
        );
        assert!(period.price_min - 1e-12 <= period.price_avg);
        assert!(period.price_avg <= period.price_max + 1e-12);
        assert_eq!(period.period_position, idx + 1, "{name}");
        assert_eq!(period.periods_total, periods.len(), "{name}");
        assert_eq!(period.periods_remaining, periods.len() - idx - 1, "{name}");
    }

    for pair in periods.windows(2) {
        assert!(
            pair[0].end <= pair[1].start,
            "{name}: {} - {} overlaps {}",
            pair[0].start,
            pair[0].end,
            pair[1].start
        );
    }
}

#[test]
fn test_periods_are_sorted_disjoint_and_long_enough() {
    init_tracing();
    let data = three_days();
    for (name, config) in configurations() {
        let detection = detect_periods(&data, &config, midnight(0));
        check_invariants(name, &config, &detection);
    }
}

#[test]
fn test_detection_is_idempotent() {
    let data = three_days();
    let now = midnight(1) + Duration::hours(7);
    for (name, config) in configurations() {
        let first = detect_periods(&data, &config, now);
        let second = detect_periods(&data, &config, now);
        assert_eq!(first, second, "{name}");
    }
}

#[test]
fn test_input_order_does_not_matter() {
    let data = three_days();
    let mut shuffled = data.clone();
    shuffled.reverse();
    shuffled.swap(10, 200);

    let config = PeriodConfig::best_price();
    assert_eq!(
        detect_periods(&data, &config, midnight(0)),
        detect_periods(&shuffled, &config, midnight(0))
    );
}

#[test]
fn test_more_relaxation_attempts_never_lose_periods() {
    let data = three_days();
    for (name, base) in configurations() {
        let mut previous = 0;
        for attempts in 0..=8 {
            let config = PeriodConfig {
                min_periods: Some(12),
                relaxation_enabled: true,
                relaxation_attempts: attempts,
                ..base.clone()
            };
            let found = detect_periods(&data, &config, midnight(0)).periods.len();
            assert!(
                found >= previous,
                "{name}: {attempts} attempts found {found}, fewer than {previous}"
            );
            previous = found;
        }
    }
}

#[test]
fn test_every_day_gets_reference_data() {
    let data = three_days();
    let detection = detect_periods(&data, &PeriodConfig::best_price(), midnight(0));
    let days = &detection.reference_data.days;

    assert_eq!(days.len(), 3);
    assert!(days.windows(2).all(|w| w[0].date < w[1].date));
    for day in days {
        assert_eq!(day.interval_count, 96);
        assert_eq!(day.reference_price, day.min_price);
        assert!(day.min_price < day.average_price && day.average_price < day.max_price);
    }
    // third day dips below zero at midday
    assert!(days[2].min_price < 0.0);
}

#[test]
fn test_result_serializes_to_stable_json() {
    let data = three_days();
    let detection = detect_periods(&data, &PeriodConfig::best_price(), midnight(0));
    let json = serde_json::to_value(&detection).unwrap();

    assert!(json["periods"].is_array());
    assert_eq!(
        json["metadata"]["total_periods"].as_u64(),
        Some(detection.periods.len() as u64)
    );
    assert_eq!(json["metadata"]["config"]["reverse_sort"], false);
    assert!(json["metadata"]["relaxation"]["active"].is_boolean());
    assert_eq!(json["reference_data"]["days"].as_array().map(Vec::len), Some(3));

    let first = &json["periods"][0];
    for key in ["start", "end", "level", "rating_level", "volatility", "price_avg"] {
        assert!(!first[key].is_null(), "missing {key}");
    }
    let volatility = first["volatility"].as_str().unwrap();
    assert!(["LOW", "MODERATE", "HIGH", "VERY_HIGH"].contains(&volatility));

    let back: PeriodDetection = serde_json::from_value(json).unwrap();
    assert_eq!(back.periods.len(), detection.periods.len());
}
