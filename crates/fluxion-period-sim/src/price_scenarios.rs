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

//! Synthetic day-ahead price curves for exercising period detection.
//!
//! - **Usual Day**: Cheap overnight, elevated day, noon dip, evening peak
//! - **Elevated Day**: Cheap only at night, high prices throughout the day
//! - **Volatile**: Large swings, several valleys and peaks
//! - **Negative Prices**: Midday prices below zero (renewable surplus)
//! - **Flat**: One price all day, nothing stands out
//!
//! Curves are laid out on the local quarter-hours of a `chrono-tz` zone, so DST
//! days yield 92 or 100 intervals. Noise is drawn from a seeded RNG and the same
//! seed always gives the same prices.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;
use fluxion_periods::RawPriceInterval;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Price scenario types (EUR/kWh)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PriceScenario {
    UsualDay,
    ElevatedDay,
    Volatile,
    NegativePrices,
    Flat,
    /// Explicit quarter-hour prices, repeated when shorter than a day
    Custom { prices: Vec<f64> },
}

impl PriceScenario {
    pub fn name(&self) -> &str {
        match self {
            Self::UsualDay => "Usual Day",
            Self::ElevatedDay => "Elevated Day",
            Self::Volatile => "Volatile Prices",
            Self::NegativePrices => "Negative Prices",
            Self::Flat => "Flat Day",
            Self::Custom { .. } => "Custom",
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::UsualDay => {
                "Cheap overnight (0-6), elevated day (6-12, 14-17), noon dip (12-14), evening peak (17-20)"
            }
            Self::ElevatedDay => "Cheap only at night (0-6), uniformly high during day (6-24)",
            Self::Volatile => "Large price swings with several valleys and peaks",
            Self::NegativePrices => "Negative prices at midday (11-14) from renewable surplus",
            Self::Flat => "Constant price, no period should stand out",
            Self::Custom { .. } => "User-defined quarter-hour prices",
        }
    }

    /// Resolve a CLI/batch scenario id
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().as_str() {
            "usual_day" | "usual" => Some(Self::UsualDay),
            "elevated_day" | "elevated" => Some(Self::ElevatedDay),
            "volatile" => Some(Self::Volatile),
            "negative_prices" | "negative" => Some(Self::NegativePrices),
            "flat" => Some(Self::Flat),
            _ => None,
        }
    }

    /// Price for local quarter-hour `slot` (0..96), noise included
    fn price_at(&self, slot: usize, rng: &mut StdRng) -> Option<f64> {
        let hour = slot / 4;
        let price = match self {
            Self::UsualDay => {
                let base = match hour {
                    0..=5 => 0.09,
                    6..=11 => 0.21,
                    12..=13 => 0.16,
                    14..=16 => 0.19,
                    17..=19 => 0.28,
                    _ => 0.15,
                };
                base * (1.0 + rng.gen_range(-0.08..0.08))
            }
            Self::ElevatedDay => {
                let base = if hour < 6 { 0.09 } else { 0.27 };
                base * (1.0 + rng.gen_range(-0.06..0.06))
            }
            Self::Volatile => {
                let (low, high) = VOLATILE_PATTERN
                    .iter()
                    .find(|&&(start, end, _, _)| (start..end).contains(&slot))
                    .map_or((0.10, 0.15), |&(_, _, low, high)| (low, high));
                rng.gen_range(low..high)
            }
            Self::NegativePrices => {
                let base: f64 = match hour {
                    0..=5 => 0.08,
                    6..=10 => 0.15,
                    11..=13 => -0.03,
                    14..=16 => 0.12,
                    17..=20 => 0.24,
                    _ => 0.12,
                };
                base + base.abs() * rng.gen_range(-0.08..0.08)
            }
            Self::Flat => 0.20,
            Self::Custom { prices } => {
                if prices.is_empty() {
                    return None;
                }
                prices[slot % prices.len()]
            }
        };
        Some((price * 10_000.0).round() / 10_000.0)
    }
}

/// (start slot, end slot, low, high)
const VOLATILE_PATTERN: [(usize, usize, f64, f64); 16] = [
    (0, 8, 0.04, 0.07),
    (8, 12, 0.025, 0.04),
    (12, 16, 0.08, 0.11),
    (16, 24, 0.18, 0.21),
    (24, 28, 0.25, 0.31),
    (28, 32, 0.15, 0.19),
    (32, 36, 0.33, 0.39),
    (36, 40, 0.20, 0.24),
    (40, 48, 0.10, 0.14),
    (48, 56, 0.075, 0.11),
    (56, 64, 0.18, 0.29),
    (64, 72, 0.33, 0.41),
    (72, 76, 0.40, 0.44),
    (76, 84, 0.20, 0.36),
    (84, 92, 0.08, 0.16),
    (92, 96, 0.05, 0.085),
];

/// Price scenario preset with metadata
#[derive(Debug, Clone)]
pub struct PriceScenarioPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub scenario: PriceScenario,
}

/// Built-in scenarios selectable by id
pub const PRICE_PRESETS: &[PriceScenarioPreset] = &[
    PriceScenarioPreset {
        id: "usual_day",
        name: "Usual Day",
        description: "Cheap overnight, elevated day, noon dip, evening peak",
        scenario: PriceScenario::UsualDay,
    },
    PriceScenarioPreset {
        id: "elevated_day",
        name: "Elevated Day",
        description: "Cheap only at night, uniformly high during day",
        scenario: PriceScenario::ElevatedDay,
    },
    PriceScenarioPreset {
        id: "volatile",
        name: "Volatile",
        description: "Large price swings with several valleys and peaks",
        scenario: PriceScenario::Volatile,
    },
    PriceScenarioPreset {
        id: "negative",
        name: "Negative Prices",
        description: "Negative prices at midday from renewable surplus",
        scenario: PriceScenario::NegativePrices,
    },
    PriceScenarioPreset {
        id: "flat",
        name: "Flat Day",
        description: "Constant price, no period should stand out",
        scenario: PriceScenario::Flat,
    },
];

/// Where and how long to lay out a scenario
#[derive(Debug, Clone, Copy)]
pub struct ScenarioOptions {
    pub start_date: NaiveDate,
    pub days: u32,
    pub timezone: Tz,
    pub seed: u64,
}

/// Local midnight of `date`, the earliest one if the zone repeats it
pub fn local_midnight(timezone: Tz, date: NaiveDate) -> Option<DateTime<Tz>> {
    timezone
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
}

/// Generate bare price records (no level, rating or difference)
pub fn generate_intervals(
    scenario: &PriceScenario,
    options: &ScenarioOptions,
) -> Vec<RawPriceInterval> {
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut records = Vec::new();

    for date in options.start_date.iter_days().take(options.days as usize) {
        let (Some(start), Some(end)) = (
            local_midnight(options.timezone, date),
            date.succ_opt()
                .and_then(|next| local_midnight(options.timezone, next)),
        ) else {
            continue;
        };

        let mut at = start;
        while at < end {
            let slot = (at.hour() * 4 + at.minute() / 15) as usize;
            if let Some(price) = scenario.price_at(slot, &mut rng) {
                records.push(RawPriceInterval {
                    starts_at: Some(at.fixed_offset()),
                    total: Some(price),
                    ..Default::default()
                });
            }
            at += Duration::minutes(15);
        }
    }

    records
}
