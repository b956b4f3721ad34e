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

//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use fluxion_periods::PeriodConfig;

#[derive(Debug, Parser)]
#[command(name = "fluxion-period-sim")]
#[command(author, version, about = "FluxION Best/Peak Price Period Simulator")]
#[command(
    long_about = "Run best-price and peak-price period detection against synthetic scenarios,\n\
    JSON/CSV price dumps or a SQLite price table, and inspect the detected windows.\n\
    \nExamples:\n  \
    fluxion-period-sim detect                          # Usual day, both modes\n  \
    fluxion-period-sim detect --scenario volatile --days 2 --mode best\n  \
    fluxion-period-sim detect --from-csv prices.csv --output json\n  \
    fluxion-period-sim batch --config scenarios.toml\n  \
    fluxion-period-sim validate --config periods.toml"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Detect periods in one price source
    #[command(
        long_about = "Detect best-price and/or peak-price periods in one price source.\n\
        \nData Sources (choose one):\n  \
        - Synthetic: --scenario <name> (usual_day, elevated_day, volatile, negative, flat)\n  \
        - JSON: --from-json <path> (array of interval records)\n  \
        - CSV: --from-csv <path> (starts_at,total[,level,rating_level,difference])\n  \
        - Database: --from-db <path> --date <YYYY-MM-DD>\n\
        \nExamples:\n  \
        fluxion-period-sim detect\n  \
        fluxion-period-sim detect --scenario negative --flex 25 --min-periods 3\n  \
        fluxion-period-sim detect --from-db prices.db --date 2025-03-10 --output csv --csv-path out.csv"
    )]
    Detect(DetectArgs),

    /// Run detection for every scenario in a TOML batch file
    #[command(
        long_about = "Execute multiple detection scenarios defined in a TOML config file.\n\
        \nPrints one summary row per scenario and mode. With an output directory,\n\
        the periods of every scenario are also written to CSV.\n\
        \nExamples:\n  \
        fluxion-period-sim batch --config scenarios.toml\n  \
        fluxion-period-sim batch --config scenarios.toml --output-dir ./results"
    )]
    Batch(BatchArgs),

    /// Check a period configuration and print its issues
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
pub struct DetectArgs {
    /// Synthetic price scenario
    #[arg(
        long,
        default_value = "usual_day",
        help = "Synthetic price scenario to run",
        long_help = "Available scenarios:\n  \
          - usual_day: Cheap overnight, elevated day, noon dip, evening peak\n  \
          - elevated_day: Cheap only at night, high all day\n  \
          - volatile: Large swings with several valleys and peaks\n  \
          - negative: Negative prices at midday\n  \
          - flat: Constant price\n\
          \nIgnored when loading from a file or database"
    )]
    pub scenario: String,

    /// Number of consecutive synthetic days (1-3)
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=3))]
    pub days: u32,

    /// Seed for synthetic price noise
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// IANA timezone for synthetic days and database rows
    #[arg(long, default_value = "Europe/Prague")]
    pub timezone: String,

    /// First synthetic day or the database day (YYYY-MM-DD), defaults to today
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<String>,

    /// Load interval records from a JSON array
    #[arg(long, value_name = "PATH")]
    pub from_json: Option<String>,

    /// Load interval records from CSV
    #[arg(long, value_name = "PATH")]
    pub from_csv: Option<String>,

    /// Load prices from a SQLite `prices(ts, price)` table (requires --date)
    #[arg(long, value_name = "PATH")]
    pub from_db: Option<String>,

    /// Which detection to run
    #[arg(long, default_value = "both", value_parser = ["best", "peak", "both"])]
    pub mode: String,

    /// Evaluation time (RFC 3339), defaults to the start of the first day
    #[arg(
        long,
        value_name = "RFC3339",
        long_help = "Periods that ended before this instant are not reported.\n\
          \nExample: --now 2025-03-10T14:00:00+01:00"
    )]
    pub now: Option<String>,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output format
    #[arg(long, default_value = "table", value_parser = ["table", "json", "csv"])]
    pub output: String,

    /// CSV file path (stdout when omitted)
    #[arg(long, value_name = "PATH")]
    pub csv_path: Option<String>,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Path to TOML batch configuration file
    #[arg(
        long,
        value_name = "PATH",
        long_help = "TOML file defining the scenarios to run.\n\
          Run with --print-example to see the format."
    )]
    pub config: Option<String>,

    /// Directory for per-scenario CSV files (overrides output.csv_dir)
    #[arg(long, value_name = "PATH")]
    pub output_dir: Option<String>,

    /// Print an example batch file and exit
    #[arg(long, default_value_t = false)]
    pub print_example: bool,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Period configuration file plus per-run overrides
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// TOML file with optional [best] and [peak] tables
    #[arg(long = "config", value_name = "PATH")]
    pub config_file: Option<String>,

    /// Flex tolerance around the day reference (%)
    #[arg(long)]
    pub flex: Option<f64>,

    /// Minimum distance from the day average (%)
    #[arg(long)]
    pub min_distance: Option<f64>,

    /// Minimum period length in minutes (multiple of 15)
    #[arg(long)]
    pub min_length: Option<u32>,

    /// Period count relaxation tries to reach (0 disables relaxation)
    #[arg(long)]
    pub min_periods: Option<u32>,

    /// Maximum relaxation attempts
    #[arg(long)]
    pub relaxation_attempts: Option<u32>,

    /// Non-qualifying intervals tolerated inside a period
    #[arg(long)]
    pub gap_count: Option<u32>,
}

impl ConfigArgs {
    /// Apply the command-line overrides on top of a resolved config
    pub fn apply_overrides(&self, config: &mut PeriodConfig) {
        if let Some(flex) = self.flex {
            config.flex_pct = flex;
        }
        if let Some(distance) = self.min_distance {
            config.min_distance_from_avg_pct = distance;
        }
        if let Some(minutes) = self.min_length {
            config.min_period_length_minutes = minutes;
        }
        if let Some(target) = self.min_periods {
            config.min_periods = Some(target);
        }
        if let Some(attempts) = self.relaxation_attempts {
            config.relaxation_attempts = attempts;
        }
        if let Some(gaps) = self.gap_count {
            config.gap_count = gaps;
        }
    }
}
