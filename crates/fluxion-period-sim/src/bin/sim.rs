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

//! CLI entry point for the FluxION period simulator

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use clap::Parser;
use fluxion_period_sim::{
    EnrichmentSettings, PRICE_PRESETS, PriceScenario, ScenarioOptions,
    cli::{
        BatchArgs, BatchConfig, BatchSummaryRow, Cli, Commands, ConfigArgs, CsvFormatter,
        CsvLoader, DataLoader, DetectArgs, JsonFormatter, JsonLoader, PeriodConfigFile,
        PriceSource, ScenarioSource, SqliteLoader, SyntheticLoader, TableFormatter, ValidateArgs,
        parse_modes, parse_timezone,
    },
    run_detection,
};
use fluxion_periods::{PeriodConfig, PeriodMode};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fluxion_period_sim=info,fluxion_periods=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Detect(args) => detect_command(args),
        Commands::Batch(args) => batch_command(args),
        Commands::Validate(args) => validate_command(&args),
    }
}

fn detect_command(args: DetectArgs) -> Result<()> {
    validate_detect_args(&args)?;

    let timezone = parse_timezone(&args.timezone)?;
    let date = args.date.as_deref().map(parse_date).transpose()?;
    let now = args
        .now
        .as_deref()
        .map(|value| {
            DateTime::parse_from_rfc3339(value).with_context(|| {
                format!(
                    "Invalid --now value: '{value}'\n\n\
                    Expected RFC 3339 (e.g., 2025-03-10T14:00:00+01:00)"
                )
            })
        })
        .transpose()?;

    let modes = parse_modes(&[args.mode.as_str()])?;
    let (configs, enrichment) = resolve_configs(&args.config, &modes)?;

    // Create data loader based on input source
    let loader: Box<dyn DataLoader> = if let Some(db_path) = args.from_db {
        Box::new(SqliteLoader::new(db_path, timezone))
    } else if let Some(json_path) = args.from_json {
        Box::new(JsonLoader::new(json_path))
    } else if let Some(csv_path) = args.from_csv {
        Box::new(CsvLoader::new(csv_path))
    } else {
        Box::new(synthetic_loader(
            &args.scenario,
            date.unwrap_or_else(|| today(timezone)),
            args.days,
            args.seed,
            timezone,
        )?)
    };

    let source = loader.load(date)?;
    let report = run_detection(source, &configs, &enrichment, now);

    match args.output.as_str() {
        "json" => println!("{}", JsonFormatter::format_report(&report)?),
        "csv" => match &args.csv_path {
            Some(path) => {
                CsvFormatter::write_file(&report, path)?;
                println!("CSV exported to: {path}");
            }
            None => CsvFormatter::write_periods(&report, std::io::stdout().lock())?,
        },
        _ => println!("{}", TableFormatter::format_report(&report)),
    }

    Ok(())
}

fn batch_command(args: BatchArgs) -> Result<()> {
    if args.print_example {
        print!("{}", BatchConfig::example_toml());
        return Ok(());
    }

    validate_batch_args(&args)?;
    let Some(config_path) = args.config.as_deref() else {
        anyhow::bail!("--config is required unless --print-example is given");
    };

    let config = BatchConfig::from_file(config_path)
        .with_context(|| format!("Failed to load batch config from {config_path}"))?;
    let timezone = parse_timezone(&config.settings.timezone)?;
    let modes = parse_modes(&config.settings.modes)?;

    let configs = modes
        .iter()
        .map(|&mode| {
            let resolved = config.periods.resolve(mode);
            ensure_valid(mode, &resolved)?;
            Ok(resolved)
        })
        .collect::<Result<Vec<_>>>()?;

    let output_dir = args.output_dir.or_else(|| config.output.csv_dir.clone());
    if let Some(dir) = &output_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {dir}"))?;
    }

    println!(
        "Running batch detection with {} scenarios...\n",
        config.scenarios.len()
    );

    let mut rows = Vec::new();
    let mut failed = 0;
    for (idx, scenario) in config.scenarios.iter().enumerate() {
        println!(
            "[{}/{}] Running scenario: {}",
            idx + 1,
            config.scenarios.len(),
            scenario.name
        );

        let outcome = load_scenario(&scenario.source, timezone).map(|source| {
            run_detection(
                source,
                &configs,
                &config.periods.enrichment,
                config.settings.now,
            )
        });

        match outcome {
            Ok(report) => {
                if let Some(dir) = &output_dir {
                    let path = Path::new(dir).join(format!("{}.csv", scenario.name));
                    CsvFormatter::write_file(&report, &path.to_string_lossy())?;
                }
                rows.extend(BatchSummaryRow::from_report(&scenario.name, &report));
                println!("  ✓ Completed\n");
            }
            Err(e) => {
                // Continue with remaining scenarios
                eprintln!("  ✗ Failed: {e:#}\n");
                failed += 1;
            }
        }
    }

    println!("{}", TableFormatter::format_batch_summary(&rows));
    if let Some(dir) = &output_dir {
        println!("Results saved to: {dir}");
    }
    if failed > 0 {
        warn!(failed, "some scenarios failed");
    }
    info!(scenarios = config.scenarios.len(), failed, "batch finished");

    Ok(())
}

fn validate_command(args: &ValidateArgs) -> Result<()> {
    let modes = [PeriodMode::BestPrice, PeriodMode::PeakPrice];
    let file = load_period_file(&args.config)?;

    let mut has_errors = false;
    for mode in modes {
        let mut config = file.resolve(mode);
        args.config.apply_overrides(&mut config);

        let result = config.validate();
        has_errors |= result.has_errors();
        print!("{}", TableFormatter::format_validation(mode.label(), &result));
    }

    if has_errors {
        anyhow::bail!("Configuration has errors");
    }
    Ok(())
}

fn load_period_file(args: &ConfigArgs) -> Result<PeriodConfigFile> {
    match &args.config_file {
        Some(path) => PeriodConfigFile::from_file(path),
        None => Ok(PeriodConfigFile::default()),
    }
}

/// Resolve one config per mode: file table, then command-line overrides
fn resolve_configs(
    args: &ConfigArgs,
    modes: &[PeriodMode],
) -> Result<(Vec<PeriodConfig>, EnrichmentSettings)> {
    let file = load_period_file(args)?;

    let configs = modes
        .iter()
        .map(|&mode| {
            let mut config = file.resolve(mode);
            args.apply_overrides(&mut config);
            ensure_valid(mode, &config)?;
            Ok(config)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((configs, file.enrichment))
}

fn ensure_valid(mode: PeriodMode, config: &PeriodConfig) -> Result<()> {
    let result = config.validate();
    for issue in &result.warnings {
        warn!(mode = mode.label(), field = %issue.field, "{}", issue.message);
    }
    if result.has_errors() {
        anyhow::bail!(
            "Invalid {} configuration:\n{}",
            mode.label(),
            TableFormatter::format_validation(mode.label(), &result)
        );
    }
    Ok(())
}

fn synthetic_loader(
    scenario_id: &str,
    start_date: NaiveDate,
    days: u32,
    seed: u64,
    timezone: Tz,
) -> Result<SyntheticLoader> {
    let Some(scenario) = PriceScenario::from_id(scenario_id) else {
        let known: Vec<&str> = PRICE_PRESETS.iter().map(|preset| preset.id).collect();
        anyhow::bail!(
            "Unknown scenario '{scenario_id}'. Available: {}",
            known.join(", ")
        );
    };

    Ok(SyntheticLoader {
        scenario,
        options: ScenarioOptions {
            start_date,
            days,
            timezone,
            seed,
        },
    })
}

/// Load the prices of one batch scenario
fn load_scenario(source: &ScenarioSource, timezone: Tz) -> Result<PriceSource> {
    match source {
        ScenarioSource::Synthetic {
            price_scenario,
            days,
            seed,
            start_date,
        } => {
            if !(1..=3).contains(days) {
                anyhow::bail!("Invalid days: {days}. Must be between 1 and 3.");
            }
            let start = start_date.unwrap_or_else(|| today(timezone));
            synthetic_loader(price_scenario, start, *days, *seed, timezone)?.load(None)
        }
        ScenarioSource::Json { json_path } => JsonLoader::new(json_path.clone()).load(None),
        ScenarioSource::Csv { csv_path } => CsvLoader::new(csv_path.clone()).load(None),
        ScenarioSource::Database { db_path, date } => {
            SqliteLoader::new(db_path.clone(), timezone).load(Some(*date))
        }
    }
}

fn today(timezone: Tz) -> NaiveDate {
    Utc::now().with_timezone(&timezone).date_naive()
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").with_context(|| {
        format!(
            "Invalid date format: '{value}'\n\n\
            Expected format: YYYY-MM-DD (e.g., 2025-03-10)"
        )
    })
}

fn validate_detect_args(args: &DetectArgs) -> Result<()> {
    // Check for conflicting data sources
    let source_count = [
        args.from_db.is_some(),
        args.from_json.is_some(),
        args.from_csv.is_some(),
    ]
    .iter()
    .filter(|&&x| x)
    .count();

    if source_count > 1 {
        anyhow::bail!(
            "Conflicting data sources. Please use only one of: --from-db, --from-json, --from-csv, or synthetic (default)."
        );
    }

    if args.from_db.is_some() && args.date.is_none() {
        anyhow::bail!("--date is required when using --from-db");
    }

    // Validate file paths exist
    for path in [&args.from_db, &args.from_json, &args.from_csv]
        .into_iter()
        .flatten()
    {
        if !Path::new(path).exists() {
            anyhow::bail!("Input file not found: {path}");
        }
    }

    if args.csv_path.is_some() && args.output != "csv" {
        anyhow::bail!("--csv-path only applies to --output csv");
    }

    Ok(())
}

fn validate_batch_args(args: &BatchArgs) -> Result<()> {
    let Some(config) = &args.config else {
        return Ok(());
    };

    if !Path::new(config).exists() {
        anyhow::bail!(
            "Configuration file not found: {config}\n\n\
            Run 'fluxion-period-sim batch --print-example' to see the format."
        );
    }

    Ok(())
}
