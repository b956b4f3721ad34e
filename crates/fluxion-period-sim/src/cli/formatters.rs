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

//! Output formatters for CLI detection results.

use std::fs::File;
use std::io::Write;

use anyhow::{Context, Result};
use comfy_table::{Attribute, Cell, Color, Table, presets::UTF8_FULL};
use fluxion_periods::{PeriodSummary, ValidationIssue, ValidationResult, Volatility};
use serde::Serialize;

use crate::report::{DetectionReport, ModeResult};

/// Formatter for pretty ASCII tables
#[derive(Debug)]
pub struct TableFormatter;

/// Formatter for JSON output
#[derive(Debug)]
pub struct JsonFormatter;

/// Formatter for CSV export
#[derive(Debug)]
pub struct CsvFormatter;

/// One line of the batch summary table
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummaryRow {
    pub scenario: String,
    pub mode: String,
    pub periods: usize,
    pub relaxation_level: u32,
    pub target_met: bool,
    pub warnings: usize,
    pub first_period: Option<String>,
}

impl BatchSummaryRow {
    pub fn from_report(scenario: &str, report: &DetectionReport) -> Vec<Self> {
        report
            .results
            .iter()
            .map(|result| {
                let detection = &result.detection;
                Self {
                    scenario: scenario.to_owned(),
                    mode: result.mode.label().to_owned(),
                    periods: detection.periods.len(),
                    relaxation_level: detection.metadata.relaxation.level,
                    target_met: detection.metadata.relaxation.target_met,
                    warnings: detection.metadata.warnings.len(),
                    first_period: detection.periods.first().map(period_window),
                }
            })
            .collect()
    }
}

fn period_window(period: &PeriodSummary) -> String {
    if period.start.date_naive() == period.end.date_naive() {
        format!(
            "{} {}-{}",
            period.start.format("%m-%d"),
            period.start.format("%H:%M"),
            period.end.format("%H:%M")
        )
    } else {
        format!(
            "{} {} - {} {}",
            period.start.format("%m-%d"),
            period.start.format("%H:%M"),
            period.end.format("%m-%d"),
            period.end.format("%H:%M")
        )
    }
}

fn volatility_cell(volatility: Volatility) -> Cell {
    let cell = Cell::new(volatility.as_str());
    match volatility {
        Volatility::Low => cell,
        Volatility::Moderate => cell.fg(Color::Yellow),
        Volatility::High | Volatility::VeryHigh => cell.fg(Color::Red),
    }
}

fn bold(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

impl TableFormatter {
    /// Format every mode of a report as one table each
    pub fn format_report(report: &DetectionReport) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "Source: {} | Intervals: {} | Now: {}\n",
            report.source,
            report.interval_count,
            report.now.format("%Y-%m-%d %H:%M %:z")
        ));

        for result in &report.results {
            output.push('\n');
            output.push_str(&Self::format_mode(result));
        }

        output
    }

    /// Format the periods of one mode plus its relaxation line and warnings
    pub fn format_mode(result: &ModeResult) -> String {
        let detection = &result.detection;
        let mut output = format!("=== {} periods ===\n", result.mode.label());

        if detection.periods.is_empty() {
            output.push_str("No periods found\n");
        } else {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec![
                bold("#"),
                bold("Window"),
                bold("Length\n(min)"),
                bold("Level"),
                bold("Rating"),
                bold("Avg"),
                bold("Min / Max"),
                bold("vs Day Avg\n(%)"),
                bold("Volatility"),
                bold("Relaxed"),
            ]);

            for period in &detection.periods {
                let relaxed = if period.relaxation_active {
                    format!(
                        "L{} ({:.1}%)",
                        period.relaxation_level, period.relaxation_threshold_applied_pct
                    )
                } else {
                    "-".to_owned()
                };

                table.add_row(vec![
                    Cell::new(format!("{}/{}", period.period_position, period.periods_total)),
                    Cell::new(period_window(period)),
                    Cell::new(period.duration_minutes),
                    Cell::new(period.level.as_str()),
                    Cell::new(format!(
                        "{} ({:+.1}%)",
                        period.rating_level.as_str(),
                        period.rating_difference_pct
                    )),
                    Cell::new(format!("{:.4}", period.price_avg)),
                    Cell::new(format!("{:.4} / {:.4}", period.price_min, period.price_max)),
                    Cell::new(format!("{:+.1}", period.price_diff_from_day_avg_pct)),
                    volatility_cell(period.volatility),
                    Cell::new(relaxed),
                ]);
            }

            output.push_str(&table.to_string());
            output.push('\n');
        }

        let relaxation = &detection.metadata.relaxation;
        output.push_str(&format!(
            "Relaxation: level {} after {} run(s) | flex {:.1}% -> {:.1}% | min distance {:.1}% -> {:.1}%\n",
            relaxation.level,
            relaxation.attempts_run,
            relaxation.original_flex_pct,
            relaxation.applied_flex_pct,
            relaxation.original_min_distance_pct,
            relaxation.applied_min_distance_pct,
        ));
        if detection.metadata.skipped_intervals > 0 {
            output.push_str(&format!(
                "Skipped intervals: {}\n",
                detection.metadata.skipped_intervals
            ));
        }
        for warning in &detection.metadata.warnings {
            output.push_str(&format!("Warning: {warning}\n"));
        }

        output
    }

    /// Format one row per scenario and mode
    pub fn format_batch_summary(rows: &[BatchSummaryRow]) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            bold("Scenario"),
            bold("Mode"),
            bold("Periods"),
            bold("Relaxation\nLevel"),
            bold("Target\nMet"),
            bold("Warnings"),
            bold("First Period"),
        ]);

        for row in rows {
            let met = if row.target_met {
                Cell::new("yes").fg(Color::Green)
            } else {
                Cell::new("no").fg(Color::Red)
            };
            table.add_row(vec![
                Cell::new(&row.scenario),
                Cell::new(&row.mode),
                Cell::new(row.periods),
                Cell::new(row.relaxation_level),
                met,
                Cell::new(row.warnings),
                Cell::new(row.first_period.as_deref().unwrap_or("-")),
            ]);
        }

        format!("{table}\n")
    }

    /// Format validation issues, or a success line
    pub fn format_validation(label: &str, result: &ValidationResult) -> String {
        if result.errors.is_empty() && result.warnings.is_empty() {
            return format!("{label}: configuration is valid\n");
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![bold("Severity"), bold("Field"), bold("Message")]);

        let issue_row = |issue: &ValidationIssue, severity: Cell| {
            vec![severity, Cell::new(&issue.field), Cell::new(&issue.message)]
        };
        for issue in &result.errors {
            table.add_row(issue_row(issue, Cell::new("error").fg(Color::Red)));
        }
        for issue in &result.warnings {
            table.add_row(issue_row(issue, Cell::new("warning").fg(Color::Yellow)));
        }

        format!(
            "{label}: {} error(s), {} warning(s)\n{table}\n",
            result.errors.len(),
            result.warnings.len()
        )
    }
}

impl JsonFormatter {
    pub fn format_report(report: &DetectionReport) -> Result<String> {
        serde_json::to_string_pretty(report).context("Failed to serialize detection report")
    }
}

/// One CSV line per period
#[derive(Debug, Serialize)]
struct PeriodRow<'a> {
    source: &'a str,
    mode: &'a str,
    position: usize,
    start: String,
    end: String,
    duration_minutes: i64,
    interval_count: usize,
    level: &'static str,
    rating_level: &'static str,
    rating_difference_pct: f64,
    price_avg: f64,
    price_min: f64,
    price_max: f64,
    price_median: f64,
    price_spread: f64,
    price_diff_from_day_avg_pct: f64,
    volatility: &'static str,
    coefficient_of_variation_pct: f64,
    relaxation_level: u32,
    relaxation_threshold_applied_pct: f64,
}

impl CsvFormatter {
    /// Write the periods of every mode as CSV
    pub fn write_periods<W: Write>(report: &DetectionReport, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        for result in &report.results {
            for period in &result.detection.periods {
                csv_writer.serialize(PeriodRow {
                    source: &report.source,
                    mode: result.mode.label(),
                    position: period.period_position,
                    start: period.start.to_rfc3339(),
                    end: period.end.to_rfc3339(),
                    duration_minutes: period.duration_minutes,
                    interval_count: period.interval_count,
                    level: period.level.as_str(),
                    rating_level: period.rating_level.as_str(),
                    rating_difference_pct: period.rating_difference_pct,
                    price_avg: period.price_avg,
                    price_min: period.price_min,
                    price_max: period.price_max,
                    price_median: period.price_median,
                    price_spread: period.price_spread,
                    price_diff_from_day_avg_pct: period.price_diff_from_day_avg_pct,
                    volatility: period.volatility.as_str(),
                    coefficient_of_variation_pct: period.coefficient_of_variation_pct,
                    relaxation_level: period.relaxation_level,
                    relaxation_threshold_applied_pct: period.relaxation_threshold_applied_pct,
                })?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Export periods to a CSV file
    pub fn write_file(report: &DetectionReport, path: &str) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Failed to create CSV file: {path}"))?;
        Self::write_periods(report, file)
    }
}
