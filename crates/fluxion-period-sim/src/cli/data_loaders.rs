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

//! Data loaders turning the supported sources into raw interval records.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use fluxion_periods::{PriceLevel, RatingLevel, RawPriceInterval};
use rusqlite::Connection;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::price_scenarios::{PriceScenario, ScenarioOptions, generate_intervals, local_midnight};

/// Records loaded from one source, not yet enriched
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSource {
    pub name: String,
    pub records: Vec<RawPriceInterval>,
}

/// Trait for loading price records from various sources
pub trait DataLoader {
    /// Load data for the specified date (if applicable)
    fn load(&self, date: Option<NaiveDate>) -> Result<PriceSource>;
}

fn file_label(path: &str) -> String {
    Path::new(path)
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

/// Loader for synthetic data using built-in scenarios
#[derive(Debug, Clone)]
pub struct SyntheticLoader {
    pub scenario: PriceScenario,
    pub options: ScenarioOptions,
}

impl DataLoader for SyntheticLoader {
    /// A given date replaces `options.start_date`
    fn load(&self, date: Option<NaiveDate>) -> Result<PriceSource> {
        let mut options = self.options;
        if let Some(date) = date {
            options.start_date = date;
        }

        let records = generate_intervals(&self.scenario, &options);
        if records.is_empty() {
            anyhow::bail!("Scenario '{}' produced no prices", self.scenario.name());
        }

        Ok(PriceSource {
            name: format!("{} ({}, {} day(s))", self.scenario.name(), options.start_date, options.days),
            records,
        })
    }
}

/// Loader for JSON interval dumps
///
/// Accepts a bare array of records or an object with an `intervals` array.
#[derive(Debug, Clone)]
pub struct JsonLoader {
    json_path: String,
}

impl JsonLoader {
    pub fn new(json_path: String) -> Self {
        Self { json_path }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonPayload {
    List(Vec<RawPriceInterval>),
    Wrapped { intervals: Vec<RawPriceInterval> },
}

impl DataLoader for JsonLoader {
    fn load(&self, _date: Option<NaiveDate>) -> Result<PriceSource> {
        let content = std::fs::read_to_string(&self.json_path)
            .with_context(|| format!("Failed to read JSON file: {}", self.json_path))?;

        let payload: JsonPayload = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON file: {}", self.json_path))?;

        let records = match payload {
            JsonPayload::List(records) | JsonPayload::Wrapped { intervals: records } => records,
        };
        debug!(path = %self.json_path, records = records.len(), "loaded JSON intervals");

        Ok(PriceSource {
            name: format!("JSON ({})", file_label(&self.json_path)),
            records,
        })
    }
}

/// Loader for CSV files with a `starts_at,total[,level,rating_level,difference]` header
#[derive(Debug, Clone)]
pub struct CsvLoader {
    csv_path: String,
}

impl CsvLoader {
    pub fn new(csv_path: String) -> Self {
        Self { csv_path }
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    starts_at: Option<String>,
    #[serde(default)]
    total: Option<f64>,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    rating_level: Option<String>,
    #[serde(default)]
    difference: Option<f64>,
}

impl CsvRow {
    fn into_record(self, line: usize) -> RawPriceInterval {
        let starts_at = self.starts_at.as_deref().map(str::trim).and_then(|value| {
            match DateTime::parse_from_rfc3339(value) {
                Ok(at) => Some(at),
                Err(error) => {
                    warn!(line, value, %error, "unparsable starts_at in CSV row");
                    None
                }
            }
        });

        RawPriceInterval {
            starts_at,
            total: self.total,
            level: self.level.as_deref().and_then(PriceLevel::parse),
            rating_level: self.rating_level.as_deref().and_then(RatingLevel::parse),
            difference: self.difference,
        }
    }
}

impl DataLoader for CsvLoader {
    fn load(&self, _date: Option<NaiveDate>) -> Result<PriceSource> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.csv_path)
            .with_context(|| format!("Failed to open CSV file: {}", self.csv_path))?;

        let mut records = Vec::new();
        for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
            // header is line 1
            let line = index + 2;
            let row = row.with_context(|| format!("Invalid CSV row at line {line}"))?;
            records.push(row.into_record(line));
        }
        debug!(path = %self.csv_path, records = records.len(), "loaded CSV intervals");

        Ok(PriceSource {
            name: format!("CSV ({})", file_label(&self.csv_path)),
            records,
        })
    }
}

/// Loader for a SQLite `prices(ts INTEGER, price REAL)` table, `ts` in unix seconds
#[derive(Debug, Clone)]
pub struct SqliteLoader {
    db_path: String,
    timezone: Tz,
}

impl SqliteLoader {
    pub fn new(db_path: String, timezone: Tz) -> Self {
        Self { db_path, timezone }
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .with_context(|| format!("Failed to open database at {}", self.db_path))
    }
}

impl DataLoader for SqliteLoader {
    fn load(&self, date: Option<NaiveDate>) -> Result<PriceSource> {
        let date = date.ok_or_else(|| anyhow::anyhow!("Date is required for SQLite loader"))?;

        // local day in the configured zone, 23h or 25h on DST days
        let (Some(start), Some(end)) = (
            local_midnight(self.timezone, date),
            date.succ_opt()
                .and_then(|next| local_midnight(self.timezone, next)),
        ) else {
            anyhow::bail!("Cannot resolve local day {date} in {}", self.timezone);
        };

        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT ts, price FROM prices
             WHERE ts >= ?1 AND ts < ?2
             ORDER BY ts ASC",
        )?;

        let rows: Vec<(i64, f64)> = stmt
            .query_map([start.timestamp(), end.timestamp()], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<rusqlite::Result<_>>()
            .with_context(|| format!("Failed to read prices from {}", self.db_path))?;

        let records: Vec<RawPriceInterval> = rows
            .into_iter()
            .map(|(ts, price)| RawPriceInterval {
                starts_at: DateTime::from_timestamp(ts, 0)
                    .map(|at| at.with_timezone(&self.timezone).fixed_offset()),
                total: Some(price),
                ..Default::default()
            })
            .collect();

        if records.is_empty() {
            anyhow::bail!("No prices for {date} in {}", self.db_path);
        }
        debug!(path = %self.db_path, %date, records = records.len(), "loaded database prices");

        Ok(PriceSource {
            name: format!("Database ({date})"),
            records,
        })
    }
}

/// Parse an IANA timezone name
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|error| anyhow::anyhow!("Unknown timezone '{name}': {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_synthetic_loader_uses_given_date() {
        let loader = SyntheticLoader {
            scenario: PriceScenario::Flat,
            options: ScenarioOptions {
                start_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
                days: 1,
                timezone: chrono_tz::Europe::Prague,
                seed: 1,
            },
        };
        let source = loader
            .load(NaiveDate::from_ymd_opt(2025, 3, 12))
            .unwrap();
        assert_eq!(source.records.len(), 96);
        assert_eq!(
            source.records[0].starts_at.unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()
        );
    }

    #[test]
    fn test_json_loader_accepts_both_shapes() {
        let list = write_temp(
            r#"[{"starts_at": "2025-03-10T00:00:00+01:00", "total": 0.12, "level": "CHEAP"}]"#,
            ".json",
        );
        let wrapped = write_temp(
            r#"{"intervals": [{"starts_at": "2025-03-10T00:15:00+01:00", "total": 0.2}]}"#,
            ".json",
        );

        let first = JsonLoader::new(list.path().display().to_string())
            .load(None)
            .unwrap();
        assert_eq!(first.records.len(), 1);
        assert_eq!(first.records[0].level, Some(PriceLevel::Cheap));

        let second = JsonLoader::new(wrapped.path().display().to_string())
            .load(None)
            .unwrap();
        assert_eq!(second.records[0].total, Some(0.2));
    }

    #[test]
    fn test_csv_loader_optional_columns() {
        let file = write_temp(
            "starts_at,total,level,rating_level,difference\n\
             2025-03-10T00:00:00+01:00,0.10,VERY_CHEAP,LOW,-35.0\n\
             2025-03-10T00:15:00+01:00,0.20,,,\n\
             not-a-time,0.30,,,\n",
            ".csv",
        );
        let source = CsvLoader::new(file.path().display().to_string())
            .load(None)
            .unwrap();

        assert_eq!(source.records.len(), 3);
        assert_eq!(source.records[0].level, Some(PriceLevel::VeryCheap));
        assert_eq!(source.records[0].rating_level, Some(RatingLevel::Low));
        assert_eq!(source.records[0].difference, Some(-35.0));
        assert_eq!(source.records[1].level, None);
        assert_eq!(source.records[1].total, Some(0.20));
        assert_eq!(source.records[2].starts_at, None);
    }

    #[test]
    fn test_csv_loader_two_columns() {
        let file = write_temp("starts_at,total\n2025-03-10T00:00:00+01:00,0.10\n", ".csv");
        let source = CsvLoader::new(file.path().display().to_string())
            .load(None)
            .unwrap();
        assert_eq!(source.records[0].total, Some(0.10));
        assert_eq!(source.records[0].difference, None);
    }

    #[test]
    fn test_sqlite_loader_reads_local_day() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("prices.db");
        let conn = Connection::open(&db_path).unwrap();
        conn.execute("CREATE TABLE prices (ts INTEGER, price REAL)", [])
            .unwrap();

        let tz = chrono_tz::Europe::Prague;
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let start = local_midnight(tz, date).unwrap().timestamp();
        // one row the evening before, three on the day
        for (offset, price) in [(-900, 0.5), (0, 0.1), (900, 0.2), (1800, 0.3)] {
            conn.execute(
                "INSERT INTO prices (ts, price) VALUES (?1, ?2)",
                rusqlite::params![start + offset, price],
            )
            .unwrap();
        }
        drop(conn);

        let loader = SqliteLoader::new(db_path.display().to_string(), tz);
        let source = loader.load(Some(date)).unwrap();
        assert_eq!(source.records.len(), 3);
        assert_eq!(
            source.records[0].starts_at.unwrap().to_rfc3339(),
            "2025-03-10T00:00:00+01:00"
        );
        assert_eq!(source.records[2].total, Some(0.3));

        assert!(loader.load(None).is_err());
        assert!(loader.load(NaiveDate::from_ymd_opt(2025, 3, 11)).is_err());
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("Europe/Prague").unwrap(), chrono_tz::Europe::Prague);
        assert!(parse_timezone("Mars/Olympus").is_err());
    }
}
