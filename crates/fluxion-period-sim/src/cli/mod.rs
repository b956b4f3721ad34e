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

//! CLI module for the period simulator command-line interface.

pub mod args;
pub mod config;
pub mod data_loaders;
pub mod formatters;

pub use args::{BatchArgs, Cli, Commands, ConfigArgs, DetectArgs, ValidateArgs};
pub use config::{BatchConfig, PeriodConfigFile, PeriodConfigPatch, ScenarioSource, parse_modes};
pub use data_loaders::{
    CsvLoader, DataLoader, JsonLoader, PriceSource, SqliteLoader, SyntheticLoader, parse_timezone,
};
pub use formatters::{BatchSummaryRow, CsvFormatter, JsonFormatter, TableFormatter};
