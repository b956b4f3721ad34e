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

use fluxion_period_types::interval_duration;
use tracing::debug;

use crate::builder::RawPeriod;

/// Stitch periods the day split broke apart at midnight.
///
/// The builder closes every period at a local date change. Two neighbours are
/// joined when the next one starts exactly one interval after the previous one's
/// last interval and on a later date. Chains over several days merge one boundary
/// at a time.
pub fn merge_midnight_adjacent<'a>(periods: Vec<RawPeriod<'a>>) -> Vec<RawPeriod<'a>> {
    let mut merged: Vec<RawPeriod<'a>> = Vec::with_capacity(periods.len());

    for period in periods {
        if let Some(previous) = merged.last_mut()
            && crosses_midnight_contiguously(previous, &period)
        {
            debug!(
                previous_start = ?previous.start(),
                next_start = ?period.start(),
                "merging periods across midnight"
            );
            previous.intervals.extend(period.intervals);
            continue;
        }
        merged.push(period);
    }

    merged
}

fn crosses_midnight_contiguously(previous: &RawPeriod<'_>, next: &RawPeriod<'_>) -> bool {
    match (previous.last(), next.first()) {
        (Some(last), Some(first)) => {
            first.starts_at - last.starts_at == interval_duration()
                && first.local_date() > last.local_date()
        }
        _ => false,
    }
}
