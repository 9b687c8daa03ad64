//! Derived statistics over a collection.
//!
//! Nothing here fails on an empty collection: `derive_stats` returns `None`
//! and the series functions return empty vectors.

use crate::{EntryCollection, Error, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of entries (or days) a "week" covers
pub const WEEK_LEN: usize = 7;

/// How `weekly_change` picks its starting point
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeeklyChangePolicy {
    /// The last seven entries in stored order, whatever dates they carry
    #[default]
    ByRowCount,
    /// Entries dated within seven days of the latest entry
    ByCalendarWindow,
}

impl FromStr for WeeklyChangePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "by_row_count" => Ok(Self::ByRowCount),
            "by_calendar_window" => Ok(Self::ByCalendarWindow),
            other => Err(Error::Config(format!(
                "Unknown weekly change policy '{}' (expected by_row_count or by_calendar_window)",
                other
            ))),
        }
    }
}

impl fmt::Display for WeeklyChangePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByRowCount => f.write_str("by_row_count"),
            Self::ByCalendarWindow => f.write_str("by_calendar_window"),
        }
    }
}

/// Mean side-effect severities across all entries
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SideEffectAverages {
    pub nausea: f64,
    pub fatigue: f64,
    pub gi: f64,
    pub sleep: f64,
}

/// Summary of a non-empty collection
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Stats {
    /// Weight of the chronologically last entry
    pub current_weight: f64,
    /// Baseline weight minus current weight; positive means weight lost
    pub total_change: f64,
    pub current_dose: f64,
    pub days_tracking: i64,
    /// Weight lost over the last week; `None` without enough history
    pub weekly_change: Option<f64>,
    pub averages: SideEffectAverages,
}

/// A dated value for chart consumers
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Summarize a collection. Returns `None` when it is empty.
pub fn derive_stats(collection: &EntryCollection, policy: WeeklyChangePolicy) -> Option<Stats> {
    let timeline = collection.chronological();
    let (first, last) = (timeline.first()?, timeline.last()?);

    let days_tracking = (last.date - first.date).num_days();

    let weekly_change = match policy {
        WeeklyChangePolicy::ByRowCount => {
            let entries = collection.entries();
            (entries.len() >= WEEK_LEN).then(|| {
                let week = &entries[entries.len() - WEEK_LEN..];
                week[0].weight - week[WEEK_LEN - 1].weight
            })
        }
        WeeklyChangePolicy::ByCalendarWindow => {
            if days_tracking >= WEEK_LEN as i64 {
                let cutoff = last.date - Duration::days(WEEK_LEN as i64);
                timeline
                    .iter()
                    .find(|e| e.date >= cutoff)
                    .map(|start| start.weight - last.weight)
            } else {
                None
            }
        }
    };

    let n = timeline.len() as f64;
    let mean = |f: fn(&crate::Entry) -> u8| -> f64 {
        timeline.iter().map(|e| f64::from(f(e))).sum::<f64>() / n
    };
    let averages = SideEffectAverages {
        nausea: mean(|e| e.nausea),
        fatigue: mean(|e| e.fatigue),
        gi: mean(|e| e.gi),
        sleep: mean(|e| e.sleep),
    };

    Some(Stats {
        current_weight: last.weight,
        total_change: first.weight - last.weight,
        current_dose: last.dose,
        days_tracking,
        weekly_change,
        averages,
    })
}

/// Each entry's weight relative to the baseline, in date order.
/// Negative values are weight lost.
pub fn baseline_deltas(collection: &EntryCollection) -> Vec<SeriesPoint> {
    let timeline = collection.chronological();
    let Some(baseline) = timeline.first().map(|e| e.weight) else {
        return Vec::new();
    };

    timeline
        .iter()
        .map(|e| SeriesPoint {
            date: e.date,
            value: e.weight - baseline,
        })
        .collect()
}

/// Trailing mean of weight over up to `window` entries, in date order
pub fn rolling_average(collection: &EntryCollection, window: usize) -> Result<Vec<SeriesPoint>> {
    if window == 0 {
        return Err(Error::Validation("rolling window must be at least 1".into()));
    }

    let timeline = collection.chronological();
    let points = timeline
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let start = (i + 1).saturating_sub(window);
            let slice = &timeline[start..=i];
            let sum: f64 = slice.iter().map(|e| e.weight).sum();
            SeriesPoint {
                date: e.date,
                value: sum / slice.len() as f64,
            }
        })
        .collect();

    Ok(points)
}
