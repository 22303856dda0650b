//! Display values derived from a reading snapshot.
//!
//! Every function here is pure: the same reading list always yields the
//! same output, and nothing is cached between calls.

use crate::model::{Reading, ReadingId};
use crate::state::Snapshot;
use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use std::cmp::Reverse;
use std::fmt;

/// Number of trailing readings plotted on the trend chart.
pub const CHART_WINDOW: usize = 6;

/// Most recent reading by normalized timestamp.
///
/// The first reading seeds the fold and a candidate only replaces the
/// current pick when its instant is strictly greater. Invalid timestamps
/// never beat a valid one, so with no valid timestamps the first reading
/// is returned.
pub fn latest(readings: &[Reading]) -> Option<&Reading> {
    let (first, rest) = readings.split_first()?;
    let (latest, _) = rest
        .iter()
        .fold((first, first.instant()), |(best, best_at), candidate| {
            let at = candidate.instant();
            if at > best_at {
                (candidate, at)
            } else {
                (best, best_at)
            }
        });
    Some(latest)
}

/// Mean of `leitura`, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Average {
    NotAvailable,
    Value(f64),
}

impl Average {
    pub fn value(&self) -> Option<f64> {
        match self {
            Average::Value(v) => Some(*v),
            Average::NotAvailable => None,
        }
    }
}

impl fmt::Display for Average {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Average::Value(v) => write!(f, "{:.2}", v),
            Average::NotAvailable => f.write_str("N/A"),
        }
    }
}

impl Serialize for Average {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Average::Value(v) => serializer.serialize_some(v),
            Average::NotAvailable => serializer.serialize_none(),
        }
    }
}

pub fn average(readings: &[Reading]) -> Average {
    if readings.is_empty() {
        return Average::NotAvailable;
    }
    let len = readings.len() as f64;
    let sum: f64 = readings.iter().map(|r| r.leitura).sum();
    let mean = if sum.is_finite() {
        sum / len
    } else {
        // Scaling first keeps the partial sums within f64 range
        readings.iter().map(|r| r.leitura / len).sum()
    };
    Average::Value(round_cents(mean))
}

fn round_cents(value: f64) -> f64 {
    let scaled = value * 100.0;
    if scaled.is_finite() {
        scaled.round() / 100.0
    } else {
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PumpStatus {
    #[serde(rename = "Ligada")]
    On,
    #[serde(rename = "Desligada")]
    Off,
}

impl PumpStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PumpStatus::On => "Ligada",
            PumpStatus::Off => "Desligada",
        }
    }
}

impl fmt::Display for PumpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pump state of a reading; no reading means the pump is shown as off.
pub fn pump_status(reading: Option<&Reading>) -> PumpStatus {
    match reading {
        Some(r) if r.pump_on() => PumpStatus::On,
        _ => PumpStatus::Off,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// Last [`CHART_WINDOW`] readings in arrival order, not sorted by time.
pub fn chart_window(readings: &[Reading]) -> Vec<ChartPoint> {
    let start = readings.len().saturating_sub(CHART_WINDOW);
    readings[start..]
        .iter()
        .map(|r| ChartPoint {
            label: r.instant().time_label(),
            value: r.leitura,
        })
        .collect()
}

/// Readings newest first. Invalid timestamps go last, ties keep arrival order.
pub fn history(readings: &[Reading]) -> Vec<&Reading> {
    let mut sorted: Vec<&Reading> = readings.iter().collect();
    sorted.sort_by_cached_key(|r| Reverse(r.instant()));
    sorted
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestCard {
    pub id: ReadingId,
    pub leitura: f64,
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub id: ReadingId,
    pub timestamp: String,
    pub leitura: f64,
    pub status: String,
    pub pump: PumpStatus,
}

/// Everything one render needs, projected from a single snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub loading: bool,
    pub error: Option<&'static str>,
    pub updated_at: Option<DateTime<Local>>,
    pub count: usize,
    pub latest: Option<LatestCard>,
    pub average: Average,
    pub pump: PumpStatus,
    pub chart: Vec<ChartPoint>,
    pub history: Vec<HistoryRow>,
}

impl DashboardView {
    pub fn project(snapshot: &Snapshot) -> Self {
        let readings = &snapshot.readings[..];
        let newest = latest(readings);

        Self {
            loading: snapshot.loading,
            error: snapshot.error,
            updated_at: snapshot.updated_at,
            count: readings.len(),
            latest: newest.map(|r| LatestCard {
                id: r.id.clone(),
                leitura: r.leitura,
                status: r.status.clone(),
                timestamp: r.instant().display_label(),
            }),
            average: average(readings),
            pump: pump_status(newest),
            chart: chart_window(readings),
            history: history(readings)
                .into_iter()
                .map(|r| HistoryRow {
                    id: r.id.clone(),
                    timestamp: r.instant().display_label(),
                    leitura: r.leitura,
                    status: r.status.clone(),
                    pump: pump_status(Some(r)),
                })
                .collect(),
        }
    }
}
