use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::model::{MasterRecord, MasterView, MaterialLine};

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

// ---------------------------------------------------------------------------
// Station performance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationPerformance {
    pub station: String,
    pub checks: usize,
    pub mean_accuracy: Option<f64>,
    pub mean_consumed_cost: Option<f64>,
    pub mean_consumed_parts: Option<f64>,
    pub mean_duration_days: Option<f64>,
}

/// Per-station averages over C-checks that have an accuracy or a consumed
/// cost. Best mean accuracy first, stations without one last.
pub fn station_performance(view: &MasterView) -> Vec<StationPerformance> {
    let mut groups: BTreeMap<&str, Vec<&MasterRecord>> = BTreeMap::new();
    for row in view.c_checks() {
        if row.planning_accuracy.is_none() && row.consumed_cost().is_none() {
            continue;
        }
        let Some(station) = row.work_package.station.as_deref() else {
            continue;
        };
        groups.entry(station).or_default().push(row);
    }

    let mut out: Vec<StationPerformance> = groups
        .into_iter()
        .map(|(station, rows)| StationPerformance {
            station: station.to_string(),
            checks: rows.len(),
            mean_accuracy: mean(rows.iter().filter_map(|r| r.planning_accuracy)),
            mean_consumed_cost: mean(rows.iter().filter_map(|r| r.consumed_cost())),
            mean_consumed_parts: mean(rows.iter().filter_map(|r| r.consumed_parts_count().map(|n| n as f64))),
            mean_duration_days: mean(rows.iter().filter_map(|r| r.duration_days)),
        })
        .collect();

    out.sort_by(|a, b| match (a.mean_accuracy, b.mean_accuracy) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    out
}

// ---------------------------------------------------------------------------
// Accuracy trend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Month,
    Quarter,
    Year,
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "month" | "monthly" => Ok(Self::Month),
            "quarter" | "quarterly" => Ok(Self::Quarter),
            "year" | "yearly" => Ok(Self::Year),
            other => Err(format!("unknown period '{other}' (expected month, quarter or year)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period: String,
    pub mean_accuracy: f64,
    pub checks: usize,
}

/// Mean planning accuracy of C-checks per start-date period, oldest first.
pub fn accuracy_trend(view: &MasterView, period: Period) -> Vec<TrendPoint> {
    // (year, sub-period) keeps chronological order in the map
    let mut groups: BTreeMap<(i32, u32), Vec<f64>> = BTreeMap::new();
    for row in view.c_checks() {
        let (Some(acc), Some(start)) = (row.planning_accuracy, row.work_package.start_date) else {
            continue;
        };
        let sub = match period {
            Period::Month => start.month(),
            Period::Quarter => (start.month() - 1) / 3 + 1,
            Period::Year => 0,
        };
        groups.entry((start.year(), sub)).or_default().push(acc);
    }

    groups
        .into_iter()
        .map(|((year, sub), values)| TrendPoint {
            period: match period {
                Period::Month => format!("{year}-{sub:02}"),
                Period::Quarter => format!("{year}Q{sub}"),
                Period::Year => year.to_string(),
            },
            mean_accuracy: values.iter().sum::<f64>() / values.len() as f64,
            checks: values.len(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Part comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartStatus {
    Both,
    PlannedOnly,
    UnplannedUse,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartComparison {
    pub partno: String,
    pub description: Option<String>,
    pub ata_chapter: Option<String>,
    pub planned_qty: f64,
    pub planned_cost: f64,
    pub consumed_qty: f64,
    pub consumed_cost: f64,
    pub qty_variance: f64,
    pub cost_variance: f64,
    pub status: PartStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartsSummary {
    pub planned_parts: usize,
    pub consumed_parts: usize,
    pub both: usize,
    pub planned_only: usize,
    pub unplanned_use: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartsReport {
    pub wpno_i: String,
    pub parts: Vec<PartComparison>,
    pub summary: PartsSummary,
}

#[derive(Default)]
struct PartSide {
    qty: f64,
    cost: f64,
    text: Option<String>,
}

/// Planned vs consumed material for one work package, per part number.
///
/// Only issued consumption (negative quantity) counts. Parts with neither a
/// positive planned nor a consumed quantity are left out. Parts are ordered
/// by part number.
pub fn compare_parts(planned: &[MaterialLine], consumed: &[MaterialLine], wpno_i: &str) -> PartsReport {
    let mut plan: BTreeMap<&str, PartSide> = BTreeMap::new();
    for line in planned.iter().filter(|l| l.work_package_key() == Some(wpno_i)) {
        let Some(partno) = line.partno.as_deref() else {
            continue;
        };
        let side = plan.entry(partno).or_default();
        side.qty += line.qty.unwrap_or(0.0);
        side.cost += line.amount.unwrap_or(0.0);
        if side.text.is_none() {
            side.text = line.description.clone();
        }
    }

    let mut used: BTreeMap<&str, PartSide> = BTreeMap::new();
    for line in consumed
        .iter()
        .filter(|l| l.work_package_key() == Some(wpno_i) && l.qty.map_or(false, |q| q < 0.0))
    {
        let Some(partno) = line.partno.as_deref() else {
            continue;
        };
        let side = used.entry(partno).or_default();
        side.qty += line.qty.map_or(0.0, f64::abs);
        side.cost += line.amount.unwrap_or(0.0);
        if side.text.is_none() {
            side.text = line.ata_chapter.clone();
        }
    }

    let mut summary = PartsSummary {
        planned_parts: plan.len(),
        consumed_parts: used.len(),
        ..Default::default()
    };

    let mut partnos: Vec<&str> = plan.keys().chain(used.keys()).copied().collect();
    partnos.sort_unstable();
    partnos.dedup();

    let parts = partnos
        .into_iter()
        .filter_map(|partno| {
            let p = plan.remove(partno).unwrap_or_default();
            let u = used.remove(partno).unwrap_or_default();
            let status = match (p.qty > 0.0, u.qty > 0.0) {
                (true, true) => PartStatus::Both,
                (true, false) => PartStatus::PlannedOnly,
                (false, true) => PartStatus::UnplannedUse,
                (false, false) => return None,
            };
            match status {
                PartStatus::Both => summary.both += 1,
                PartStatus::PlannedOnly => summary.planned_only += 1,
                PartStatus::UnplannedUse => summary.unplanned_use += 1,
            }
            Some(PartComparison {
                partno: partno.to_string(),
                description: p.text,
                ata_chapter: u.text,
                planned_qty: p.qty,
                planned_cost: p.cost,
                consumed_qty: u.qty,
                consumed_cost: u.cost,
                qty_variance: u.qty - p.qty,
                cost_variance: u.cost - p.cost,
                status,
            })
        })
        .collect();

    PartsReport {
        wpno_i: wpno_i.to_string(),
        parts,
        summary,
    }
}
