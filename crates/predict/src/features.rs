use serde::{Deserialize, Serialize};

use matplan_recon::model::{MasterRecord, MasterView};

use crate::encoding::CategoryEncoder;

pub const N_FEATURES: usize = 9;

pub type FeatureRow = [f64; N_FEATURES];

/// Feature columns, in model order.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "ac_typ_encoded",
    "aircraft_hours",
    "aircraft_cycles",
    "hours_per_cycle",
    "is_eol",
    "station_encoded",
    "duration_days",
    "planned_parts_count",
    "planned_cost",
];

pub const FEATURE_LABELS: [&str; N_FEATURES] = [
    "Aircraft Type",
    "Aircraft Hours",
    "Aircraft Cycles",
    "Hours per Cycle",
    "End of Lease",
    "Station",
    "Duration (days)",
    "Planned Parts Count",
    "Planned Cost",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Encoders {
    pub ac_typ: CategoryEncoder,
    pub station: CategoryEncoder,
}

/// Training matrix built from master rows that have consumption.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub rows: Vec<FeatureRow>,
    /// `consumed_parts_count` per row.
    pub target: Vec<f64>,
    pub encoders: Encoders,
    /// consumed / planned for rows with a plan.
    pub accuracy_ratios: Vec<f64>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Median of the defined values; 0 when there are none.
pub fn median(values: &[f64]) -> f64 {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    if v.is_empty() {
        return 0.0;
    }
    v.sort_by(f64::total_cmp);
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        (v[mid - 1] + v[mid]) / 2.0
    } else {
        v[mid]
    }
}

fn median_filled(rows: &[&MasterRecord], get: impl Fn(&MasterRecord) -> Option<f64>) -> Vec<f64> {
    let fill = median(&rows.iter().filter_map(|r| get(r)).collect::<Vec<_>>());
    rows.iter().map(|r| get(r).unwrap_or(fill)).collect()
}

pub fn build_training_set(view: &MasterView) -> TrainingSet {
    let rows: Vec<&MasterRecord> = view.rows.iter().filter(|r| r.consumption.is_some()).collect();

    let encoders = Encoders {
        ac_typ: CategoryEncoder::fit(rows.iter().map(|r| r.work_package.ac_typ.as_deref())),
        station: CategoryEncoder::fit(rows.iter().map(|r| r.work_package.station.as_deref())),
    };

    let hours = median_filled(&rows, MasterRecord::aircraft_hours);
    let cycles = median_filled(&rows, MasterRecord::aircraft_cycles);
    let hpc = median_filled(&rows, MasterRecord::hours_per_cycle);
    let duration = median_filled(&rows, |r| r.duration_days);

    let features = rows
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let wp = &r.work_package;
            [
                encoders.ac_typ.encode(wp.ac_typ.as_deref()),
                hours[i],
                cycles[i],
                hpc[i],
                if wp.is_eol { 1.0 } else { 0.0 },
                encoders.station.encode(wp.station.as_deref()),
                duration[i],
                r.planned_parts_count().unwrap_or(0) as f64,
                r.planned_cost().unwrap_or(0.0),
            ]
        })
        .collect();

    let target = rows
        .iter()
        .map(|r| r.consumed_parts_count().unwrap_or(0) as f64)
        .collect();

    let accuracy_ratios = rows
        .iter()
        .filter_map(|r| {
            let planned = r.planned_parts_count().filter(|&p| p > 0)?;
            Some(r.consumed_parts_count()? as f64 / planned as f64)
        })
        .collect();

    TrainingSet {
        rows: features,
        target,
        encoders,
        accuracy_ratios,
    }
}

// ---------------------------------------------------------------------------
// Prediction input
// ---------------------------------------------------------------------------

/// Characteristics of an upcoming C-check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    pub ac_typ: String,
    pub aircraft_hours: f64,
    pub aircraft_cycles: f64,
    pub is_eol: bool,
    pub station: String,
    pub duration_days: f64,
    pub planned_parts_count: usize,
    pub planned_cost: f64,
}

impl Default for PredictionInput {
    fn default() -> Self {
        Self {
            ac_typ: "A320S".into(),
            aircraft_hours: 10_000.0,
            aircraft_cycles: 5_000.0,
            is_eol: false,
            station: "TLLM".into(),
            duration_days: 18.0,
            planned_parts_count: 0,
            planned_cost: 0.0,
        }
    }
}

impl PredictionInput {
    pub fn features(&self, encoders: &Encoders) -> FeatureRow {
        [
            encoders.ac_typ.encode(Some(&self.ac_typ)),
            self.aircraft_hours,
            self.aircraft_cycles,
            self.aircraft_hours / self.aircraft_cycles.max(1.0),
            if self.is_eol { 1.0 } else { 0.0 },
            encoders.station.encode(Some(&self.station)),
            self.duration_days,
            self.planned_parts_count as f64,
            self.planned_cost,
        ]
    }
}

/// Coarse check interval from a free-text check type label.
pub fn categorize_check_type(check_type: Option<&str>) -> &'static str {
    let Some(label) = check_type else {
        return "Unknown";
    };
    let label = label.to_lowercase();
    if label.contains('6') || label.contains("72") {
        "6-year"
    } else if label.contains('4') || label.contains("48") {
        "4-year"
    } else if label.contains('2') || label.contains("24") {
        "2-year"
    } else {
        "Other"
    }
}
