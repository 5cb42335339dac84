use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::model::{UtilizationReading, UtilizationSnapshot, WorkPackage};

/// Snapshots grouped per aircraft and sorted by date (stable, undated dropped).
pub struct UtilizationIndex<'a> {
    by_aircraft: HashMap<&'a str, Vec<&'a UtilizationSnapshot>>,
}

impl<'a> UtilizationIndex<'a> {
    pub fn new(snapshots: &'a [UtilizationSnapshot]) -> Self {
        let mut by_aircraft: HashMap<&'a str, Vec<&'a UtilizationSnapshot>> = HashMap::new();
        for snap in snapshots {
            let (Some(reg), Some(_)) = (snap.ac_registr.as_deref(), snap.date) else {
                continue;
            };
            by_aircraft.entry(reg).or_default().push(snap);
        }
        for series in by_aircraft.values_mut() {
            series.sort_by_key(|s| s.date);
        }
        Self { by_aircraft }
    }

    /// Latest snapshot taken at or before `at`; if the aircraft has none that
    /// early, its earliest snapshot. Equal dates resolve to the later table row.
    pub fn snapshot_at(&self, ac_registr: &str, at: NaiveDateTime) -> Option<&'a UtilizationSnapshot> {
        let series = self.by_aircraft.get(ac_registr)?;
        let preceding = series.partition_point(|s| s.date.map_or(false, |d| d <= at));
        if preceding > 0 {
            Some(series[preceding - 1])
        } else {
            series.first().copied()
        }
    }

    /// Utilization reading for a work package, keyed on its aircraft and start.
    pub fn reading_for(&self, wp: &WorkPackage) -> Option<UtilizationReading> {
        let reg = wp.ac_registr.as_deref()?;
        let start = wp.start_date?;
        let snap = self.snapshot_at(reg, start)?;
        Some(UtilizationReading {
            snapshot_date: snap.date,
            hours: snap.hours,
            cycles: snap.cycles,
            hours_per_cycle: hours_per_cycle(snap.hours, snap.cycles),
        })
    }
}

/// `hours / cycles`, undefined when either is missing or cycles is zero.
pub fn hours_per_cycle(hours: Option<f64>, cycles: Option<f64>) -> Option<f64> {
    match (hours, cycles) {
        (Some(h), Some(c)) if c != 0.0 => Some(h / c),
        _ => None,
    }
}
