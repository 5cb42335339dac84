use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::model::{
    CategoryTotals, MatchMethod, MatchedConsumption, MaterialCategory, MaterialLine, MaterialSummary,
};

// ---------------------------------------------------------------------------
// Tally
// ---------------------------------------------------------------------------

/// Running totals over a group of material lines.
///
/// Missing quantities and amounts are skipped, not treated as zero rows:
/// the line still counts toward `count`.
#[derive(Debug, Clone, Default)]
pub struct LineTally {
    count: usize,
    qty_abs: f64,
    confirmed_qty: f64,
    cost: f64,
    first_date: Option<NaiveDateTime>,
    last_date: Option<NaiveDateTime>,
    /// (station, occurrences) in first-seen order.
    stations: Vec<(String, usize)>,
    categories: CategoryTotals,
}

impl LineTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: &MaterialLine) {
        self.count += 1;
        if let Some(q) = line.qty {
            self.qty_abs += q.abs();
        }
        if let Some(q) = line.confirmed_qty {
            self.confirmed_qty += q;
        }
        let amount = line.amount.unwrap_or(0.0);
        self.cost += amount;

        if let Some(d) = line.date {
            if self.first_date.map_or(true, |f| d < f) {
                self.first_date = Some(d);
            }
            if self.last_date.map_or(true, |l| d > l) {
                self.last_date = Some(d);
            }
        }

        if let Some(station) = line.station.as_deref() {
            match self.stations.iter_mut().find(|(s, _)| s == station) {
                Some((_, n)) => *n += 1,
                None => self.stations.push((station.to_string(), 1)),
            }
        }

        match line.category {
            Some(MaterialCategory::Consumable) => {
                self.categories.consumable_parts_count += 1;
                self.categories.consumable_cost += amount;
            }
            Some(MaterialCategory::Rotable) => {
                self.categories.rotable_parts_count += 1;
                self.categories.rotable_cost += amount;
            }
            None => {}
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Statistical mode of the station column; the earliest-seen value wins ties.
    pub fn dominant_station(&self) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for (station, n) in &self.stations {
            if best.map_or(true, |(_, b)| *n > b) {
                best = Some((station, *n));
            }
        }
        best.map(|(s, _)| s)
    }

    fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.cost / self.count as f64
        }
    }

    pub fn into_summary(self, wpno_i: String) -> MaterialSummary {
        MaterialSummary {
            avg_unit_cost: self.avg(),
            wpno_i,
            part_count: self.count,
            total_quantity: self.qty_abs,
            total_confirmed_quantity: self.confirmed_qty,
            total_cost: self.cost,
        }
    }

    pub fn into_matched(self, wpno_i: String, matched_by: MatchMethod) -> MatchedConsumption {
        MatchedConsumption {
            avg_price: self.avg(),
            station: self.dominant_station().map(String::from),
            wpno_i,
            parts_count: self.count,
            qty: self.qty_abs,
            cost: self.cost,
            start_date: self.first_date,
            end_date: self.last_date,
            matched_by,
            categories: self.categories,
        }
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Tally lines by work package key. Lines without a key are skipped.
pub fn tally_by_work_package<'a, I>(lines: I) -> BTreeMap<String, LineTally>
where
    I: IntoIterator<Item = &'a MaterialLine>,
{
    let mut groups: BTreeMap<String, LineTally> = BTreeMap::new();
    for line in lines {
        let Some(key) = line.work_package_key() else {
            continue;
        };
        groups.entry(key.to_string()).or_default().push(line);
    }
    groups
}

/// One summary row per distinct work package key, ordered by key.
pub fn aggregate_by_work_package(lines: &[MaterialLine]) -> Vec<MaterialSummary> {
    tally_by_work_package(lines)
        .into_iter()
        .map(|(key, tally)| tally.into_summary(key))
        .collect()
}
