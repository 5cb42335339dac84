use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{MasterView, MatchMethod, MaterialCategory, MaterialLine};

// ---------------------------------------------------------------------------
// Completeness
// ---------------------------------------------------------------------------

/// How much of the work package table could be enriched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletenessStats {
    pub total_workpackages: usize,
    pub c_checks: usize,
    pub with_utilization_pct: Option<f64>,
    pub with_consumption_pct: Option<f64>,
    pub with_planned_pct: Option<f64>,
    pub c_checks_with_consumption: usize,
    pub c_checks_with_planned: usize,
}

fn pct(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64 * 100.0)
}

pub fn completeness(view: &MasterView) -> CompletenessStats {
    let total = view.len();
    let with_util = view.rows.iter().filter(|r| r.aircraft_hours().is_some()).count();
    let with_cons = view.rows.iter().filter(|r| r.consumption.is_some()).count();
    let with_plan = view.rows.iter().filter(|r| r.planned.is_some()).count();

    CompletenessStats {
        total_workpackages: total,
        c_checks: view.c_checks().count(),
        with_utilization_pct: pct(with_util, total),
        with_consumption_pct: pct(with_cons, total),
        with_planned_pct: pct(with_plan, total),
        c_checks_with_consumption: view.c_checks().filter(|r| r.consumption.is_some()).count(),
        c_checks_with_planned: view.c_checks().filter(|r| r.planned.is_some()).count(),
    }
}

// ---------------------------------------------------------------------------
// Consumption by category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub records: usize,
    pub cost: f64,
    /// Sum of |qty|.
    pub qty: f64,
}

impl CategoryBreakdown {
    fn push(&mut self, line: &MaterialLine) {
        self.records += 1;
        self.cost += line.amount.unwrap_or(0.0);
        self.qty += line.qty.map_or(0.0, f64::abs);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryStats {
    pub total_records: usize,
    pub consumable: CategoryBreakdown,
    pub rotable: CategoryBreakdown,
    /// Records per voucher mode; lines without one are counted under "".
    pub voucher_modes: BTreeMap<String, usize>,
    pub with_workpackage_key: usize,
    pub without_workpackage_key: usize,
    pub matched_direct: usize,
    pub matched_heuristic: usize,
}

/// Consumable vs rotable breakdown over classified consumption lines, plus
/// match-method counts from the master view.
pub fn consumption_by_category(lines: &[MaterialLine], view: Option<&MasterView>) -> CategoryStats {
    let mut stats = CategoryStats {
        total_records: lines.len(),
        ..Default::default()
    };

    for line in lines {
        match line.category {
            Some(MaterialCategory::Consumable) => stats.consumable.push(line),
            Some(MaterialCategory::Rotable) => stats.rotable.push(line),
            None => {}
        }
        let mode = line.voucher.as_deref().unwrap_or("").to_string();
        *stats.voucher_modes.entry(mode).or_default() += 1;
        if line.work_package_key().is_some() {
            stats.with_workpackage_key += 1;
        } else {
            stats.without_workpackage_key += 1;
        }
    }

    if let Some(view) = view {
        for method in view.rows.iter().filter_map(|r| r.matched_by()) {
            match method {
                MatchMethod::Direct => stats.matched_direct += 1,
                MatchMethod::Heuristic => stats.matched_heuristic += 1,
            }
        }
    }

    stats
}
