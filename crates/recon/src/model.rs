use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A scheduled maintenance event (C-check, EOL or bridging task).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkPackage {
    /// Join key shared with consumption and planned material (`wpno_i`).
    pub wpno_i: Option<String>,
    /// Human-readable work package number (`wpno`).
    pub wpno: Option<String>,
    pub ac_registr: Option<String>,
    pub ac_typ: Option<String>,
    pub station: Option<String>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub is_c_check: bool,
    pub is_eol: bool,
    pub is_bridging_task: bool,
    pub check_type: Option<String>,
}

impl WorkPackage {
    /// Length of the work package window in fractional days.
    pub fn duration_days(&self) -> Option<f64> {
        let (start, end) = (self.start_date?, self.end_date?);
        Some((end - start).num_seconds() as f64 / 86_400.0)
    }

    /// Both ends of the window, if known.
    pub fn window(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((self.start_date?, self.end_date?))
    }
}

/// Cumulative hours/cycles reading for one aircraft at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UtilizationSnapshot {
    pub ac_registr: Option<String>,
    pub date: Option<NaiveDateTime>,
    /// Total aircraft hours (`tah`).
    pub hours: Option<f64>,
    /// Total aircraft cycles (`tac`).
    pub cycles: Option<f64>,
}

/// Material category derived from the voucher mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialCategory {
    Consumable,
    Rotable,
}

impl std::fmt::Display for MaterialCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Consumable => write!(f, "consumable"),
            Self::Rotable => write!(f, "rotable"),
        }
    }
}

/// One consumption or planned-material line.
///
/// `amount` is already an extended total for the line, never a unit price.
/// Consumption quantities are signed: negative = issued, positive = returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialLine {
    pub partno: Option<String>,
    pub qty: Option<f64>,
    pub confirmed_qty: Option<f64>,
    pub amount: Option<f64>,
    pub wpno_i: Option<String>,
    pub station: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub ac_registr: Option<String>,
    pub receiver: Option<String>,
    /// Voucher mode (`vm`), e.g. AA, EA, YA.
    pub voucher: Option<String>,
    /// Filled in from the voucher mode when consumption is classified.
    pub category: Option<MaterialCategory>,
    pub description: Option<String>,
    pub ata_chapter: Option<String>,
}

impl MaterialLine {
    /// Work package key, treating blank strings as missing.
    pub fn work_package_key(&self) -> Option<&str> {
        self.wpno_i.as_deref().filter(|k| !k.is_empty())
    }
}

/// The four input tables. Any of them may be unavailable.
#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    pub workpacks: Option<Vec<WorkPackage>>,
    pub utilization: Option<Vec<UtilizationSnapshot>>,
    pub consumption: Option<Vec<MaterialLine>>,
    pub planned: Option<Vec<MaterialLine>>,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Per-work-package summary of material lines sharing the same key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSummary {
    pub wpno_i: String,
    pub part_count: usize,
    /// Sum of |qty|.
    pub total_quantity: f64,
    pub total_confirmed_quantity: f64,
    pub total_cost: f64,
    pub avg_unit_cost: f64,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchMethod {
    /// Line carried the work package key.
    Direct,
    /// Time window + station + aircraft/receiver.
    Heuristic,
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "DIRECT"),
            Self::Heuristic => write!(f, "HEURISTIC"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub consumable_parts_count: usize,
    pub rotable_parts_count: usize,
    pub consumable_cost: f64,
    pub rotable_cost: f64,
}

/// Consumption attributed to one work package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedConsumption {
    pub wpno_i: String,
    pub parts_count: usize,
    /// Sum of |qty|, never negative.
    pub qty: f64,
    pub cost: f64,
    pub avg_price: f64,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    /// Most frequent station, first occurrence wins ties.
    pub station: Option<String>,
    pub matched_by: MatchMethod,
    #[serde(flatten)]
    pub categories: CategoryTotals,
}

#[derive(Debug, Clone, Default)]
pub struct MatchOutput {
    /// DIRECT rows first (work package order), then HEURISTIC rows.
    pub matched: Vec<MatchedConsumption>,
    pub keyed_lines: usize,
    pub unkeyed_lines: usize,
    /// Keyed lines whose key names no work package.
    pub orphan_keyed_lines: usize,
    /// Unkeyed lines claimed by more than one work package.
    pub shared_lines: usize,
}

// ---------------------------------------------------------------------------
// Master view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationReading {
    pub snapshot_date: Option<NaiveDateTime>,
    pub hours: Option<f64>,
    pub cycles: Option<f64>,
    pub hours_per_cycle: Option<f64>,
}

/// One work package enriched with utilization, consumption and plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterRecord {
    pub work_package: WorkPackage,
    pub duration_days: Option<f64>,
    pub utilization: Option<UtilizationReading>,
    pub consumption: Option<MatchedConsumption>,
    pub consumption_validated: bool,
    pub planned: Option<MaterialSummary>,
    pub parts_variance: Option<i64>,
    pub qty_variance: Option<f64>,
    pub cost_variance: Option<f64>,
    pub planning_accuracy: Option<f64>,
}

impl MasterRecord {
    pub fn key(&self) -> Option<&str> {
        self.work_package.wpno_i.as_deref()
    }

    pub fn aircraft_hours(&self) -> Option<f64> {
        self.utilization.as_ref().and_then(|u| u.hours)
    }

    pub fn aircraft_cycles(&self) -> Option<f64> {
        self.utilization.as_ref().and_then(|u| u.cycles)
    }

    pub fn hours_per_cycle(&self) -> Option<f64> {
        self.utilization.as_ref().and_then(|u| u.hours_per_cycle)
    }

    pub fn consumed_parts_count(&self) -> Option<usize> {
        self.consumption.as_ref().map(|c| c.parts_count)
    }

    pub fn consumed_qty(&self) -> Option<f64> {
        self.consumption.as_ref().map(|c| c.qty)
    }

    pub fn consumed_cost(&self) -> Option<f64> {
        self.consumption.as_ref().map(|c| c.cost)
    }

    pub fn matched_by(&self) -> Option<MatchMethod> {
        self.consumption.as_ref().map(|c| c.matched_by)
    }

    pub fn planned_parts_count(&self) -> Option<usize> {
        self.planned.as_ref().map(|p| p.part_count)
    }

    pub fn planned_qty(&self) -> Option<f64> {
        self.planned.as_ref().map(|p| p.total_quantity)
    }

    pub fn planned_cost(&self) -> Option<f64> {
        self.planned.as_ref().map(|p| p.total_cost)
    }

    pub fn planned_confirmed_qty(&self) -> Option<f64> {
        self.planned.as_ref().map(|p| p.total_confirmed_quantity)
    }

    pub fn planned_avg_price(&self) -> Option<f64> {
        self.planned.as_ref().map(|p| p.avg_unit_cost)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterView {
    pub rows: Vec<MasterRecord>,
}

impl MasterView {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn c_checks(&self) -> impl Iterator<Item = &MasterRecord> {
        self.rows.iter().filter(|r| r.work_package.is_c_check)
    }

    pub fn find(&self, wpno_i: &str) -> Option<&MasterRecord> {
        self.rows.iter().find(|r| r.key() == Some(wpno_i))
    }
}
