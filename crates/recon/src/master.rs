use std::collections::HashMap;

use crate::aggregate::aggregate_by_work_package;
use crate::config::MatplanConfig;
use crate::matcher::match_consumption;
use crate::model::{
    MasterRecord, MasterView, MatchOutput, MatchedConsumption, MaterialLine, MaterialSummary,
    SourceTables, WorkPackage,
};
use crate::utilization::UtilizationIndex;
use crate::voucher::classify_consumption;

/// Join work packages with utilization, matched consumption and planned
/// material. Returns `None` when the work package table is unavailable.
///
/// Every work package yields exactly one row, in input order.
pub fn build_master_view(tables: &SourceTables, config: &MatplanConfig) -> Option<MasterView> {
    let workpacks = tables.workpacks.as_deref()?;

    let tracked = tables
        .consumption
        .as_deref()
        .map(|lines| classify_consumption(lines, &config.vouchers));
    let matches = tracked
        .as_deref()
        .map(|lines| match_consumption(workpacks, lines, config.matching.overlap));

    Some(assemble(workpacks, tables, matches.as_ref()))
}

/// Build rows from an already computed match output.
pub(crate) fn assemble(
    workpacks: &[WorkPackage],
    tables: &SourceTables,
    matches: Option<&MatchOutput>,
) -> MasterView {
    let util_index = tables.utilization.as_deref().map(UtilizationIndex::new);

    let consumption_by_key: HashMap<&str, &MatchedConsumption> = matches
        .map(|m| m.matched.iter().map(|c| (c.wpno_i.as_str(), c)).collect())
        .unwrap_or_default();

    let planned: Vec<MaterialSummary> = tables
        .planned
        .as_deref()
        .map(aggregate_by_work_package)
        .unwrap_or_default();
    let planned_by_key: HashMap<&str, &MaterialSummary> =
        planned.iter().map(|p| (p.wpno_i.as_str(), p)).collect();

    let rows: Vec<MasterRecord> = workpacks
        .iter()
        .map(|wp| {
            let key = wp.wpno_i.as_deref();
            let consumption = key.and_then(|k| consumption_by_key.get(k)).map(|c| (*c).clone());
            let planned = key.and_then(|k| planned_by_key.get(k)).map(|p| (*p).clone());
            let utilization = util_index.as_ref().and_then(|idx| idx.reading_for(wp));
            derive_record(wp.clone(), utilization, consumption, planned)
        })
        .collect();

    log::info!(
        "master view: {} work packages, {} with consumption, {} with plan",
        rows.len(),
        rows.iter().filter(|r| r.consumption.is_some()).count(),
        rows.iter().filter(|r| r.planned.is_some()).count(),
    );

    MasterView { rows }
}

fn derive_record(
    work_package: WorkPackage,
    utilization: Option<crate::model::UtilizationReading>,
    consumption: Option<MatchedConsumption>,
    planned: Option<MaterialSummary>,
) -> MasterRecord {
    let (parts_variance, qty_variance, cost_variance) = match (&consumption, &planned) {
        (Some(c), Some(p)) => (
            Some(c.parts_count as i64 - p.part_count as i64),
            Some(c.qty - p.total_quantity),
            Some(c.cost - p.total_cost),
        ),
        _ => (None, None, None),
    };

    let planning_accuracy = match (parts_variance, &planned) {
        (Some(variance), Some(p)) => planning_accuracy(variance, p.part_count),
        _ => None,
    };

    MasterRecord {
        duration_days: work_package.duration_days(),
        consumption_validated: consumption.is_some(),
        work_package,
        utilization,
        consumption,
        planned,
        parts_variance,
        qty_variance,
        cost_variance,
        planning_accuracy,
    }
}

/// `(1 - |variance| / planned) * 100`, undefined for an empty plan.
pub fn planning_accuracy(parts_variance: i64, planned_parts: usize) -> Option<f64> {
    if planned_parts == 0 {
        return None;
    }
    Some((1.0 - parts_variance.unsigned_abs() as f64 / planned_parts as f64) * 100.0)
}

/// Classified consumption lines (voucher filter applied), for callers that
/// need line-level detail alongside the master view.
pub fn tracked_consumption(tables: &SourceTables, config: &MatplanConfig) -> Option<Vec<MaterialLine>> {
    tables
        .consumption
        .as_deref()
        .map(|lines| classify_consumption(lines, &config.vouchers))
}

impl MasterView {
    pub fn to_json_pretty(&self) -> Result<String, crate::error::ReconError> {
        serde_json::to_string_pretty(self).map_err(|e| crate::error::ReconError::Serialize(e.to_string()))
    }
}
