use std::sync::OnceLock;

use crate::analysis::{self, Period, PartsReport, StationPerformance, TrendPoint};
use crate::config::MatplanConfig;
use crate::error::ReconError;
use crate::matcher::match_consumption;
use crate::master;
use crate::model::{MasterView, MatchOutput, MaterialLine, SourceTables};
use crate::stats::{self, CategoryStats, CompletenessStats};

/// Owns the immutable input tables and memoizes everything derived from them.
///
/// The first call that needs the master view builds it; every later call
/// returns the same value.
pub struct Dashboard {
    tables: SourceTables,
    config: MatplanConfig,
    tracked: OnceLock<Option<Vec<MaterialLine>>>,
    matches: OnceLock<Option<MatchOutput>>,
    view: OnceLock<Option<MasterView>>,
}

impl Dashboard {
    pub fn new(tables: SourceTables, config: MatplanConfig) -> Self {
        Self {
            tables,
            config,
            tracked: OnceLock::new(),
            matches: OnceLock::new(),
            view: OnceLock::new(),
        }
    }

    pub fn tables(&self) -> &SourceTables {
        &self.tables
    }

    pub fn config(&self) -> &MatplanConfig {
        &self.config
    }

    /// Consumption lines after the voucher filter.
    pub fn tracked_consumption(&self) -> Option<&[MaterialLine]> {
        self.tracked
            .get_or_init(|| master::tracked_consumption(&self.tables, &self.config))
            .as_deref()
    }

    pub fn match_output(&self) -> Option<&MatchOutput> {
        self.matches
            .get_or_init(|| {
                let workpacks = self.tables.workpacks.as_deref()?;
                let lines = self.tracked_consumption()?;
                Some(match_consumption(workpacks, lines, self.config.matching.overlap))
            })
            .as_ref()
    }

    pub fn master_view(&self) -> Option<&MasterView> {
        self.view
            .get_or_init(|| {
                let workpacks = self.tables.workpacks.as_deref()?;
                Some(master::assemble(workpacks, &self.tables, self.match_output()))
            })
            .as_ref()
    }

    /// Like [`Dashboard::master_view`], but reports a missing table as an error.
    pub fn require_master_view(&self) -> Result<&MasterView, ReconError> {
        self.master_view().ok_or(ReconError::Unavailable("work package"))
    }

    pub fn completeness(&self) -> Option<CompletenessStats> {
        self.master_view().map(stats::completeness)
    }

    /// Absent when no tracked consumption lines are loaded.
    pub fn consumption_by_category(&self) -> Option<CategoryStats> {
        let lines = self.tracked_consumption().filter(|lines| !lines.is_empty())?;
        Some(stats::consumption_by_category(lines, self.master_view()))
    }

    pub fn station_performance(&self) -> Option<Vec<StationPerformance>> {
        self.master_view().map(analysis::station_performance)
    }

    pub fn accuracy_trend(&self, period: Period) -> Option<Vec<TrendPoint>> {
        self.master_view().map(|v| analysis::accuracy_trend(v, period))
    }

    /// Part-level comparison for one work package. Absent when neither
    /// planned nor consumption data is loaded.
    pub fn compare_parts(&self, wpno_i: &str) -> Option<PartsReport> {
        let planned = self.tables.planned.as_deref();
        let consumed = self.tracked_consumption();
        if planned.is_none() && consumed.is_none() {
            return None;
        }
        Some(analysis::compare_parts(
            planned.unwrap_or_default(),
            consumed.unwrap_or_default(),
            wpno_i,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WorkPackage;

    #[test]
    fn missing_tables_are_unavailable() {
        let dash = Dashboard::new(SourceTables::default(), MatplanConfig::default());
        assert!(dash.master_view().is_none());
        assert!(dash.completeness().is_none());
        assert!(dash.consumption_by_category().is_none());
        assert!(dash.compare_parts("1").is_none());
        assert!(matches!(
            dash.require_master_view(),
            Err(ReconError::Unavailable("work package"))
        ));
    }

    #[test]
    fn master_view_is_memoized() {
        let tables = SourceTables {
            workpacks: Some(vec![WorkPackage {
                wpno_i: Some("1".into()),
                ..Default::default()
            }]),
            consumption: Some(vec![]),
            ..Default::default()
        };
        let dash = Dashboard::new(tables, MatplanConfig::default());
        let a = dash.master_view().unwrap() as *const MasterView;
        let b = dash.master_view().unwrap() as *const MasterView;
        assert_eq!(a, b);
        assert_eq!(dash.completeness().unwrap().total_workpackages, 1);
        // an empty consumption table reports no categories
        assert!(dash.consumption_by_category().is_none());
    }
}
