use std::path::PathBuf;

use matplan_io::{load_sources, write_master_csv, LoadError, TableKind};
use matplan_recon::{Dashboard, MatchMethod, MatplanConfig};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture_config() -> MatplanConfig {
    let toml = std::fs::read_to_string(fixtures_dir().join("matplan.toml")).unwrap();
    MatplanConfig::from_toml(&toml).unwrap()
}

fn fixture_dashboard() -> Dashboard {
    let config = fixture_config();
    let loaded = load_sources(&config, &fixtures_dir()).unwrap();
    Dashboard::new(loaded.tables, config)
}

#[test]
fn loads_all_four_tables() {
    let config = fixture_config();
    let loaded = load_sources(&config, &fixtures_dir()).unwrap();
    assert_eq!(loaded.tables.workpacks.as_ref().map(Vec::len), Some(4));
    assert_eq!(loaded.tables.utilization.as_ref().map(Vec::len), Some(4));
    assert_eq!(loaded.tables.consumption.as_ref().map(Vec::len), Some(7));
    assert_eq!(loaded.tables.planned.as_ref().map(Vec::len), Some(5));

    let kinds: Vec<TableKind> = loaded.fingerprints.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, TableKind::ALL.to_vec());
    assert!(loaded.fingerprints.iter().all(|f| f.sha256.len() == "sha256:".len() + 64));
}

#[test]
fn heuristic_match_narrows_by_registration() {
    let dash = fixture_dashboard();
    let view = dash.master_view().unwrap();
    let row = view.find("1001").unwrap();
    // the rotable line only names the aircraft in its receiver, and a line
    // with a matching registration exists
    assert_eq!(row.matched_by(), Some(MatchMethod::Heuristic));
    assert_eq!(row.consumed_parts_count(), Some(1));
    assert_eq!(row.consumed_qty(), Some(3.0));
    assert_eq!(row.consumed_cost(), Some(150.0));
    assert_eq!(row.planning_accuracy, Some(100.0));
    assert_eq!(row.hours_per_cycle(), Some(2.0));
}

#[test]
fn direct_match_with_variances() {
    let dash = fixture_dashboard();
    let view = dash.master_view().unwrap();
    let row = view.find("1002").unwrap();
    assert_eq!(row.matched_by(), Some(MatchMethod::Direct));
    assert_eq!(row.consumed_parts_count(), Some(3));
    assert_eq!(row.consumed_qty(), Some(6.0));
    assert_eq!(row.consumed_cost(), Some(30.0));
    assert_eq!(row.planned_parts_count(), Some(4));
    assert_eq!(row.planned_confirmed_qty(), Some(4.0));
    assert_eq!(row.parts_variance, Some(-1));
    assert_eq!(row.qty_variance, Some(1.0));
    assert_eq!(row.cost_variance, Some(-125.0));
    assert_eq!(row.planning_accuracy, Some(75.0));
    // zero cycles
    assert_eq!(row.aircraft_hours(), Some(20_000.0));
    assert_eq!(row.hours_per_cycle(), None);
}

#[test]
fn unmatched_rows_stay_empty() {
    let dash = fixture_dashboard();
    let view = dash.master_view().unwrap();

    let untracked = view.find("1003").unwrap();
    assert!(untracked.consumption.is_none());
    // only snapshot is after the start date
    assert_eq!(untracked.aircraft_hours(), Some(10_000.0));

    let no_start = view.find("1004").unwrap();
    assert!(no_start.consumption.is_none());
    assert!(no_start.utilization.is_none());
    assert_eq!(no_start.duration_days, None);
}

#[test]
fn statistics_over_fixtures() {
    let dash = fixture_dashboard();

    let completeness = dash.completeness().unwrap();
    assert_eq!(completeness.total_workpackages, 4);
    assert_eq!(completeness.c_checks, 3);
    assert_eq!(completeness.with_utilization_pct, Some(75.0));
    assert_eq!(completeness.with_consumption_pct, Some(50.0));
    assert_eq!(completeness.with_planned_pct, Some(50.0));
    assert_eq!(completeness.c_checks_with_consumption, 2);

    let cats = dash.consumption_by_category().unwrap();
    assert_eq!(cats.total_records, 6);
    assert_eq!(cats.consumable.records, 5);
    assert_eq!(cats.rotable.records, 1);
    assert_eq!(cats.with_workpackage_key, 3);
    assert_eq!(cats.without_workpackage_key, 3);
    assert_eq!(cats.matched_direct, 1);
    assert_eq!(cats.matched_heuristic, 1);
}

#[test]
fn master_csv_export() {
    let dash = fixture_dashboard();
    let mut buf = Vec::new();
    write_master_csv(dash.master_view().unwrap(), &mut buf).unwrap();

    let mut reader = csv::Reader::from_reader(buf.as_slice());
    let headers = reader.headers().unwrap().clone();
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 4);

    let col = |name: &str| headers.iter().position(|h| h == name).unwrap();
    assert_eq!(&records[0][col("wpno_i")], "1001");
    assert_eq!(&records[0][col("consumption_matched_by")], "HEURISTIC");
    assert_eq!(&records[1][col("planning_accuracy")], "75");
    assert_eq!(&records[3][col("consumed_parts_count")], "");
}

#[test]
fn missing_work_package_file_fails() {
    let mut config = fixture_config();
    config.tables.workpacks = Some("nope.csv".into());
    let err = load_sources(&config, &fixtures_dir()).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
    assert!(err.to_string().contains("nope.csv"));
}

#[test]
fn missing_optional_file_is_a_warning() {
    let mut config = fixture_config();
    config.tables.utilization = Some("nope.csv".into());
    let loaded = load_sources(&config, &fixtures_dir()).unwrap();
    assert!(loaded.tables.utilization.is_none());
    assert!(loaded.tables.consumption.is_some());
    assert_eq!(loaded.warnings.len(), 1);
    assert!(loaded.warnings[0].to_string().contains("nope.csv"));
}

#[test]
fn planned_table_without_qty_leaves_view_unplanned() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("planned.csv"), "wpno_i,partno\n1002,P-300\n").unwrap();

    let mut config = fixture_config();
    let fixtures = fixtures_dir();
    for file in [
        &mut config.tables.workpacks,
        &mut config.tables.utilization,
        &mut config.tables.consumption,
    ] {
        *file = file.as_deref().map(|f| fixtures.join(f).display().to_string());
    }

    let loaded = load_sources(&config, dir.path()).unwrap();
    assert!(loaded.tables.planned.is_none());
    assert!(matches!(
        loaded.warnings.as_slice(),
        [LoadError::MissingColumns { kind: TableKind::Planned, .. }]
    ));
    assert_eq!(loaded.fingerprints.len(), 3);

    let dash = Dashboard::new(loaded.tables, config);
    let view = dash.master_view().unwrap();
    assert_eq!(view.len(), 4);
    assert!(view.rows.iter().all(|r| r.planned.is_none()));
    assert!(view.find("1002").unwrap().consumption.is_some());
}
