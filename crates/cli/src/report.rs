//! `matplan master`, `stats`, `stations`, `trend`, `parts`.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use serde::Serialize;

use matplan_recon::analysis::{PartStatus, Period};
use matplan_recon::model::MatchMethod;
use matplan_recon::ReconError;

use crate::inputs;
use crate::util::{format_currency, format_number, format_pct, pad_right};
use crate::CliError;

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let s = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
    println!("{s}");
    Ok(())
}

// ============================================================================
// master
// ============================================================================

pub fn cmd_master(config: PathBuf, json: bool, output: Option<PathBuf>) -> Result<(), CliError> {
    let session = inputs::open(&config)?;
    let view = session.dashboard.require_master_view()?;

    if let Some(path) = &output {
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        let file = File::create(path).map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
        if is_csv {
            matplan_io::write_master_csv(view, BufWriter::new(file))?;
        } else {
            serde_json::to_writer_pretty(BufWriter::new(file), view)
                .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
        }
        eprintln!("wrote {}", path.display());
    }

    if json {
        print_json(view)?;
    }

    // Human summary to stderr
    for fp in &session.fingerprints {
        eprintln!("  {:<17} {:>6} rows  {}", fp.kind.to_string(), fp.rows, fp.path);
    }
    let (direct, heuristic) = view.rows.iter().filter_map(|r| r.matched_by()).fold((0, 0), |(d, h), m| match m {
        MatchMethod::Direct => (d + 1, h),
        MatchMethod::Heuristic => (d, h + 1),
    });
    eprintln!(
        "{}: {} work packages, {} C-checks; consumption matched {} DIRECT, {} HEURISTIC",
        session.dashboard.config().name,
        view.len(),
        view.c_checks().count(),
        direct,
        heuristic,
    );
    Ok(())
}

// ============================================================================
// stats
// ============================================================================

pub fn cmd_stats(config: PathBuf, json: bool) -> Result<(), CliError> {
    let session = inputs::open(&config)?;
    let completeness = session.dashboard.completeness();
    let categories = session.dashboard.consumption_by_category();

    if json {
        return print_json(&serde_json::json!({
            "completeness": completeness,
            "categories": categories,
        }));
    }

    match &completeness {
        Some(c) => {
            println!("Data completeness");
            println!("  work packages           {}", c.total_workpackages);
            println!("  C-checks                {}", c.c_checks);
            println!("  with utilization        {}", format_pct(c.with_utilization_pct));
            println!("  with consumption        {}", format_pct(c.with_consumption_pct));
            println!("  with planned material   {}", format_pct(c.with_planned_pct));
            println!("  C-checks w/ consumption {}", c.c_checks_with_consumption);
            println!("  C-checks w/ planned     {}", c.c_checks_with_planned);
        }
        None => println!("Data completeness: work package data unavailable"),
    }

    println!();
    match &categories {
        Some(s) => {
            println!("Consumption ({} records)", s.total_records);
            for (label, b) in [("consumable", &s.consumable), ("rotable", &s.rotable)] {
                println!(
                    "  {:<10} {:>7} records  qty {:>7}  cost {:>8}",
                    label,
                    b.records,
                    format_number(Some(b.qty)),
                    format_currency(Some(b.cost)),
                );
            }
            let modes: Vec<String> = s.voucher_modes.iter().map(|(m, n)| format!("{m}={n}")).collect();
            println!("  voucher modes  {}", modes.join(" "));
            println!(
                "  work package key  {} with, {} without",
                s.with_workpackage_key, s.without_workpackage_key
            );
            println!(
                "  matched work packages  {} DIRECT, {} HEURISTIC",
                s.matched_direct, s.matched_heuristic
            );
        }
        None => println!("Consumption: consumption data unavailable"),
    }
    Ok(())
}

// ============================================================================
// stations / trend
// ============================================================================

pub fn cmd_stations(config: PathBuf, json: bool) -> Result<(), CliError> {
    let session = inputs::open(&config)?;
    let stations = session
        .dashboard
        .station_performance()
        .ok_or(ReconError::Unavailable("work package"))?;

    if json {
        return print_json(&stations);
    }
    if stations.is_empty() {
        eprintln!("no C-checks with planning accuracy or consumption");
        return Ok(());
    }
    println!("{}  checks  accuracy  avg cost  avg parts  avg days", pad_right("station", 10));
    for s in &stations {
        println!(
            "{}  {:>6}  {:>8}  {:>8}  {:>9}  {:>8}",
            pad_right(&s.station, 10),
            s.checks,
            format_pct(s.mean_accuracy),
            format_currency(s.mean_consumed_cost),
            format_number(s.mean_consumed_parts),
            s.mean_duration_days.map_or_else(|| "N/A".to_string(), |d| format!("{d:.1}")),
        );
    }
    Ok(())
}

pub fn cmd_trend(config: PathBuf, period: Period, json: bool) -> Result<(), CliError> {
    let session = inputs::open(&config)?;
    let points = session
        .dashboard
        .accuracy_trend(period)
        .ok_or(ReconError::Unavailable("work package"))?;

    if json {
        return print_json(&points);
    }
    if points.is_empty() {
        eprintln!("no dated C-checks with planning accuracy");
        return Ok(());
    }
    for p in &points {
        println!("{:<8}  {:>7}  ({} checks)", p.period, format_pct(Some(p.mean_accuracy)), p.checks);
    }
    Ok(())
}

// ============================================================================
// parts
// ============================================================================

pub fn cmd_parts(config: PathBuf, wp: String, json: bool) -> Result<(), CliError> {
    let key = wp.trim();
    if key.is_empty() {
        return Err(CliError::args("--wp must not be empty"));
    }
    let session = inputs::open(&config)?;
    let report = session
        .dashboard
        .compare_parts(key)
        .ok_or_else(|| CliError::io("neither planned nor consumption data is configured"))?;

    if json {
        return print_json(&report);
    }

    let s = &report.summary;
    println!(
        "work package {}: {} planned parts, {} consumed parts ({} both, {} planned only, {} unplanned)",
        report.wpno_i, s.planned_parts, s.consumed_parts, s.both, s.planned_only, s.unplanned_use
    );
    for p in &report.parts {
        println!(
            "  {}  planned {:>6}  used {:>6}  var {:>7}  cost var {:>8}  {}",
            pad_right(&p.partno, 18),
            format_number(Some(p.planned_qty)),
            format_number(Some(p.consumed_qty)),
            format_number(Some(p.qty_variance)),
            format_currency(Some(p.cost_variance)),
            match p.status {
                PartStatus::Both => "both",
                PartStatus::PlannedOnly => "planned only",
                PartStatus::UnplannedUse => "unplanned use",
            },
        );
    }
    Ok(())
}
