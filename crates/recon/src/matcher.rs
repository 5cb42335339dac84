use std::collections::HashSet;

use crate::aggregate::{tally_by_work_package, LineTally};
use crate::config::OverlapPolicy;
use crate::model::{MatchMethod, MatchOutput, MaterialLine, WorkPackage};

/// Attribute consumption lines to work packages.
///
/// Lines carrying a work package key are grouped by that key (DIRECT).
/// Work packages left without a DIRECT match are then matched against the
/// unkeyed lines, in table order, by time window + station, narrowed by
/// aircraft registration or receiver (HEURISTIC).
pub fn match_consumption(
    work_packages: &[WorkPackage],
    lines: &[MaterialLine],
    overlap: OverlapPolicy,
) -> MatchOutput {
    let (keyed, unkeyed): (Vec<&MaterialLine>, Vec<&MaterialLine>) =
        lines.iter().partition(|l| l.work_package_key().is_some());

    let mut out = MatchOutput {
        keyed_lines: keyed.len(),
        unkeyed_lines: unkeyed.len(),
        ..Default::default()
    };

    // Pass 1: direct key
    let mut direct = tally_by_work_package(keyed.iter().copied());
    let mut satisfied: HashSet<String> = HashSet::new();

    for wp in work_packages {
        let Some(key) = wp.wpno_i.as_deref() else {
            continue;
        };
        if let Some(tally) = direct.remove(key) {
            satisfied.insert(key.to_string());
            out.matched.push(tally.into_matched(key.to_string(), MatchMethod::Direct));
        }
    }
    out.orphan_keyed_lines = direct.values().map(LineTally::count).sum();

    // Pass 2: time window + station + aircraft
    let mut claims = vec![0usize; unkeyed.len()];

    if !unkeyed.is_empty() {
        for wp in work_packages {
            let Some(key) = wp.wpno_i.as_deref() else {
                continue;
            };
            if satisfied.contains(key) {
                continue;
            }

            let candidates = heuristic_candidates(wp, &unkeyed, &claims, overlap);
            if candidates.is_empty() {
                continue;
            }

            let mut tally = LineTally::new();
            for &i in &candidates {
                tally.push(unkeyed[i]);
                claims[i] += 1;
            }
            satisfied.insert(key.to_string());
            out.matched.push(tally.into_matched(key.to_string(), MatchMethod::Heuristic));
        }
    }

    out.shared_lines = claims.iter().filter(|&&n| n > 1).count();

    log::debug!(
        "matched {} work packages ({} keyed lines, {} unkeyed, {} orphan keyed, {} shared)",
        out.matched.len(),
        out.keyed_lines,
        out.unkeyed_lines,
        out.orphan_keyed_lines,
        out.shared_lines,
    );
    if out.shared_lines > 0 {
        log::warn!(
            "{} unkeyed consumption lines fall inside more than one work package window",
            out.shared_lines
        );
    }

    out
}

/// Indices into `unkeyed` that the heuristic attributes to `wp`.
fn heuristic_candidates(
    wp: &WorkPackage,
    unkeyed: &[&MaterialLine],
    claims: &[usize],
    overlap: OverlapPolicy,
) -> Vec<usize> {
    let Some((start, end)) = wp.window() else {
        return Vec::new();
    };
    let Some(station) = wp.station.as_deref() else {
        return Vec::new();
    };

    let in_window: Vec<usize> = unkeyed
        .iter()
        .enumerate()
        .filter(|(i, line)| {
            if overlap == OverlapPolicy::Exclusive && claims[*i] > 0 {
                return false;
            }
            let in_time = line.date.map_or(false, |d| d >= start && d <= end);
            in_time && line.station.as_deref() == Some(station)
        })
        .map(|(i, _)| i)
        .collect();

    let Some(registration) = wp.ac_registr.as_deref().filter(|r| !r.is_empty()) else {
        return in_window;
    };

    let by_aircraft: Vec<usize> = in_window
        .iter()
        .copied()
        .filter(|&i| unkeyed[i].ac_registr.as_deref() == Some(registration))
        .collect();
    if !by_aircraft.is_empty() {
        return by_aircraft;
    }

    let needle = registration.to_lowercase();
    let by_receiver: Vec<usize> = in_window
        .iter()
        .copied()
        .filter(|&i| {
            unkeyed[i]
                .receiver
                .as_deref()
                .map_or(false, |r| r.to_lowercase().contains(&needle))
        })
        .collect();
    if !by_receiver.is_empty() {
        return by_receiver;
    }

    in_window
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(date: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn wp(key: &str, station: &str, start: &str, end: &str, reg: Option<&str>) -> WorkPackage {
        WorkPackage {
            wpno_i: Some(key.into()),
            wpno: Some(format!("WP-{key}")),
            ac_registr: reg.map(String::from),
            station: Some(station.into()),
            start_date: Some(at(start)),
            end_date: Some(at(end)),
            is_c_check: true,
            ..Default::default()
        }
    }

    fn line(key: Option<&str>, station: &str, date: &str, qty: f64, cost: f64) -> MaterialLine {
        MaterialLine {
            partno: Some("P-1".into()),
            wpno_i: key.map(String::from),
            station: Some(station.into()),
            date: Some(at(date)),
            qty: Some(qty),
            amount: Some(cost),
            voucher: Some("AA".into()),
            ..Default::default()
        }
    }

    fn with_reg(mut l: MaterialLine, reg: &str) -> MaterialLine {
        l.ac_registr = Some(reg.into());
        l
    }

    fn with_receiver(mut l: MaterialLine, receiver: &str) -> MaterialLine {
        l.receiver = Some(receiver.into());
        l
    }

    #[test]
    fn heuristic_single_line() {
        let wps = vec![wp("1", "AMS", "2024-01-01", "2024-01-10", Some("SE-ABC"))];
        let lines = vec![with_reg(line(None, "AMS", "2024-01-05", -3.0, 150.0), "SE-ABC")];
        let out = match_consumption(&wps, &lines, OverlapPolicy::Shared);
        assert_eq!(out.matched.len(), 1);
        let m = &out.matched[0];
        assert_eq!(m.wpno_i, "1");
        assert_eq!(m.parts_count, 1);
        assert_eq!(m.qty, 3.0);
        assert_eq!(m.cost, 150.0);
        assert_eq!(m.matched_by, MatchMethod::Heuristic);
        assert_eq!(m.station.as_deref(), Some("AMS"));
    }

    #[test]
    fn heuristic_rejects_other_station() {
        let wps = vec![wp("1", "AMS", "2024-01-01", "2024-01-10", Some("SE-ABC"))];
        let lines = vec![with_reg(line(None, "CPH", "2024-01-05", -3.0, 150.0), "SE-ABC")];
        let out = match_consumption(&wps, &lines, OverlapPolicy::Shared);
        assert!(out.matched.is_empty());
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let wps = vec![wp("1", "AMS", "2024-01-01", "2024-01-10", None)];
        let lines = vec![
            line(None, "AMS", "2024-01-01", -1.0, 1.0),
            line(None, "AMS", "2024-01-10", -1.0, 1.0),
            line(None, "AMS", "2023-12-31", -1.0, 1.0),
            line(None, "AMS", "2024-01-11", -1.0, 1.0),
        ];
        let out = match_consumption(&wps, &lines, OverlapPolicy::Shared);
        assert_eq!(out.matched[0].parts_count, 2);
    }

    #[test]
    fn direct_key_wins_and_excludes_heuristic() {
        let wps = vec![wp("1", "AMS", "2024-01-01", "2024-01-10", None)];
        let lines = vec![
            line(Some("1"), "CPH", "2023-06-01", -2.0, 20.0),
            line(Some("1"), "CPH", "2023-06-02", -1.0, 10.0),
            line(None, "AMS", "2024-01-05", -5.0, 500.0),
        ];
        let out = match_consumption(&wps, &lines, OverlapPolicy::Shared);
        assert_eq!(out.matched.len(), 1);
        assert_eq!(out.matched[0].matched_by, MatchMethod::Direct);
        assert_eq!(out.matched[0].parts_count, 2);
        assert_eq!(out.matched[0].qty, 3.0);
        assert_eq!(out.matched[0].station.as_deref(), Some("CPH"));
    }

    #[test]
    fn orphan_keys_counted_not_matched() {
        let wps = vec![wp("1", "AMS", "2024-01-01", "2024-01-10", None)];
        let lines = vec![
            line(Some("99"), "AMS", "2024-01-05", -1.0, 1.0),
            line(Some("99"), "AMS", "2024-01-06", -1.0, 1.0),
        ];
        let out = match_consumption(&wps, &lines, OverlapPolicy::Shared);
        assert!(out.matched.is_empty());
        assert_eq!(out.orphan_keyed_lines, 2);
        assert_eq!(out.keyed_lines, 2);
        assert_eq!(out.unkeyed_lines, 0);
    }

    #[test]
    fn aircraft_narrowing_prefers_registration() {
        let wps = vec![wp("1", "AMS", "2024-01-01", "2024-01-10", Some("SE-ABC"))];
        let lines = vec![
            with_reg(line(None, "AMS", "2024-01-02", -1.0, 10.0), "SE-ABC"),
            with_reg(line(None, "AMS", "2024-01-03", -1.0, 20.0), "SE-XYZ"),
            line(None, "AMS", "2024-01-04", -1.0, 40.0),
        ];
        let out = match_consumption(&wps, &lines, OverlapPolicy::Shared);
        assert_eq!(out.matched[0].parts_count, 1);
        assert_eq!(out.matched[0].cost, 10.0);
    }

    #[test]
    fn receiver_fallback_is_case_insensitive() {
        let wps = vec![wp("1", "AMS", "2024-01-01", "2024-01-10", Some("SE-ABC"))];
        let lines = vec![
            with_receiver(line(None, "AMS", "2024-01-02", -1.0, 10.0), "hangar 3 / se-abc"),
            with_receiver(line(None, "AMS", "2024-01-03", -1.0, 20.0), "LINE STORE"),
        ];
        let out = match_consumption(&wps, &lines, OverlapPolicy::Shared);
        assert_eq!(out.matched[0].parts_count, 1);
        assert_eq!(out.matched[0].cost, 10.0);
    }

    #[test]
    fn no_aircraft_evidence_keeps_window_set() {
        let wps = vec![wp("1", "AMS", "2024-01-01", "2024-01-10", Some("SE-ABC"))];
        let lines = vec![
            with_reg(line(None, "AMS", "2024-01-02", -1.0, 10.0), "SE-XYZ"),
            with_receiver(line(None, "AMS", "2024-01-03", -1.0, 20.0), "LINE STORE"),
        ];
        let out = match_consumption(&wps, &lines, OverlapPolicy::Shared);
        assert_eq!(out.matched[0].parts_count, 2);
    }

    #[test]
    fn missing_dates_are_unmatchable() {
        let mut open = wp("1", "AMS", "2024-01-01", "2024-01-10", None);
        open.end_date = None;
        let mut undated = line(None, "AMS", "2024-01-05", -1.0, 1.0);
        undated.date = None;
        let wps = vec![open, wp("2", "AMS", "2024-01-01", "2024-01-10", None)];
        let lines = vec![undated, line(None, "AMS", "2024-01-05", -1.0, 1.0)];
        let out = match_consumption(&wps, &lines, OverlapPolicy::Shared);
        assert_eq!(out.matched.len(), 1);
        assert_eq!(out.matched[0].wpno_i, "2");
        assert_eq!(out.matched[0].parts_count, 1);
    }

    #[test]
    fn overlapping_windows_double_count_when_shared() {
        let wps = vec![
            wp("1", "AMS", "2024-01-01", "2024-01-10", Some("SE-ABC")),
            wp("2", "AMS", "2024-01-05", "2024-01-15", Some("SE-ABC")),
        ];
        let lines = vec![with_reg(line(None, "AMS", "2024-01-07", -2.0, 80.0), "SE-ABC")];
        let out = match_consumption(&wps, &lines, OverlapPolicy::Shared);
        assert_eq!(out.matched.len(), 2);
        assert_eq!(out.matched[0].cost, 80.0);
        assert_eq!(out.matched[1].cost, 80.0);
        assert_eq!(out.shared_lines, 1);
    }

    #[test]
    fn overlapping_windows_first_claim_when_exclusive() {
        let wps = vec![
            wp("1", "AMS", "2024-01-01", "2024-01-10", Some("SE-ABC")),
            wp("2", "AMS", "2024-01-05", "2024-01-15", Some("SE-ABC")),
        ];
        let lines = vec![
            with_reg(line(None, "AMS", "2024-01-07", -2.0, 80.0), "SE-ABC"),
            with_reg(line(None, "AMS", "2024-01-12", -1.0, 5.0), "SE-ABC"),
        ];
        let out = match_consumption(&wps, &lines, OverlapPolicy::Exclusive);
        assert_eq!(out.matched.len(), 2);
        assert_eq!(out.matched[0].wpno_i, "1");
        assert_eq!(out.matched[0].cost, 80.0);
        assert_eq!(out.matched[1].wpno_i, "2");
        assert_eq!(out.matched[1].cost, 5.0);
        assert_eq!(out.shared_lines, 0);
    }

    #[test]
    fn duplicate_work_package_key_matched_once() {
        let wps = vec![
            wp("1", "AMS", "2024-01-01", "2024-01-10", None),
            wp("1", "AMS", "2024-01-01", "2024-01-10", None),
        ];
        let lines = vec![line(None, "AMS", "2024-01-05", -1.0, 1.0)];
        let out = match_consumption(&wps, &lines, OverlapPolicy::Shared);
        assert_eq!(out.matched.len(), 1);
    }

    #[test]
    fn direct_rows_precede_heuristic_rows() {
        let wps = vec![
            wp("1", "AMS", "2024-01-01", "2024-01-10", None),
            wp("2", "AMS", "2024-02-01", "2024-02-10", None),
        ];
        let lines = vec![
            line(None, "AMS", "2024-01-05", -1.0, 1.0),
            line(Some("2"), "AMS", "2024-02-05", -1.0, 1.0),
        ];
        let out = match_consumption(&wps, &lines, OverlapPolicy::Shared);
        assert_eq!(out.matched[0].wpno_i, "2");
        assert_eq!(out.matched[0].matched_by, MatchMethod::Direct);
        assert_eq!(out.matched[1].wpno_i, "1");
        assert_eq!(out.matched[1].matched_by, MatchMethod::Heuristic);
    }
}
