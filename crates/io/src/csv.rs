// CSV/TSV import, master view export

use std::io::{Read, Write};
use std::path::Path;

use matplan_recon::model::{MasterRecord, MasterView};

use crate::error::LoadError;
use crate::table::RawTable;

pub fn import(path: &Path) -> Result<RawTable, LoadError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(&content, delimiter).map_err(|e| LoadError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub(crate) fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // lines agreeing with the header's field count, weighted by that count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, LoadError> {
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = std::fs::File::open(path).map_err(io_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(io_err)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // Excel-exported CSVs are commonly Windows-1252
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

pub(crate) fn import_from_string(content: &str, delimiter: u8) -> Result<RawTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(String::from).collect());
    }

    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

pub const MASTER_COLUMNS: &[&str] = &[
    "wpno_i",
    "wpno",
    "ac_registr",
    "ac_typ",
    "station",
    "start_date",
    "end_date",
    "duration_days",
    "is_c_check",
    "is_eol",
    "is_bridging_task",
    "check_type",
    "aircraft_hours",
    "aircraft_cycles",
    "hours_per_cycle",
    "consumed_parts_count",
    "consumed_qty",
    "consumed_cost",
    "consumed_avg_price",
    "consumption_start_date",
    "consumption_end_date",
    "consumption_station",
    "consumption_matched_by",
    "consumable_parts_count",
    "rotable_parts_count",
    "consumable_cost",
    "rotable_cost",
    "consumption_validated",
    "planned_parts_count",
    "planned_qty",
    "planned_confirmed_qty",
    "planned_cost",
    "planned_avg_price",
    "parts_variance",
    "qty_variance",
    "cost_variance",
    "planning_accuracy",
];

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn flag(b: bool) -> String {
    if b { "1" } else { "0" }.to_string()
}

fn stamp(v: Option<chrono::NaiveDateTime>) -> String {
    v.map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string()).unwrap_or_default()
}

fn master_record_fields(r: &MasterRecord) -> Vec<String> {
    let wp = &r.work_package;
    let c = r.consumption.as_ref();
    vec![
        opt(wp.wpno_i.as_deref()),
        opt(wp.wpno.as_deref()),
        opt(wp.ac_registr.as_deref()),
        opt(wp.ac_typ.as_deref()),
        opt(wp.station.as_deref()),
        stamp(wp.start_date),
        stamp(wp.end_date),
        opt(r.duration_days),
        flag(wp.is_c_check),
        flag(wp.is_eol),
        flag(wp.is_bridging_task),
        opt(wp.check_type.as_deref()),
        opt(r.aircraft_hours()),
        opt(r.aircraft_cycles()),
        opt(r.hours_per_cycle()),
        opt(r.consumed_parts_count()),
        opt(r.consumed_qty()),
        opt(r.consumed_cost()),
        opt(c.map(|c| c.avg_price)),
        stamp(c.and_then(|c| c.start_date)),
        stamp(c.and_then(|c| c.end_date)),
        opt(c.and_then(|c| c.station.as_deref())),
        opt(r.matched_by()),
        opt(c.map(|c| c.categories.consumable_parts_count)),
        opt(c.map(|c| c.categories.rotable_parts_count)),
        opt(c.map(|c| c.categories.consumable_cost)),
        opt(c.map(|c| c.categories.rotable_cost)),
        flag(r.consumption_validated),
        opt(r.planned_parts_count()),
        opt(r.planned_qty()),
        opt(r.planned_confirmed_qty()),
        opt(r.planned_cost()),
        opt(r.planned_avg_price()),
        opt(r.parts_variance),
        opt(r.qty_variance),
        opt(r.cost_variance),
        opt(r.planning_accuracy),
    ]
}

/// Flat CSV export of the master view. Undefined values are blank cells.
pub fn write_master_csv<W: Write>(view: &MasterView, writer: W) -> Result<(), LoadError> {
    let mut out = csv::WriterBuilder::new().from_writer(writer);
    out.write_record(MASTER_COLUMNS)?;
    for row in &view.rows {
        out.write_record(master_record_fields(row))?;
    }
    out.flush().map_err(csv::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    use matplan_recon::model::WorkPackage;

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "wpno_i;partno;qty\n1;P1;2\n2;P2;3\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_comma_delimiter() {
        let content = "wpno_i,partno,qty\n1,P1,2\n2,P2,3\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_tab_delimiter() {
        let content = "wpno_i\tpartno\tqty\n1\tP1\t2\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn test_sniff_pipe_delimiter() {
        let content = "wpno_i|partno|qty\n1|P1|2\n";
        assert_eq!(sniff_delimiter(content), b'|');
    }

    #[test]
    fn test_sniff_semicolon_with_commas_in_values() {
        let content = "partno;description;qty\n\"P1\";\"Seal, rubber\";2\nP2;\"Bolt\";5\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_import_skips_blank_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("planned.csv");
        fs::write(&path, "wpno_i;partno;qty\n1;P1;2\n;;\n2;P2;3\n").unwrap();

        let table = import(&path).unwrap();
        assert_eq!(table.headers, vec!["wpno_i", "partno", "qty"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1], vec!["2", "P2", "3"]);
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        // é as a single 0xE9 byte
        let mut bytes = b"partno,description\nP1,caoutchouc ".to_vec();
        bytes.push(0xE9);
        bytes.push(b'\n');
        fs::write(&path, bytes).unwrap();

        let table = import(&path).unwrap();
        assert_eq!(table.rows[0][1], "caoutchouc é");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = import(Path::new("/nonexistent/matplan.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_master_csv_blank_for_undefined() {
        let view = MasterView {
            rows: vec![MasterRecord {
                work_package: WorkPackage {
                    wpno_i: Some("1001".into()),
                    is_c_check: true,
                    ..Default::default()
                },
                duration_days: None,
                utilization: None,
                consumption: None,
                consumption_validated: false,
                planned: None,
                parts_variance: None,
                qty_variance: None,
                cost_variance: None,
                planning_accuracy: None,
            }],
        };
        let mut buf = Vec::new();
        write_master_csv(&view, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap().split(',').count(), MASTER_COLUMNS.len());
        let row: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(row[0], "1001");
        assert_eq!(row[8], "1");
        assert_eq!(row[15], "");
        assert_eq!(row[MASTER_COLUMNS.len() - 1], "");
    }
}
