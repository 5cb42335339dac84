//! Raw tables to engine model rows.

use matplan_recon::model::{MaterialLine, UtilizationSnapshot, WorkPackage};

use crate::coerce::{boolean, datetime, identifier, number, text};
use crate::table::RawTable;

fn count_bad_dates(label: &str, raw: usize, parsed: usize) {
    if parsed < raw {
        log::warn!("{label}: {} dates could not be parsed and were left empty", raw - parsed);
    }
}

pub fn to_work_packages(table: &RawTable) -> Vec<WorkPackage> {
    let cols = table.columns();
    let (mut raw_dates, mut parsed_dates) = (0, 0);

    let rows: Vec<WorkPackage> = table
        .rows
        .iter()
        .map(|row| {
            let start = cols.cell(row, "start_date");
            let end = cols.cell(row, "end_date");
            let wp = WorkPackage {
                wpno_i: identifier(cols.cell(row, "wpno_i")),
                wpno: identifier(cols.cell(row, "wpno")),
                ac_registr: text(cols.cell(row, "ac_registr")),
                ac_typ: text(cols.cell(row, "ac_typ")),
                station: text(cols.cell(row, "station")),
                start_date: datetime(start),
                end_date: datetime(end),
                is_c_check: boolean(cols.cell(row, "is_c_check")).unwrap_or(false),
                is_eol: boolean(cols.cell(row, "is_eol")).unwrap_or(false),
                is_bridging_task: boolean(cols.cell(row, "is_bridging_task")).unwrap_or(false),
                check_type: text(cols.cell(row, "check_type")),
            };
            raw_dates += [start, end].iter().filter(|s| !s.trim().is_empty()).count();
            parsed_dates += [wp.start_date, wp.end_date].iter().filter(|d| d.is_some()).count();
            wp
        })
        .collect();

    count_bad_dates("work packages", raw_dates, parsed_dates);
    rows
}

pub fn to_utilization(table: &RawTable) -> Vec<UtilizationSnapshot> {
    let cols = table.columns();
    table
        .rows
        .iter()
        .map(|row| UtilizationSnapshot {
            ac_registr: text(cols.cell(row, "ac_registr")),
            date: datetime(cols.cell(row, "date")),
            hours: number(cols.cell(row, "tah")),
            cycles: number(cols.cell(row, "tac")),
        })
        .collect()
}

fn material_line(cols: &crate::table::ColumnIndex, row: &[String], date_column: &str) -> MaterialLine {
    MaterialLine {
        partno: identifier(cols.cell(row, "partno")),
        qty: number(cols.cell(row, "qty")),
        confirmed_qty: number(cols.cell(row, "confirmed_qty")),
        // `average_price` holds the extended line total
        amount: number(cols.cell(row, "average_price")),
        wpno_i: identifier(cols.cell(row, "wpno_i")),
        station: text(cols.cell(row, "station")),
        date: datetime(cols.cell(row, date_column)),
        ac_registr: text(cols.cell(row, "ac_registr")),
        receiver: text(cols.cell(row, "receiver")),
        voucher: text(cols.cell(row, "vm")).map(|v| v.to_uppercase()),
        category: None,
        description: text(cols.cell(row, "description")),
        ata_chapter: identifier(cols.cell(row, "ata_chapter")),
    }
}

pub fn to_consumption(table: &RawTable) -> Vec<MaterialLine> {
    let cols = table.columns();
    let lines: Vec<MaterialLine> = table
        .rows
        .iter()
        .map(|row| material_line(&cols, row, "del_date"))
        .collect();
    let raw = table
        .rows
        .iter()
        .filter(|r| !cols.cell(r, "del_date").trim().is_empty())
        .count();
    count_bad_dates("consumption", raw, lines.iter().filter(|l| l.date.is_some()).count());
    lines
}

pub fn to_planned(table: &RawTable) -> Vec<MaterialLine> {
    let cols = table.columns();
    table
        .rows
        .iter()
        .map(|row| material_line(&cols, row, "del_date"))
        .collect()
}
