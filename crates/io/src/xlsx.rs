// Excel import (xlsx, xls, xlsb, ods). First sheet only, first row = headers.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};

use crate::coerce::excel_serial;
use crate::error::LoadError;
use crate::table::RawTable;

pub fn import(path: &Path) -> Result<RawTable, LoadError> {
    let parse_err = |message: String| LoadError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook: Sheets<_> =
        open_workbook_auto(path).map_err(|e| parse_err(format!("failed to open Excel file: {e}")))?;

    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Err(parse_err("Excel file contains no sheets".into()));
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| parse_err(format!("failed to read sheet '{sheet_name}': {e}")))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(RawTable::default());
    };
    let headers: Vec<String> = header_row.iter().map(cell_text).collect();

    let mut table = RawTable {
        headers,
        rows: Vec::new(),
    };
    for row in rows {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        table.rows.push(cells);
    }

    log::debug!(
        "{}: sheet '{}', {} rows",
        path.display(),
        sheet_name,
        table.rows.len()
    );
    Ok(table)
}

/// Render one cell as text the coercion layer understands.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => format!("{}", n),
        Data::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        // errors become blank, which coerces to missing
        Data::Error(_) => String::new(),
        Data::DateTime(dt) => excel_serial(dt.as_f64())
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}
