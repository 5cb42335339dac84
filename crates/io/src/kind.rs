use serde::Serialize;

/// Which of the four input tables a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    WorkPackages,
    Utilization,
    Consumption,
    Planned,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::WorkPackages,
        TableKind::Utilization,
        TableKind::Consumption,
        TableKind::Planned,
    ];

    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            TableKind::WorkPackages => &[
                "wpno_i",
                "wpno",
                "ac_registr",
                "ac_typ",
                "station",
                "start_date",
                "end_date",
                "is_c_check",
            ],
            TableKind::Utilization => &["ac_registr", "date", "tah", "tac"],
            TableKind::Consumption => &["partno", "qty", "average_price", "del_date", "station", "vm"],
            TableKind::Planned => &["wpno_i", "partno", "qty", "average_price"],
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableKind::WorkPackages => write!(f, "work packages"),
            TableKind::Utilization => write!(f, "utilization"),
            TableKind::Consumption => write!(f, "consumption"),
            TableKind::Planned => write!(f, "planned material"),
        }
    }
}

/// Canonical header form: trimmed, lowercase.
pub fn normalize_header(header: &str) -> String {
    header.trim().trim_start_matches('\u{feff}').to_lowercase()
}

fn has(headers: &[String], name: &str) -> bool {
    headers.iter().any(|h| normalize_header(h) == name)
}

/// Guess the table kind from its column headers. Checked in a fixed order;
/// the first signature that fits wins.
pub fn detect_table_kind(headers: &[String]) -> Option<TableKind> {
    if has(headers, "is_c_check") && has(headers, "wpno") {
        Some(TableKind::WorkPackages)
    } else if has(headers, "tah") && has(headers, "tac") {
        Some(TableKind::Utilization)
    } else if has(headers, "vm") && has(headers, "del_date") {
        Some(TableKind::Consumption)
    } else if has(headers, "partno") && has(headers, "wpno_i") && !has(headers, "vm") {
        Some(TableKind::Planned)
    } else {
        None
    }
}

/// Required columns of `kind` not present in `headers`, in declaration order.
pub fn missing_columns(kind: TableKind, headers: &[String]) -> Vec<String> {
    kind.required_columns()
        .iter()
        .filter(|c| !has(headers, c))
        .map(|c| c.to_string())
        .collect()
}
