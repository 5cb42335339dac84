use std::collections::HashMap;

use crate::kind::normalize_header;

/// Untyped table as read from disk: one header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column lookup by normalized header name.
    pub fn columns(&self) -> ColumnIndex {
        let mut by_name = HashMap::new();
        for (i, h) in self.headers.iter().enumerate() {
            // first occurrence of a duplicated header wins
            by_name.entry(normalize_header(h)).or_insert(i);
        }
        ColumnIndex { by_name }
    }
}

pub struct ColumnIndex {
    by_name: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn get(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Cell text for `name` in `row`, empty when the column or cell is absent.
    pub fn cell<'r>(&self, row: &'r [String], name: &str) -> &'r str {
        self.get(name)
            .and_then(|i| row.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_lookup_is_header_insensitive() {
        let table = RawTable {
            headers: vec!["WPNO_I".into(), " Station ".into()],
            rows: vec![vec!["42".into()]],
        };
        let cols = table.columns();
        assert_eq!(cols.cell(&table.rows[0], "wpno_i"), "42");
        // short row
        assert_eq!(cols.cell(&table.rows[0], "station"), "");
        assert_eq!(cols.cell(&table.rows[0], "missing"), "");
    }
}
