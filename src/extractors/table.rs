// src/extractors/table.rs

use crate::extractors::node::element_text;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

// --- CSS Selectors (Lazy Static) ---
static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("Failed to compile TABLE_SELECTOR"));

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("Failed to compile ROW_SELECTOR"));

// Header and data cells alike
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td, th").expect("Failed to compile CELL_SELECTOR"));

/// One table as rows of non-empty cell strings. Rows may differ in length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedTable {
    pub rows: Vec<Vec<String>>,
}

impl ExtractedTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Widest row; SEC tables rarely agree on column counts.
    pub fn max_columns(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

impl From<ExtractedTable> for Vec<Vec<String>> {
    fn from(table: ExtractedTable) -> Self {
        table.rows
    }
}

/// Every table in the document with at least one non-empty row, in document order.
pub fn extract_tables(document: &Html, collapse_whitespace: bool) -> Vec<ExtractedTable> {
    document
        .select(&TABLE_SELECTOR)
        .enumerate()
        .filter_map(|(idx, table)| {
            let extracted = extract_table(table, collapse_whitespace);
            if extracted.is_empty() {
                tracing::trace!("Dropping table #{} - no non-empty rows", idx);
                None
            } else {
                Some(extracted)
            }
        })
        .collect()
}

/// Rows of a single table element. Rows of nested tables are included too.
pub fn extract_table(table: ElementRef<'_>, collapse_whitespace: bool) -> ExtractedTable {
    let rows = table
        .select(&ROW_SELECTOR)
        .map(|row| {
            row.select(&CELL_SELECTOR)
                .map(|cell| element_text(cell, collapse_whitespace))
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect();

    ExtractedTable { rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(html: &str) -> Vec<Vec<Vec<String>>> {
        extract_tables(&Html::parse_document(html), false)
            .into_iter()
            .map(Into::into)
            .collect()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn empty_rows_are_dropped() {
        let got = tables(
            "<table><tr><td></td><td> </td></tr><tr><td>Revenue</td><td>100</td></tr>\
             <tr><td>&nbsp;</td><td></td></tr></table>",
        );
        assert_eq!(got, vec![vec![row(&["Revenue", "100"])]]);
    }

    #[test]
    fn all_empty_table_is_dropped() {
        let got = tables("<table><tr><td></td></tr><tr><th>  </th><td></td></tr></table><p>after</p>");
        assert!(got.is_empty());
    }

    #[test]
    fn table_without_rows_is_dropped() {
        assert!(tables("<table></table>").is_empty());
    }

    #[test]
    fn header_cells_and_ragged_rows_are_kept() {
        let got = tables(
            "<table><tr><th>Year</th><th>2023</th><th>2022</th></tr>\
             <tr><td>Net sales</td><td></td><td>$</td><td>383,285</td></tr>\
             <tr><td>Total</td></tr></table>",
        );
        assert_eq!(
            got,
            vec![vec![
                row(&["Year", "2023", "2022"]),
                row(&["Net sales", "$", "383,285"]),
                row(&["Total"]),
            ]]
        );
    }

    #[test]
    fn tables_come_out_in_document_order() {
        let got = tables(
            "<div><table><tr><td>first</td></tr></table></div>\
             <table><tr><td></td></tr></table>\
             <p><table><tr><td>second</td></tr></table></p>",
        );
        assert_eq!(got, vec![vec![row(&["first"])], vec![row(&["second"])]]);
    }

    #[test]
    fn cell_text_spans_inline_markup() {
        let got = tables("<table><tr><td><font>Total </font><b>assets</b></td><td>\n 352,583\n</td></tr></table>");
        assert_eq!(got, vec![vec![row(&["Total assets", "352,583"])]]);
    }

    #[test]
    fn collapsing_normalizes_cells() {
        let doc = Html::parse_document("<table><tr><td>Total\n   net\u{a0}sales</td></tr></table>");
        let got = extract_tables(&doc, true);
        assert_eq!(got[0].rows, vec![row(&["Total net sales"])]);
        assert_eq!(got[0].max_columns(), 1);
    }

    #[test]
    fn serializes_as_plain_rows() {
        let table = ExtractedTable {
            rows: vec![row(&["Revenue", "100"])],
        };
        assert_eq!(serde_json::to_string(&table).unwrap(), r#"[["Revenue","100"]]"#);
    }
}
