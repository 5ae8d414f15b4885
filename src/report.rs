//! Format-agnostic data model for a generated report.
//!
//! Tables are always built from a [`TableLayout`], which owns the headers
//! and column widths. Writers take widths from the layout for every cell,
//! so header, data and placeholder rows can never disagree.

use serde::Serialize;

/// Substituted for every NULL, blank or missing value.
pub const PLACEHOLDER: &str = "NaN";

/// Header row fill.
pub const HEADER_FILL: Fill = Fill("D9D9D9");

/// Fill for label columns in the API detail table.
pub const LABEL_FILL: Fill = Fill("F2F2F2");

/// Cell background, as an RGB hex string without `#`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Fill(pub &'static str);

#[derive(Debug, Default, Serialize)]
pub struct Report {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph { text: String },
    Table(Table),
}

/// Headers and fixed widths (cm) for one kind of table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TableLayout {
    pub headers: &'static [&'static str],
    pub widths_cm: &'static [f64],
}

impl TableLayout {
    pub fn columns(&self) -> usize {
        self.headers.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
}

impl Cell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fill: None,
        }
    }

    pub fn filled(text: impl Into<String>, fill: Fill) -> Self {
        Self {
            text: text.into(),
            fill: Some(fill),
        }
    }

    /// `text` or the placeholder when absent.
    pub fn or_placeholder(text: Option<String>) -> Self {
        Self::new(text.unwrap_or_else(|| PLACEHOLDER.to_string()))
    }
}

/// A bordered table whose first row is the shaded header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub layout: TableLayout,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(layout: TableLayout) -> Self {
        Self {
            layout,
            rows: Vec::new(),
        }
    }

    /// Header cells, shaded with [`HEADER_FILL`].
    pub fn header(&self) -> Vec<Cell> {
        self.layout
            .headers
            .iter()
            .map(|h| Cell::filled(*h, HEADER_FILL))
            .collect()
    }

    /// Append a body row. Short rows are padded with placeholders and long
    /// rows truncated, so every row matches the layout.
    pub fn push_row(&mut self, mut cells: Vec<Cell>) {
        cells.resize_with(self.layout.columns(), || Cell::new(PLACEHOLDER));
        self.rows.push(cells);
    }

    /// Append one row of placeholders spanning every column.
    pub fn push_placeholder_row(&mut self) {
        self.push_row(Vec::new());
    }

    /// Width of column `idx` in cm.
    pub fn width_cm(&self, idx: usize) -> f64 {
        self.layout.widths_cm.get(idx).copied().unwrap_or(0.0)
    }

    /// Header and body text, row by row.
    pub fn texts(&self) -> Vec<Vec<String>> {
        let header = self.layout.headers.iter().map(|h| h.to_string()).collect();
        std::iter::once(header)
            .chain(
                self.rows
                    .iter()
                    .map(|row| row.iter().map(|c| c.text.clone()).collect::<Vec<_>>()),
            )
            .collect()
    }
}

impl Report {
    pub fn heading(&mut self, level: u8, text: impl Into<String>) {
        self.blocks.push(Block::Heading {
            level,
            text: text.into(),
        });
    }

    pub fn paragraph(&mut self, text: impl Into<String>) {
        self.blocks.push(Block::Paragraph { text: text.into() });
    }

    /// Empty paragraph used as a spacer after tables.
    pub fn spacer(&mut self) {
        self.paragraph("");
    }

    pub fn table(&mut self, table: Table) {
        self.blocks.push(Block::Table(table));
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Text of every table in document order.
    pub fn table_texts(&self) -> Vec<Vec<Vec<String>>> {
        self.tables().map(Table::texts).collect()
    }

    pub fn headings(&self, level: u8) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Heading { level: l, text } if *l == level => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: TableLayout = TableLayout {
        headers: &["IP", "說明"],
        widths_cm: &[8.74, 10.25],
    };

    #[test]
    fn placeholder_row_spans_layout() {
        let mut table = Table::new(LAYOUT);
        table.push_placeholder_row();
        assert_eq!(table.rows.len(), 1);
        assert!(table.rows[0].iter().all(|c| c.text == PLACEHOLDER));
        assert_eq!(table.rows[0].len(), 2);
    }

    #[test]
    fn rows_are_sized_to_layout() {
        let mut table = Table::new(LAYOUT);
        table.push_row(vec![Cell::new("10.0.0.1")]);
        table.push_row(vec![Cell::new("a"), Cell::new("b"), Cell::new("c")]);
        assert_eq!(table.rows[0][1].text, PLACEHOLDER);
        assert_eq!(table.rows[1].len(), 2);
    }

    #[test]
    fn header_is_shaded() {
        let table = Table::new(LAYOUT);
        assert!(table.header().iter().all(|c| c.fill == Some(HEADER_FILL)));
        assert_eq!(table.width_cm(1), 10.25);
    }

    #[test]
    fn texts_include_header() {
        let mut table = Table::new(LAYOUT);
        table.push_row(vec![Cell::new("1"), Cell::new("x")]);
        assert_eq!(table.texts(), vec![vec!["IP", "說明"], vec!["1", "x"]]);
    }

    #[test]
    fn report_collects_headings_and_tables() {
        let mut report = Report::default();
        report.heading(2, "B1 (batch)");
        report.table(Table::new(LAYOUT));
        report.spacer();
        assert_eq!(report.headings(2), vec!["B1 (batch)"]);
        assert_eq!(report.tables().count(), 1);
        assert_eq!(report.blocks.len(), 3);
    }
}
