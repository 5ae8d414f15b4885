//! JSON renderer — structured output for tooling integration.
//!
//! Serializes the Report model directly.

use crate::error::{Error, Result};
use crate::render::Renderer;
use crate::report::Report;
use std::path::PathBuf;

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, report: &Report) -> Result<Vec<u8>> {
        // The pipeline fills in the output path.
        let mut out = serde_json::to_vec_pretty(report).map_err(|e| {
            Error::write(PathBuf::new(), format!("cannot serialize report: {}", e))
        })?;
        out.push(b'\n');
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Cell, Table, TableLayout};
    use serde_json::Value;

    #[test]
    fn blocks_are_tagged() {
        const LAYOUT: TableLayout = TableLayout {
            headers: &["IP", "說明"],
            widths_cm: &[8.74, 10.25],
        };
        let mut table = Table::new(LAYOUT);
        table.push_row(vec![Cell::new("10.0.0.1"), Cell::new("gw")]);
        let mut report = Report::default();
        report.heading(4, "A1");
        report.table(table);

        let json: Value = serde_json::from_slice(&JsonRenderer.render(&report).unwrap()).unwrap();
        let blocks = json["blocks"].as_array().unwrap();
        assert_eq!(blocks[0]["type"], "heading");
        assert_eq!(blocks[0]["level"], 4);
        assert_eq!(blocks[1]["type"], "table");
        assert_eq!(blocks[1]["layout"]["headers"][1], "說明");
        assert_eq!(blocks[1]["rows"][0][0]["text"], "10.0.0.1");
        assert!(blocks[1]["rows"][0][0].get("fill").is_none());
    }
}
