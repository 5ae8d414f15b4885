//! Markdown renderer — a plain-text preview of the report.
//!
//! Headings keep their level, tables become pipe tables. Line breaks inside
//! a cell are written as `<br>` so each row stays on one line.

use crate::error::Result;
use crate::render::Renderer;
use crate::report::{Block, Cell, Report, Table};

pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, report: &Report) -> Result<Vec<u8>> {
        let mut out = String::new();
        for block in &report.blocks {
            match block {
                Block::Heading { level, text } => {
                    out.push_str(&"#".repeat(*level as usize));
                    out.push(' ');
                    out.push_str(text);
                    out.push_str("\n\n");
                }
                // Spacers only separate tables in Word
                Block::Paragraph { text } if text.is_empty() => {}
                Block::Paragraph { text } => {
                    out.push_str(text);
                    out.push_str("\n\n");
                }
                Block::Table(table) => {
                    out.push_str(&render_table(table));
                    out.push('\n');
                }
            }
        }
        Ok(out.into_bytes())
    }

    fn file_extension(&self) -> &str {
        "md"
    }
}

fn render_table(table: &Table) -> String {
    let mut lines = Vec::with_capacity(table.rows.len() + 2);
    lines.push(render_row(&table.header()));
    lines.push(format!("|{}", "---|".repeat(table.layout.columns())));
    for row in &table.rows {
        lines.push(render_row(row));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn render_row(cells: &[Cell]) -> String {
    let cells: Vec<String> = cells.iter().map(|c| escape_cell(&c.text)).collect();
    format!("| {} |", cells.join(" | "))
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace('\t', "    ")
        .replace('\n', "<br>")
}
