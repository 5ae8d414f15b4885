//! Word renderer — appends the report to the body of a `.docx` template.
//!
//! The template package is copied entry by entry; only `word/document.xml`
//! changes. Generated content goes right before the body's closing
//! `w:sectPr` so the template's page setup still applies to it.

use crate::error::{Error, Result};
use crate::render::Renderer;
use crate::report::{Block, Cell, Fill, Report, Table};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const STYLES_PART: &str = "word/styles.xml";

const EMU_PER_CM: f64 = 360_000.0;
const EMU_PER_TWIP: f64 = 635.0;

pub fn cm_to_twips(cm: f64) -> u32 {
    (cm * EMU_PER_CM / EMU_PER_TWIP).round() as u32
}

struct Entry {
    name: String,
    data: Vec<u8>,
    is_dir: bool,
}

/// A template package held in memory.
pub struct Template {
    path: PathBuf,
    entries: Vec<Entry>,
    styles: StyleIds,
}

impl Template {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| match Error::from_read(path, e) {
            Error::NotFound(p) => Error::TemplateNotFound(p),
            other => other,
        })?;
        let template = Self::from_bytes(path, bytes)?;
        tracing::info!(template = %path.display(), "loaded template");
        Ok(template)
    }

    pub fn from_bytes(path: &Path, bytes: Vec<u8>) -> Result<Self> {
        let invalid = |message: String| Error::InvalidTemplate {
            path: path.to_path_buf(),
            message,
        };

        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| invalid(e.to_string()))?;
        let mut entries = Vec::with_capacity(archive.len());
        for idx in 0..archive.len() {
            let mut file = archive.by_index(idx).map_err(|e| invalid(e.to_string()))?;
            let mut data = Vec::new();
            file.read_to_end(&mut data)
                .map_err(|e| invalid(e.to_string()))?;
            entries.push(Entry {
                name: file.name().to_string(),
                data,
                is_dir: file.is_dir(),
            });
        }

        if !entries.iter().any(|e| e.name == DOCUMENT_PART) {
            return Err(invalid(format!("missing {}", DOCUMENT_PART)));
        }
        let styles = entries
            .iter()
            .find(|e| e.name == STYLES_PART)
            .map(|e| StyleIds::parse(&e.data))
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            styles,
        })
    }

    fn invalid(&self, message: impl ToString) -> Error {
        Error::InvalidTemplate {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }
}

/// Style names (lower-cased) to style ids, from `word/styles.xml`.
///
/// Localised templates give built-in styles ids like `2` instead of
/// `Heading2`; the name stays `heading 2`.
#[derive(Debug, Default)]
pub struct StyleIds(HashMap<String, String>);

impl StyleIds {
    pub fn parse(xml: &[u8]) -> Self {
        let mut ids = HashMap::new();
        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::new();
        let mut current: Option<String> = None;
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) if e.name().as_ref() == b"w:style" => {
                    current = attr(&e, b"w:styleId");
                }
                Ok(Event::Empty(e)) if e.name().as_ref() == b"w:name" => {
                    if let (Some(id), Some(name)) = (current.as_ref(), attr(&e, b"w:val")) {
                        ids.insert(name.to_lowercase(), id.clone());
                    }
                }
                Ok(Event::End(e)) if e.name().as_ref() == b"w:style" => current = None,
                Ok(Event::Eof) | Err(_) => break,
                _ => {}
            }
            buf.clear();
        }
        Self(ids)
    }

    /// Id of the style called `name`, or `fallback`.
    pub fn resolve<'a>(&'a self, name: &str, fallback: &'a str) -> &'a str {
        self.0
            .get(&name.to_lowercase())
            .map(String::as_str)
            .unwrap_or(fallback)
    }
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.try_get_attribute(key)
        .ok()
        .flatten()
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

pub struct DocxRenderer {
    template: Template,
}

impl DocxRenderer {
    pub fn new(template: Template) -> Self {
        Self { template }
    }
}

impl Renderer for DocxRenderer {
    fn render(&self, report: &Report) -> Result<Vec<u8>> {
        let body = BodyWriter::new(&self.template.styles)
            .write(report)
            .map_err(|e| self.template.invalid(e))?;

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in &self.template.entries {
            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)
                    .map_err(|e| self.template.invalid(e))?;
                continue;
            }
            zip.start_file(entry.name.as_str(), options)
                .map_err(|e| self.template.invalid(e))?;
            let written = if entry.name == DOCUMENT_PART {
                let document = splice(&entry.data, &body).map_err(|e| self.template.invalid(e))?;
                zip.write_all(&document)
            } else {
                zip.write_all(&entry.data)
            };
            written.map_err(|e| self.template.invalid(e))?;
        }
        let out = zip.finish().map_err(|e| self.template.invalid(e))?;
        Ok(out.into_inner())
    }

    fn file_extension(&self) -> &str {
        "docx"
    }
}

/// Insert `body` into `document` before the final `w:sectPr` of `w:body`,
/// or before `</w:body>` when there is none.
pub fn splice(document: &[u8], body: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let mut reader = Reader::from_reader(document);
    let mut writer = Writer::new(Vec::with_capacity(document.len() + body.len()));
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut body_children: Option<usize> = None;
    let mut inserted = false;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| format!("{} at byte {}: {}", DOCUMENT_PART, reader.buffer_position(), e))?;
        match &event {
            Event::Start(e) | Event::Empty(e) => {
                let name = e.name();
                if !inserted && body_children == Some(depth) && name.as_ref() == b"w:sectPr" {
                    writer.get_mut().extend_from_slice(body);
                    inserted = true;
                }
                if matches!(event, Event::Start(_)) {
                    if name.as_ref() == b"w:body" {
                        body_children = Some(depth + 1);
                    }
                    depth += 1;
                }
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if !inserted && e.name().as_ref() == b"w:body" {
                    writer.get_mut().extend_from_slice(body);
                    inserted = true;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        writer.write_event(event).map_err(|e| e.to_string())?;
        buf.clear();
    }

    if !inserted {
        return Err(format!("{} has no w:body", DOCUMENT_PART));
    }
    Ok(writer.into_inner())
}

// -- Body XML -----------------------------------------------------------------

type XmlResult = std::result::Result<(), String>;

struct BodyWriter<'a> {
    w: Writer<Vec<u8>>,
    styles: &'a StyleIds,
}

impl<'a> BodyWriter<'a> {
    fn new(styles: &'a StyleIds) -> Self {
        Self {
            w: Writer::new(Vec::new()),
            styles,
        }
    }

    fn write(mut self, report: &Report) -> std::result::Result<Vec<u8>, String> {
        for block in &report.blocks {
            match block {
                Block::Heading { level, text } => {
                    let name = format!("heading {}", level);
                    let fallback = format!("Heading{}", level);
                    let style = self.styles.resolve(&name, &fallback).to_string();
                    self.paragraph(Some(&style), text)?;
                }
                Block::Paragraph { text } => self.paragraph(None, text)?,
                Block::Table(table) => self.table(table)?,
            }
        }
        Ok(self.w.into_inner())
    }

    fn emit(&mut self, event: Event<'_>) -> XmlResult {
        self.w.write_event(event).map_err(|e| e.to_string())
    }

    fn start(&mut self, tag: &str, attrs: &[(&str, &str)]) -> XmlResult {
        let mut el = BytesStart::new(tag);
        for kv in attrs {
            el.push_attribute(*kv);
        }
        self.emit(Event::Start(el))
    }

    fn empty(&mut self, tag: &str, attrs: &[(&str, &str)]) -> XmlResult {
        let mut el = BytesStart::new(tag);
        for kv in attrs {
            el.push_attribute(*kv);
        }
        self.emit(Event::Empty(el))
    }

    fn end(&mut self, tag: &str) -> XmlResult {
        self.emit(Event::End(BytesEnd::new(tag)))
    }

    fn paragraph(&mut self, style: Option<&str>, text: &str) -> XmlResult {
        self.start("w:p", &[])?;
        if let Some(style) = style {
            self.start("w:pPr", &[])?;
            self.empty("w:pStyle", &[("w:val", style)])?;
            self.end("w:pPr")?;
        }
        self.run(text)?;
        self.end("w:p")
    }

    /// One run; `\n` becomes a line break and `\t` a tab.
    fn run(&mut self, text: &str) -> XmlResult {
        if text.is_empty() {
            return Ok(());
        }
        self.start("w:r", &[])?;
        for (line_no, line) in text.split('\n').enumerate() {
            if line_no > 0 {
                self.empty("w:br", &[])?;
            }
            for (seg_no, segment) in line.split('\t').enumerate() {
                if seg_no > 0 {
                    self.empty("w:tab", &[])?;
                }
                if !segment.is_empty() {
                    self.start("w:t", &[("xml:space", "preserve")])?;
                    self.emit(Event::Text(BytesText::new(segment)))?;
                    self.end("w:t")?;
                }
            }
        }
        self.end("w:r")
    }

    fn table(&mut self, table: &Table) -> XmlResult {
        let style = self.styles.resolve("table grid", "TableGrid").to_string();
        self.start("w:tbl", &[])?;

        self.start("w:tblPr", &[])?;
        self.empty("w:tblStyle", &[("w:val", style.as_str())])?;
        self.empty("w:tblW", &[("w:w", "0"), ("w:type", "auto")])?;
        self.start("w:tblBorders", &[])?;
        for side in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
            self.empty(
                side,
                &[("w:val", "single"), ("w:sz", "4"), ("w:space", "0"), ("w:color", "auto")],
            )?;
        }
        self.end("w:tblBorders")?;
        self.empty("w:tblLayout", &[("w:type", "fixed")])?;
        self.empty("w:tblLook", &[("w:val", "04A0")])?;
        self.end("w:tblPr")?;

        self.start("w:tblGrid", &[])?;
        for idx in 0..table.layout.columns() {
            let width = cm_to_twips(table.width_cm(idx)).to_string();
            self.empty("w:gridCol", &[("w:w", width.as_str())])?;
        }
        self.end("w:tblGrid")?;

        self.row(table, &table.header())?;
        for row in &table.rows {
            self.row(table, row)?;
        }
        self.end("w:tbl")
    }

    fn row(&mut self, table: &Table, cells: &[Cell]) -> XmlResult {
        self.start("w:tr", &[])?;
        for (idx, cell) in cells.iter().enumerate() {
            self.cell(cell, cm_to_twips(table.width_cm(idx)))?;
        }
        self.end("w:tr")
    }

    fn cell(&mut self, cell: &Cell, width: u32) -> XmlResult {
        let width = width.to_string();
        self.start("w:tc", &[])?;
        self.start("w:tcPr", &[])?;
        self.empty("w:tcW", &[("w:w", width.as_str()), ("w:type", "dxa")])?;
        if let Some(Fill(color)) = cell.fill {
            self.empty(
                "w:shd",
                &[("w:val", "clear"), ("w:color", "auto"), ("w:fill", color)],
            )?;
        }
        self.end("w:tcPr")?;
        self.start("w:p", &[])?;
        self.run(&cell.text)?;
        self.end("w:p")?;
        self.end("w:tc")
    }
}
