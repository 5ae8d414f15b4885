//! End-to-end generation: query, index, compose, render, persist.
//!
//! The connection lives in a [`Session`] scoped to [`build_report`], so it is
//! released before rendering starts and on every early return.

use crate::compose;
use crate::config::{ConnectionParams, DEFAULT_FLOW_PREFIX};
use crate::error::{Error, Result};
use crate::fetch;
use crate::hierarchy::Hierarchy;
use crate::properties;
use crate::render::create_renderer;
use crate::report::Report;
use crate::source::{Connector, Session};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Inputs for one generation run.
#[derive(Debug, Clone)]
pub struct Request {
    pub params: ConnectionParams,
    pub flow_prefix: String,
    /// Word template; required by the `docx` format only.
    pub template: Option<PathBuf>,
    pub properties: PathBuf,
    pub output: PathBuf,
    pub format: String,
}

impl Request {
    pub fn new(
        params: ConnectionParams,
        template: impl Into<PathBuf>,
        properties: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            params,
            flow_prefix: DEFAULT_FLOW_PREFIX.to_string(),
            template: Some(template.into()),
            properties: properties.into(),
            output: output.into(),
            format: "docx".to_string(),
        }
    }

    /// Reject empty input files up front. Missing files are left for the
    /// stage that reads them, which reports them as not found.
    pub fn validate(&self) -> Result<()> {
        if let Some(template) = &self.template {
            ensure_not_empty(template, "template")?;
        }
        ensure_not_empty(&self.properties, "properties file")
    }
}

fn ensure_not_empty(path: &Path, what: &str) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() == 0 => Err(Error::Validation(format!(
            "the {} is empty: {}",
            what,
            path.display()
        ))),
        _ => Ok(()),
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub output: PathBuf,
    pub batches: usize,
    pub apis: usize,
}

/// Query the source and lay out the report, without rendering it.
pub fn build_report(connector: &dyn Connector, request: &Request) -> Result<Report> {
    let mut session = Session::open(connector, &request.params)?;
    let mut report = Report::default();

    let Some(fetched) = fetch::fetch(&mut session, &request.flow_prefix)? else {
        tracing::warn!(prefix = %request.flow_prefix, "no API codes found for batch prefix");
        compose::compose_no_data(&mut report, &request.flow_prefix);
        return Ok(report);
    };

    let hierarchy = Hierarchy::build(&fetched.categories);
    tracing::debug!(apis = hierarchy.len(), "indexed API attributes");

    let syntax = properties::load(&request.properties)?;
    tracing::info!(
        properties = %request.properties.display(),
        keys = syntax.len(),
        "loaded syntax properties"
    );

    compose::compose(&mut report, &hierarchy, &syntax, &fetched.ordering);
    Ok(report)
}

/// Run the whole pipeline and write the document to `request.output`.
pub fn generate(connector: &dyn Connector, request: &Request) -> Result<Outcome> {
    let report = build_report(connector, request)?;
    let renderer = create_renderer(&request.format, request.template.as_deref())?;
    let bytes = renderer
        .render(&report)
        .map_err(|e| e.at_output(&request.output))?;
    persist(&request.output, &bytes)?;

    let outcome = Outcome {
        output: request.output.clone(),
        batches: report.headings(2).len(),
        apis: report.headings(4).len(),
    };
    tracing::info!(
        output = %outcome.output.display(),
        batches = outcome.batches,
        apis = outcome.apis,
        "report written"
    );
    Ok(outcome)
}

/// Write through a temporary file in the target directory so a failed run
/// never leaves a partial document behind.
fn persist(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::write(path, e))?;
    tmp.write_all(bytes).map_err(|e| Error::write(path, e))?;
    tmp.persist(path).map_err(|e| Error::write(path, e.error))?;
    Ok(())
}
