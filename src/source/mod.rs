//! Tabular data source: values, result sets and the connection seam.
//!
//! The pipeline only ever sees [`Connection`]; concrete backends live in
//! submodules (`fixture` always, `odbc` behind the feature of the same name).

pub mod fixture;
#[cfg(feature = "odbc")]
pub mod odbc;

use crate::config::ConnectionParams;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell as returned by the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

static NULL: Value = Value::Null;

impl Value {
    /// NULL, NaN and whitespace-only text all count as blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            Value::Text(s) => s.trim().is_empty(),
            Value::Int(_) => false,
        }
    }

    /// Display form, or `None` when blank.
    pub fn text(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        Some(match self {
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Text(s) => s.clone(),
            Value::Null => return None,
        })
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) if !f.is_nan() => Some(*f),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|f| !f.is_nan()),
            _ => None,
        }
    }

    /// Display form with whole numbers collapsed to integers (`2.0` → `2`).
    ///
    /// Non-numeric and fractional values keep their literal form.
    pub fn integral_text(&self) -> Option<String> {
        if let Value::Int(i) = self {
            return Some(i.to_string());
        }
        match self.as_f64() {
            Some(f) if is_whole(f) => Some(format!("{}", f as i64)),
            _ => self.text(),
        }
    }

    /// Integer form of a whole number; `None` for anything else.
    pub fn whole_text(&self) -> Option<String> {
        match self {
            Value::Int(i) => Some(i.to_string()),
            _ => self
                .as_f64()
                .filter(|f| is_whole(*f))
                .map(|f| format!("{}", f as i64)),
        }
    }
}

fn is_whole(f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15
}

/// Floats print the way the source system printed them: `2.0`, `2.5`.
fn format_float(f: f64) -> String {
    if is_whole(f) {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Column names plus rows, in the order the source returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> &mut Self {
        self.rows.push(row);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |values| Record {
            columns: &self.columns,
            values,
        })
    }
}

/// A borrowed row with by-name column access.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Record<'a> {
    /// Value of `column`; missing columns and short rows read as NULL.
    pub fn get(&self, column: &str) -> &'a Value {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.values.get(idx))
            .unwrap_or(&NULL)
    }
}

/// The fixed queries issued for one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    RelevantCodes,
    Hierarchy,
    ApiList,
    OutputSettings,
    IpPermissions,
    WebServices,
    ParamValidation,
}

impl QueryKind {
    pub fn name(self) -> &'static str {
        match self {
            QueryKind::RelevantCodes => "relevant_codes",
            QueryKind::Hierarchy => "hierarchy",
            QueryKind::ApiList => "api_list",
            QueryKind::OutputSettings => "output_settings",
            QueryKind::IpPermissions => "ip_permissions",
            QueryKind::WebServices => "web_services",
            QueryKind::ParamValidation => "param_validation",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct Query {
    pub kind: QueryKind,
    pub sql: String,
}

/// An open connection able to run the fixed queries.
pub trait Connection {
    fn query(&mut self, query: &Query) -> Result<ResultSet>;

    /// Release the underlying connection. Called once, from [`Session`].
    fn close(&mut self) {}
}

/// Opens connections from [`ConnectionParams`].
pub trait Connector {
    fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn Connection>>;
}

/// Scoped connection: closed when dropped, whatever path the run took.
pub struct Session {
    conn: Box<dyn Connection>,
}

impl Session {
    pub fn open(connector: &dyn Connector, params: &ConnectionParams) -> Result<Self> {
        tracing::info!(server = %params.server, database = %params.database, "connecting to database");
        let conn = connector.connect(params)?;
        tracing::info!("database connection established");
        Ok(Self { conn })
    }

    pub fn query(&mut self, query: &Query) -> Result<ResultSet> {
        tracing::debug!(query = %query.kind, "running query");
        let rows = self.conn.query(query)?;
        tracing::debug!(query = %query.kind, rows = rows.len(), "query finished");
        Ok(rows)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.conn.close();
        tracing::info!("database connection closed");
    }
}
