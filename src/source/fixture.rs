//! JSON fixture backend.
//!
//! A fixture file holds one result set per query, keyed by the query name:
//!
//! ```json
//! { "relevant_codes": { "columns": ["CALL_CODE_ID"], "rows": [["API001"]] } }
//! ```
//!
//! Queries without an entry return an empty result set.

use super::{Connection, Connector, Query, QueryKind, ResultSet};
use crate::config::ConnectionParams;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub relevant_codes: ResultSet,
    pub hierarchy: ResultSet,
    pub api_list: ResultSet,
    pub output_settings: ResultSet,
    pub ip_permissions: ResultSet,
    pub web_services: ResultSet,
    pub param_validation: ResultSet,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::from_read(path, e))?;
        serde_json::from_str(&text).map_err(|e| {
            Error::Connection(format!("invalid fixture {}: {}", path.display(), e))
        })
    }

    pub fn result_set(&self, kind: QueryKind) -> &ResultSet {
        match kind {
            QueryKind::RelevantCodes => &self.relevant_codes,
            QueryKind::Hierarchy => &self.hierarchy,
            QueryKind::ApiList => &self.api_list,
            QueryKind::OutputSettings => &self.output_settings,
            QueryKind::IpPermissions => &self.ip_permissions,
            QueryKind::WebServices => &self.web_services,
            QueryKind::ParamValidation => &self.param_validation,
        }
    }
}

impl Connection for Fixture {
    fn query(&mut self, query: &Query) -> Result<ResultSet> {
        Ok(self.result_set(query.kind).clone())
    }
}

/// Connects by reading a fixture file; connection parameters are ignored.
pub struct FixtureConnector {
    path: PathBuf,
}

impl FixtureConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Connector for FixtureConnector {
    fn connect(&self, _params: &ConnectionParams) -> Result<Box<dyn Connection>> {
        let fixture = Fixture::load(&self.path).map_err(|e| match e {
            Error::NotFound(path) => {
                Error::Connection(format!("fixture not found: {}", path.display()))
            }
            other => other,
        })?;
        Ok(Box::new(fixture))
    }
}

/// Serves a fixture already in memory.
pub struct StaticConnector(pub Fixture);

impl Connector for StaticConnector {
    fn connect(&self, _params: &ConnectionParams) -> Result<Box<dyn Connection>> {
        Ok(Box::new(self.0.clone()))
    }
}
