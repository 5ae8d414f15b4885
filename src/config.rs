//! Connection parameters and the optional TOML settings file.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// ODBC driver used for every connection.
pub const DRIVER: &str = "ODBC Driver 18 for SQL Server";

/// Servers run with self-signed certificates; trust them.
pub const TRUST_SERVER_CERTIFICATE: &str = "yes";

/// Default `FLOW_ID LIKE` pattern selecting the batches to document.
pub const DEFAULT_FLOW_PREFIX: &str = "FI_%";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectionParams {
    pub server: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl ConnectionParams {
    /// Render the ODBC connection string for [`DRIVER`].
    pub fn connection_string(&self) -> String {
        format!(
            "DRIVER={{{}}};SERVER={};DATABASE={};UID={};PWD={};TrustServerCertificate={};",
            DRIVER,
            odbc_value(&self.server),
            odbc_value(&self.database),
            odbc_value(&self.username),
            odbc_value(&self.password),
            TRUST_SERVER_CERTIFICATE,
        )
    }

    /// Names of required fields that are still empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.server.trim().is_empty() {
            missing.push("server");
        }
        if self.database.trim().is_empty() {
            missing.push("database");
        }
        if self.username.trim().is_empty() {
            missing.push("username");
        }
        missing
    }
}

/// Brace-quote a connection string value when it contains separators.
fn odbc_value(value: &str) -> String {
    if value.contains([';', '{', '}']) || value.trim() != value {
        format!("{{{}}}", value.replace('}', "}}"))
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub flow_prefix: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            flow_prefix: DEFAULT_FLOW_PREFIX.to_string(),
        }
    }
}

/// Contents of `apidoc.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub connection: ConnectionParams,
    pub report: ReportSettings,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::from_read(path, e))?;
        Self::parse(&text).map_err(|message| {
            Error::Validation(format!("invalid settings {}: {}", path.display(), message))
        })
    }

    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }
}
