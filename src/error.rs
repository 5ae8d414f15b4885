//! Error taxonomy for the document pipeline.
//!
//! Lower layers return these unchanged; the pipeline releases the connection
//! and hands them to the caller, which decides how to present them.

use crate::source::QueryKind;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("database connection failed: {0}")]
    Connection(String),

    #[error("query {query} failed: {message}")]
    DataSource { query: QueryKind, message: String },

    #[error("template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("invalid template {}: {message}", .path.display())]
    InvalidTemplate { path: PathBuf, message: String },

    #[error("failed to write {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },

    #[error("{0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable kind name for callers that translate errors into statuses.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "NotFound",
            Error::Io { .. } => "IOError",
            Error::Connection(_) | Error::DataSource { .. } => "DatabaseError",
            Error::TemplateNotFound(_) => "TemplateNotFound",
            Error::InvalidTemplate { .. } => "InvalidTemplate",
            Error::Write { .. } => "WriteError",
            Error::Validation(_) => "ValidationError",
        }
    }

    /// Classify an I/O failure on `path` as not-found or a generic read error.
    pub(crate) fn from_read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Error::NotFound(path)
        } else {
            Error::Io { path, source }
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Error::Write {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Renderers don't know where their bytes go; name `output` on write
    /// errors raised without a path.
    pub(crate) fn at_output(self, output: &Path) -> Self {
        match self {
            Error::Write { path, message } if path.as_os_str().is_empty() => {
                Error::write(output, message)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_maps_to_not_found() {
        let err = Error::from_read("a.properties", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(err.kind(), "NotFound");
    }

    #[test]
    fn other_read_failures_map_to_io() {
        let err = Error::from_read(
            "a.properties",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert_eq!(err.kind(), "IOError");
        assert!(err.to_string().starts_with("failed to read a.properties"));
    }

    #[test]
    fn render_write_errors_name_the_output() {
        let err = Error::write(PathBuf::new(), "cannot serialize report")
            .at_output(Path::new("out.json"));
        assert_eq!(err.kind(), "WriteError");
        assert_eq!(err.to_string(), "failed to write out.json: cannot serialize report");

        let err = Error::write("kept.json", "disk full").at_output(Path::new("out.json"));
        assert!(err.to_string().starts_with("failed to write kept.json"));

        let err = Error::Validation("x".into()).at_output(Path::new("out.json"));
        assert_eq!(err.kind(), "ValidationError");
    }

    #[test]
    fn query_failures_are_database_errors() {
        let err = Error::DataSource {
            query: QueryKind::ApiList,
            message: "timeout".to_string(),
        };
        assert_eq!(err.kind(), "DatabaseError");
        assert_eq!(err.to_string(), "query api_list failed: timeout");
    }
}
