//! SQL Server backend through the system ODBC driver manager.
//!
//! Every column is fetched as text; the renderer does its own numeric
//! coercion, so nothing is lost by skipping typed buffers.

use super::{Connection, Connector, Query, ResultSet, Value};
use crate::config::ConnectionParams;
use crate::error::{Error, Result};
use odbc_api::buffers::TextRowSet;
use odbc_api::{ConnectionOptions, Cursor, Environment, ResultSetMetadata};
use std::sync::OnceLock;

const BATCH_SIZE: usize = 500;
const MAX_TEXT_LEN: usize = 64 * 1024;

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

fn environment() -> Result<&'static Environment> {
    if let Some(env) = ENVIRONMENT.get() {
        return Ok(env);
    }
    let env = Environment::new().map_err(|e| Error::Connection(e.to_string()))?;
    Ok(ENVIRONMENT.get_or_init(|| env))
}

pub struct OdbcConnector;

impl Connector for OdbcConnector {
    fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn Connection>> {
        let conn = environment()?
            .connect_with_connection_string(
                &params.connection_string(),
                ConnectionOptions::default(),
            )
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(Box::new(OdbcConnection { conn: Some(conn) }))
    }
}

struct OdbcConnection {
    conn: Option<odbc_api::Connection<'static>>,
}

impl Connection for OdbcConnection {
    fn query(&mut self, query: &Query) -> Result<ResultSet> {
        let fail = |e: odbc_api::Error| Error::DataSource {
            query: query.kind,
            message: e.to_string(),
        };
        let conn = self.conn.as_ref().ok_or_else(|| Error::DataSource {
            query: query.kind,
            message: "connection already closed".to_string(),
        })?;

        let Some(mut cursor) = conn.execute(&query.sql, (), None).map_err(fail)? else {
            return Ok(ResultSet::default());
        };
        let columns = cursor
            .column_names()
            .map_err(fail)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(fail)?;
        let mut set = ResultSet::new(columns);

        let mut buffers =
            TextRowSet::for_cursor(BATCH_SIZE, &mut cursor, Some(MAX_TEXT_LEN)).map_err(fail)?;
        let mut rows = cursor.bind_buffer(&mut buffers).map_err(fail)?;
        // Values longer than MAX_TEXT_LEN fail the query instead of being cut.
        while let Some(batch) = rows.fetch_with_truncation_check(true).map_err(fail)? {
            for row in 0..batch.num_rows() {
                let values = (0..batch.num_cols())
                    .map(|col| match batch.at(col, row) {
                        Some(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
                        None => Value::Null,
                    })
                    .collect();
                set.push_row(values);
            }
        }
        Ok(set)
    }

    fn close(&mut self) {
        // Dropping the handle disconnects.
        self.conn.take();
    }
}
