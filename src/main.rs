//! Writes the API specification document from the flow tables.
//!
//! `apidoc -t template.docx -p sql.properties -o API_規格書.docx --server db01 ...`
//!
//! Connection flags fall back to `APIDOC_*` environment variables and then to
//! the `[connection]` table of `--config`. `--fixture` replaces the database
//! with a JSON dump of the query results.

use anyhow::{bail, Context, Result};
use apidoc::config::{ConnectionParams, Settings};
use apidoc::source::fixture::FixtureConnector;
use apidoc::source::Connector;
use apidoc::Request;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "apidoc",
    about = "Generate the API specification document from the flow/code tables"
)]
struct Cli {
    /// Word template the report is appended to (required for docx)
    #[arg(short = 't', long)]
    template: Option<PathBuf>,

    /// Properties file mapping syntax keys to SQL text
    #[arg(short = 'p', long)]
    properties: PathBuf,

    /// Output file
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Output format: docx (default), markdown, json
    #[arg(short = 'f', long, default_value = "docx")]
    format: String,

    /// TOML settings file with [connection] and [report] tables
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Read query results from a JSON fixture instead of the database
    #[arg(long)]
    fixture: Option<PathBuf>,

    #[arg(long, env = "APIDOC_SERVER")]
    server: Option<String>,

    #[arg(long, env = "APIDOC_DATABASE")]
    database: Option<String>,

    #[arg(long, env = "APIDOC_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "APIDOC_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// FLOW_ID LIKE pattern selecting the batches to document
    #[arg(long)]
    flow_prefix: Option<String>,

    /// Log debug detail to stderr
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings: {}", path.display()))?,
        None => Settings::default(),
    };

    let params = ConnectionParams {
        server: cli.server.clone().unwrap_or(settings.connection.server),
        database: cli.database.clone().unwrap_or(settings.connection.database),
        username: cli.username.clone().unwrap_or(settings.connection.username),
        password: cli.password.clone().unwrap_or(settings.connection.password),
    };

    let request = Request {
        params,
        flow_prefix: cli
            .flow_prefix
            .clone()
            .unwrap_or(settings.report.flow_prefix),
        template: cli.template.clone(),
        properties: cli.properties.clone(),
        output: cli.output.clone(),
        format: cli.format.clone(),
    };
    request.validate()?;

    let connector = connector(&cli, &request.params)?;
    let outcome = apidoc::generate(connector.as_ref(), &request)
        .context("failed to generate report")?;

    println!("{}", outcome.output.display());
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Pick the data source: a fixture when given, the database otherwise.
fn connector(cli: &Cli, params: &ConnectionParams) -> Result<Box<dyn Connector>> {
    if let Some(path) = &cli.fixture {
        return Ok(Box::new(FixtureConnector::new(path)));
    }

    let missing = params.missing_fields();
    if !missing.is_empty() {
        bail!(
            "missing connection settings: {} (use --fixture to run without a database)",
            missing.join(", ")
        );
    }
    database_connector()
}

#[cfg(feature = "odbc")]
fn database_connector() -> Result<Box<dyn Connector>> {
    Ok(Box::new(apidoc::source::odbc::OdbcConnector))
}

#[cfg(not(feature = "odbc"))]
fn database_connector() -> Result<Box<dyn Connector>> {
    bail!("built without database support; rebuild with `--features odbc` or pass --fixture")
}
