//! Generate the API specification document for the web-service
//! flow tables.
//!
//! The pipeline runs in one pass per request:
//!
//! 1. [`fetch`] runs the fixed queries through a [`source::Connection`],
//! 2. [`hierarchy`] indexes the per-API attribute rows by code and category,
//! 3. [`properties`] loads the SQL text behind each syntax key,
//! 4. [`compose`] lays batches, APIs and sections out as a [`report::Report`],
//! 5. [`render`] writes the report into the Word template (or markdown/json).
//!
//! [`pipeline::generate`] strings these together.

pub mod compose;
pub mod config;
pub mod error;
pub mod fetch;
pub mod hierarchy;
pub mod pipeline;
pub mod properties;
pub mod render;
pub mod report;
pub mod source;

pub use error::{Error, Result};
pub use pipeline::{build_report, generate, Outcome, Request};
