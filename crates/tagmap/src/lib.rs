//! `tagmap` - render spreadsheets of geotagged work sites as interactive maps
//!
//! A spreadsheet with one row per site is validated, its coordinates are
//! normalized, and every row becomes a marker colored by the tagging status
//! found in its description. The result is a single self-contained HTML
//! document, served by the bundled web front end or written by the CLI.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod builder;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod html;
pub mod logging;
pub mod marker;
pub mod normalize;
pub mod record;
pub mod schema;
pub mod server;
pub mod sheet;
pub mod view;

pub use builder::{MapBuilder, Stage};
pub use config::Config;
pub use document::{DocumentHandle, MapDocument};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use record::{Classifier, MarkerColor, Record};
pub use schema::{Schema, SchemaVariant};
pub use sheet::{Cell, Table};
