//! The map builder.
//!
//! [`MapBuilder::build`] turns one spreadsheet into the map document:
//! load, validate the header, coerce and normalize coordinates, classify and
//! render markers, then atomically replace the output file. Any failure aborts
//! the whole build and leaves the previous document in place.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::document::{DocumentHandle, MapDocument};
use crate::error::{Error, Result};
use crate::html::Templates;
use crate::marker::Marker;
use crate::normalize;
use crate::record::{Classifier, Record};
use crate::schema::Schema;
use crate::sheet::Table;
use crate::view::MapView;

/// Progress of a single build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    /// Nothing started.
    #[default]
    Idle,
    /// Reading the spreadsheet.
    Loading,
    /// Checking the header row.
    Validating,
    /// Coercing and rescaling coordinates.
    Normalizing,
    /// Building records, markers and the document.
    Rendering,
    /// Document written to disk.
    Written,
    /// Aborted; the error carries the reason.
    Failed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Validating => write!(f, "validating"),
            Self::Normalizing => write!(f, "normalizing"),
            Self::Rendering => write!(f, "rendering"),
            Self::Written => write!(f, "written"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Builds map documents from spreadsheets.
#[derive(Debug)]
pub struct MapBuilder {
    config: Config,
    schema: Schema,
    classifier: Classifier,
    templates: Templates,
}

impl MapBuilder {
    /// Create a builder for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a template fails to compile.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let schema = Schema::new(config.map.schema);
        let classifier = Classifier::new(&config.map.rules, config.map.default_color)?;
        let templates = Templates::new()?;
        Ok(Self {
            config,
            schema,
            classifier,
            templates,
        })
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The required-column schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Compiled page templates.
    #[must_use]
    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    /// Where the document is written.
    #[must_use]
    pub fn document_path(&self) -> PathBuf {
        self.config.document_path()
    }

    /// Create the upload and output directories.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DirectoryCreate`] if a directory cannot be created.
    pub fn prepare_dirs(&self) -> Result<()> {
        for dir in [self.config.upload_dir(), self.config.output_dir()] {
            create_dir(dir)?;
        }
        Ok(())
    }

    /// Build the map document from a spreadsheet file.
    ///
    /// # Errors
    ///
    /// Returns the first error of any stage. The previous document is kept.
    pub fn build(&self, path: &Path) -> Result<DocumentHandle> {
        let mut stage = Stage::Idle;
        let result = self.run(path, &mut stage);
        match &result {
            Ok(handle) => info!(
                source = %path.display(),
                markers = handle.markers,
                output = %handle.path.display(),
                "Map built"
            ),
            Err(e) => {
                let failed_at = stage;
                stage = Stage::Failed;
                warn!(
                    source = %path.display(),
                    %failed_at,
                    %stage,
                    error = %e,
                    "Map build failed"
                );
            }
        }
        result
    }

    fn run(&self, path: &Path, stage: &mut Stage) -> Result<DocumentHandle> {
        *stage = Stage::Loading;
        let table = Table::load(path)?;
        let document = self.render_stages(&table, stage)?;
        let handle = self.publish(&document)?;
        *stage = Stage::Written;
        Ok(handle)
    }

    /// Run validation, normalization and rendering on a loaded table.
    ///
    /// # Errors
    ///
    /// Returns the first data or rendering error.
    pub fn render(&self, table: &Table) -> Result<MapDocument> {
        let mut stage = Stage::Idle;
        self.render_stages(table, &mut stage)
    }

    fn render_stages(&self, table: &Table, stage: &mut Stage) -> Result<MapDocument> {
        *stage = Stage::Validating;
        let columns = self.schema.validate(table)?;
        if table.is_empty() {
            return Err(Error::EmptyDataset);
        }
        debug!(rows = table.len(), schema = %self.schema.variant(), "Header valid");

        *stage = Stage::Normalizing;
        // Text cells such as "-6200000" only join the dataset-wide maxima once
        // they are numbers, so coercion comes before the rescale decision.
        let raw = normalize::coerce(table, &columns)?;
        let coordinates = normalize::normalize(raw, self.config.map.coordinate_scale)?;
        if coordinates.rescaled {
            info!(
                scale = self.config.map.coordinate_scale,
                "Coordinates were scaled integers; divided by scale"
            );
        }

        *stage = Stage::Rendering;
        let records = Record::from_table(table, &columns, &coordinates.points)?;
        let view = MapView::from_points(&coordinates.points, self.config.map.default_zoom)?;
        let markers: Vec<Marker> = records
            .iter()
            .map(|record| Marker::from_record(record, &self.classifier))
            .collect();

        MapDocument::render(&self.templates, &view, &markers, &self.config.map)
    }

    /// Atomically replace the output document.
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory cannot be created or the write fails.
    pub fn publish(&self, document: &MapDocument) -> Result<DocumentHandle> {
        create_dir(self.config.output_dir())?;
        document.write_to(&self.document_path())
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|source| Error::DirectoryCreate {
            path: dir.to_path_buf(),
            source,
        })?;
        debug!(path = %dir.display(), "Created directory");
    }
    Ok(())
}
