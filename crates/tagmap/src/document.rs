//! The generated map document.
//!
//! Markers, view and tile settings are serialized to one JSON payload that the
//! map template hands to Leaflet. The output file is replaced atomically: the
//! new document goes to a temporary file in the output directory which is then
//! renamed over the old one, so readers see either the old or the new map.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tera::escape_html;
use tracing::debug;

use crate::config::MapConfig;
use crate::error::{Error, Result};
use crate::html::Templates;
use crate::marker::Marker;
use crate::record::MarkerColor;
use crate::view::MapView;

/// Legend label for markers matching no rule.
const UNMATCHED_LABEL: &str = "other";

#[derive(Debug, Serialize)]
struct Payload<'a> {
    center: [f64; 2],
    zoom: u8,
    bounds: Option<[[f64; 2]; 2]>,
    tile_url: &'a str,
    attribution: &'a str,
    popup_max_width: u32,
    legend: Vec<LegendEntry>,
    markers: &'a [Marker],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct LegendEntry {
    fill: &'static str,
    label: String,
    count: usize,
}

/// A rendered, not yet written, map document.
#[derive(Debug, Clone)]
pub struct MapDocument {
    html: String,
    markers: usize,
    colors: Vec<(MarkerColor, usize)>,
}

impl MapDocument {
    /// Render the document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or templating fails.
    pub fn render(
        templates: &Templates,
        view: &MapView,
        markers: &[Marker],
        map: &MapConfig,
    ) -> Result<Self> {
        let colors = color_counts(markers);
        let payload = Payload {
            center: [view.center.0, view.center.1],
            zoom: view.zoom,
            bounds: view.bounds.map(|b| b.corners()),
            tile_url: &map.tile_url,
            attribution: &map.tile_attribution,
            popup_max_width: map.popup_max_width,
            legend: legend(&colors, map),
            markers,
        };
        let json = script_safe(&serde_json::to_string(&payload)?);
        let html = templates.map_document(&json)?;

        Ok(Self {
            html,
            markers: markers.len(),
            colors,
        })
    }

    /// The document text.
    #[must_use]
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Replace the file at `path` with this document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DocumentWrite`] if the temporary file cannot be written
    /// or renamed. The existing file is untouched in that case.
    pub fn write_to(&self, path: &Path) -> Result<DocumentHandle> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let write_err = |source| Error::DocumentWrite {
            path: path.to_path_buf(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(self.html.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;

        let handle = DocumentHandle {
            path: path.to_path_buf(),
            digest: digest(self.html.as_bytes()),
            bytes: self.html.len(),
            markers: self.markers,
            colors: self.colors.clone(),
        };
        debug!(path = %path.display(), bytes = handle.bytes, "Wrote map document");
        Ok(handle)
    }
}

/// A map document on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentHandle {
    /// Where the document lives.
    pub path: PathBuf,
    /// BLAKE3 hex digest of the contents.
    pub digest: String,
    /// Size in bytes.
    pub bytes: usize,
    /// Number of markers.
    pub markers: usize,
    /// Marker count per color, in legend order, zero counts omitted.
    pub colors: Vec<(MarkerColor, usize)>,
}

/// BLAKE3 hex digest of document bytes.
#[must_use]
pub fn digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Make JSON safe to embed inside a `<script>` element.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/").replace("<!--", "<\\!--")
}

fn color_counts(markers: &[Marker]) -> Vec<(MarkerColor, usize)> {
    MarkerColor::ALL
        .into_iter()
        .map(|color| (color, markers.iter().filter(|m| m.color == color).count()))
        .filter(|(_, count)| *count > 0)
        .collect()
}

fn legend(colors: &[(MarkerColor, usize)], map: &MapConfig) -> Vec<LegendEntry> {
    colors
        .iter()
        .map(|&(color, count)| {
            let patterns: Vec<&str> = map
                .rules
                .iter()
                .filter(|rule| rule.color == color)
                .map(|rule| rule.pattern.as_str())
                .collect();
            let label = if patterns.is_empty() {
                UNMATCHED_LABEL.to_string()
            } else {
                escape_html(&patterns.join(" / "))
            };
            LegendEntry {
                fill: color.hex(),
                label,
                count,
            }
        })
        .collect()
}
