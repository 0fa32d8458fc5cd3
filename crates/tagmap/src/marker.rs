//! Map markers.

use serde::Serialize;
use tera::escape_html;

use crate::record::{Classifier, MarkerColor, Record};

/// One point on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    /// Decimal degrees.
    pub lat: f64,
    /// Decimal degrees.
    pub lon: f64,
    /// Status color.
    pub color: MarkerColor,
    /// Fill color, as CSS.
    pub fill: &'static str,
    /// Popup body, HTML.
    pub popup: String,
}

impl Marker {
    /// Build the marker for a record.
    #[must_use]
    pub fn from_record(record: &Record, classifier: &Classifier) -> Self {
        let color = classifier.classify(&record.description);
        Self {
            lat: record.latitude,
            lon: record.longitude,
            color,
            fill: color.hex(),
            popup: popup_html(record),
        }
    }
}

/// Labeled popup lines, in display order. The name is the heading and has no label.
#[must_use]
pub fn popup_lines(record: &Record) -> Vec<(&'static str, &str)> {
    let mut lines = vec![
        ("Description", record.description.as_str()),
        ("Penanggung Jawab", record.penanggung_jawab.as_str()),
        ("Mulai Pekerjaan", record.mulai_pekerjaan.as_str()),
        ("Volume Scaffolding", record.volume_scaffolding.as_str()),
    ];
    let strict = [
        ("Tanggal SPK", &record.tanggal_spk),
        ("Group", &record.group),
        ("Progress", &record.progress),
        ("Area", &record.area),
    ];
    lines.extend(
        strict
            .into_iter()
            .filter_map(|(label, value)| value.as_deref().map(|v| (label, v))),
    );
    lines
}

/// Render the popup body. All values are HTML-escaped.
#[must_use]
pub fn popup_html(record: &Record) -> String {
    let mut html = format!("<b>{}</b>", escape_html(&record.name));
    for (label, value) in popup_lines(record) {
        html.push_str("<br><b>");
        html.push_str(label);
        html.push_str(":</b> ");
        html.push_str(&escape_html(value));
    }
    html
}
