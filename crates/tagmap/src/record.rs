//! Work-site records and marker classification.
//!
//! A [`Record`] is one validated spreadsheet row with its coordinates already
//! normalized. The [`Classifier`] turns a record's description into the
//! [`MarkerColor`] shown on the map.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::config::RuleConfig;
use crate::error::{Error, Result};
use crate::schema::Columns;
use crate::sheet::Table;

/// Marker color on the rendered map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerColor {
    /// Tagging done.
    Green,
    /// Tagging not done yet.
    Red,
    /// Unknown status.
    Blue,
    /// Extra color for custom rules.
    Orange,
    /// Extra color for custom rules.
    Purple,
    /// Extra color for custom rules.
    Gray,
}

impl MarkerColor {
    /// All colors, in legend order.
    pub const ALL: [MarkerColor; 6] = [
        Self::Green,
        Self::Red,
        Self::Blue,
        Self::Orange,
        Self::Purple,
        Self::Gray,
    ];

    /// CSS color used to fill the marker.
    #[must_use]
    pub fn hex(self) -> &'static str {
        match self {
            Self::Green => "#72b026",
            Self::Red => "#d63e2a",
            Self::Blue => "#38aadd",
            Self::Orange => "#f69730",
            Self::Purple => "#d252b9",
            Self::Gray => "#575757",
        }
    }
}

impl std::fmt::Display for MarkerColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Green => "green",
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Orange => "orange",
            Self::Purple => "purple",
            Self::Gray => "gray",
        };
        f.pad(name)
    }
}

/// Picks a marker color from a description.
///
/// Rules are tried in order and the first whose pattern occurs anywhere in
/// the description, ignoring case, decides the color.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<(Regex, MarkerColor)>,
    default: MarkerColor,
}

impl Classifier {
    /// Compile classification rules.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a pattern cannot be compiled.
    pub fn new(rules: &[RuleConfig], default: MarkerColor) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                RegexBuilder::new(&regex::escape(&rule.pattern))
                    .case_insensitive(true)
                    .build()
                    .map(|re| (re, rule.color))
                    .map_err(|e| Error::ConfigValidation {
                        message: format!("invalid classification pattern '{}': {e}", rule.pattern),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules, default })
    }

    /// Classify a description.
    #[must_use]
    pub fn classify(&self, description: &str) -> MarkerColor {
        self.rules
            .iter()
            .find(|(re, _)| re.is_match(description))
            .map_or(self.default, |(_, color)| *color)
    }
}

/// One work site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Site label.
    pub name: String,
    /// Decimal degrees.
    pub latitude: f64,
    /// Decimal degrees.
    pub longitude: f64,
    /// Free-text status description.
    pub description: String,
    /// Responsible party.
    pub penanggung_jawab: String,
    /// Work start date.
    pub mulai_pekerjaan: String,
    /// Scaffolding volume.
    pub volume_scaffolding: String,
    /// Work-order date (strict schema only).
    pub tanggal_spk: Option<String>,
    /// Work group (strict schema only).
    pub group: Option<String>,
    /// Progress (strict schema only).
    pub progress: Option<String>,
    /// Area (strict schema only).
    pub area: Option<String>,
}

impl Record {
    /// Assemble records from a validated table and its normalized coordinates.
    ///
    /// `coordinates` holds one `(latitude, longitude)` pair per table row.
    ///
    /// Only the name and description must be non-empty. The display columns
    /// must exist but their cells may be blank.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingValue`] if a row has an empty name or description.
    pub fn from_table(
        table: &Table,
        columns: &Columns,
        coordinates: &[(f64, f64)],
    ) -> Result<Vec<Self>> {
        if coordinates.len() != table.len() {
            return Err(Error::internal(format!(
                "{} coordinate pairs for {} rows",
                coordinates.len(),
                table.len()
            )));
        }

        table
            .rows()
            .iter()
            .zip(coordinates)
            .enumerate()
            .map(|(index, (row, &(latitude, longitude)))| {
                let row_number = index + 1;
                let text = |col: usize| row.get(col).map(ToString::to_string).unwrap_or_default();
                let required = |col: usize, name: &'static str| {
                    let value = text(col);
                    if value.trim().is_empty() {
                        Err(Error::MissingValue {
                            row: row_number,
                            column: name,
                        })
                    } else {
                        Ok(value)
                    }
                };

                Ok(Self {
                    name: required(columns.name, "name")?,
                    latitude,
                    longitude,
                    description: required(columns.description, "description")?,
                    penanggung_jawab: text(columns.penanggung_jawab),
                    mulai_pekerjaan: text(columns.mulai_pekerjaan),
                    volume_scaffolding: text(columns.volume_scaffolding),
                    tanggal_spk: columns.tanggal_spk.map(text),
                    group: columns.group.map(text),
                    progress: columns.progress.map(text),
                    area: columns.area.map(text),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::schema::{Schema, SchemaVariant};
    use crate::sheet::Cell;

    fn default_classifier() -> Classifier {
        let map = MapConfig::default();
        Classifier::new(&map.rules, map.default_color).unwrap()
    }

    #[test]
    fn test_marker_color_display() {
        assert_eq!(MarkerColor::Green.to_string(), "green");
        assert_eq!(MarkerColor::Red.to_string(), "red");
        assert_eq!(MarkerColor::Blue.to_string(), "blue");
        assert_eq!(format!("{:<6}|", MarkerColor::Red), "red   |");
    }

    #[test]
    fn test_marker_color_hex_is_distinct() {
        let mut seen = std::collections::HashSet::new();
        for color in MarkerColor::ALL {
            assert!(color.hex().starts_with('#'));
            assert!(seen.insert(color.hex()));
        }
    }

    #[test]
    fn test_classify_sudah_tagging() {
        let classifier = default_classifier();
        assert_eq!(
            classifier.classify("Sudah Tagging Selesai"),
            MarkerColor::Green
        );
    }

    #[test]
    fn test_classify_belum_tagging() {
        let classifier = default_classifier();
        assert_eq!(classifier.classify("Belum Tagging"), MarkerColor::Red);
        assert_eq!(
            classifier.classify("scaffold BELUM TAGGING minggu ini"),
            MarkerColor::Red
        );
    }

    #[test]
    fn test_classify_default() {
        let classifier = default_classifier();
        assert_eq!(classifier.classify("In Progress"), MarkerColor::Blue);
        assert_eq!(classifier.classify(""), MarkerColor::Blue);
    }

    #[test]
    fn test_classify_first_rule_wins() {
        let classifier = default_classifier();
        assert_eq!(
            classifier.classify("belum tagging, lalu sudah tagging"),
            MarkerColor::Green
        );
    }

    #[test]
    fn test_classify_patterns_are_literal() {
        let rules = vec![RuleConfig {
            pattern: "50% (done)".to_string(),
            color: MarkerColor::Orange,
        }];
        let classifier = Classifier::new(&rules, MarkerColor::Gray).unwrap();
        assert_eq!(classifier.classify("progress 50% (DONE)"), MarkerColor::Orange);
        assert_eq!(classifier.classify("progress 50 done"), MarkerColor::Gray);
    }

    #[test]
    fn test_from_table_builds_records() {
        let table = Table::new(
            Schema::new(SchemaVariant::Strict)
                .required()
                .iter()
                .map(ToString::to_string)
                .collect(),
            vec![vec![
                Cell::Text("Site A".to_string()),
                Cell::Number(-6.2),
                Cell::Number(106.8),
                Cell::Text("Sudah tagging".to_string()),
                Cell::Text("Budi".to_string()),
                Cell::Text("2024-01-15".to_string()),
                Cell::Number(120.0),
                Cell::Text("2024-01-10".to_string()),
                Cell::Text("G1".to_string()),
                Cell::Text("80%".to_string()),
                Cell::Text("North".to_string()),
            ]],
        );
        let columns = Schema::new(SchemaVariant::Strict).validate(&table).unwrap();

        let records = Record::from_table(&table, &columns, &[(-6.2, 106.8)]).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.name, "Site A");
        assert_eq!(record.volume_scaffolding, "120");
        assert_eq!(record.group.as_deref(), Some("G1"));
        assert_eq!(record.area.as_deref(), Some("North"));
    }

    #[test]
    fn test_from_table_allows_empty_display_fields() {
        let table = Table::new(
            Schema::new(SchemaVariant::Strict)
                .required()
                .iter()
                .map(ToString::to_string)
                .collect(),
            vec![vec![
                Cell::Text("Site A".to_string()),
                Cell::Number(-6.2),
                Cell::Number(106.8),
                Cell::Text("Belum tagging".to_string()),
                Cell::Empty,
                Cell::Empty,
                Cell::Empty,
            ]],
        );
        let columns = Schema::new(SchemaVariant::Strict).validate(&table).unwrap();

        let records = Record::from_table(&table, &columns, &[(-6.2, 106.8)]).unwrap();
        let record = &records[0];
        assert_eq!(record.penanggung_jawab, "");
        assert_eq!(record.volume_scaffolding, "");
        // Short rows read the missing trailing cells as empty.
        assert_eq!(record.area.as_deref(), Some(""));
    }

    #[test]
    fn test_from_table_rejects_empty_description() {
        let table = Table::new(
            Schema::new(SchemaVariant::Basic)
                .required()
                .iter()
                .map(ToString::to_string)
                .collect(),
            vec![vec![
                Cell::Text("Site A".to_string()),
                Cell::Number(1.0),
                Cell::Number(2.0),
                Cell::Empty,
            ]],
        );
        let columns = Schema::new(SchemaVariant::Basic).validate(&table).unwrap();

        let err = Record::from_table(&table, &columns, &[(1.0, 2.0)]).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingValue {
                row: 1,
                column: "description"
            }
        ));
    }
}
