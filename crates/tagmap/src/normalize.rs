//! Coordinate coercion and normalization.
//!
//! Some exports store coordinates as integers scaled by 10^6. Scaling is
//! decided once for the whole dataset from the largest absolute values, never
//! per row.

use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::Columns;
use crate::sheet::Table;

/// Largest valid absolute latitude.
pub const MAX_LATITUDE: f64 = 90.0;

/// Largest valid absolute longitude.
pub const MAX_LONGITUDE: f64 = 180.0;

/// Coordinates of every row, in decimal degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    /// One `(latitude, longitude)` pair per row.
    pub points: Vec<(f64, f64)>,
    /// Whether the scale divisor was applied.
    pub rescaled: bool,
}

/// Read the coordinate columns as numbers.
///
/// # Errors
///
/// Returns [`Error::Coercion`] for the first value that is empty or not numeric.
pub fn coerce(table: &Table, columns: &Columns) -> Result<Vec<(f64, f64)>> {
    (0..table.len())
        .map(|row| {
            let read = |column: usize, name: &'static str| {
                let cell = table.cell(row, column);
                cell.as_f64().ok_or_else(|| Error::Coercion {
                    row: row + 1,
                    column: name,
                    value: cell.to_string(),
                })
            };
            Ok((
                read(columns.latitude, "latitude")?,
                read(columns.longitude, "longitude")?,
            ))
        })
        .collect()
}

/// Check if the dataset holds scaled integer coordinates.
#[must_use]
pub fn needs_rescale(points: &[(f64, f64)]) -> bool {
    let max_lat = points.iter().map(|(lat, _)| lat.abs()).fold(0.0, f64::max);
    let max_lon = points.iter().map(|(_, lon)| lon.abs()).fold(0.0, f64::max);
    max_lat > MAX_LATITUDE || max_lon > MAX_LONGITUDE
}

/// Normalize raw coordinates to decimal degrees.
///
/// If any latitude exceeds ±90 or any longitude exceeds ±180, every value is
/// divided by `scale`. The result must then be in range.
///
/// # Errors
///
/// Returns [`Error::CoordinateRange`] for the first row still out of range.
pub fn normalize(mut points: Vec<(f64, f64)>, scale: f64) -> Result<Coordinates> {
    let rescaled = needs_rescale(&points);
    if rescaled {
        debug!(scale, rows = points.len(), "Rescaling coordinates");
        for (lat, lon) in &mut points {
            *lat /= scale;
            *lon /= scale;
        }
    }

    if let Some((index, &(latitude, longitude))) = points
        .iter()
        .enumerate()
        .find(|(_, (lat, lon))| lat.abs() > MAX_LATITUDE || lon.abs() > MAX_LONGITUDE)
    {
        return Err(Error::CoordinateRange {
            row: index + 1,
            latitude,
            longitude,
        });
    }

    Ok(Coordinates { points, rescaled })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Schema, SchemaVariant};
    use crate::sheet::Cell;

    fn table(rows: Vec<(Cell, Cell)>) -> (Table, Columns) {
        let schema = Schema::new(SchemaVariant::Basic);
        let headers = schema.required().iter().map(ToString::to_string).collect();
        let rows = rows
            .into_iter()
            .map(|(lat, lon)| vec![Cell::Text("site".to_string()), lat, lon])
            .collect();
        let table = Table::new(headers, rows);
        let columns = schema.validate(&table).unwrap();
        (table, columns)
    }

    #[test]
    fn test_coerce_numbers_and_text() {
        let (table, columns) = table(vec![
            (Cell::Number(-6.2), Cell::Number(106.8)),
            (Cell::Text("-7.25".to_string()), Cell::Text(" 112.75".to_string())),
        ]);
        let points = coerce(&table, &columns).unwrap();
        assert_eq!(points, vec![(-6.2, 106.8), (-7.25, 112.75)]);
    }

    #[test]
    fn test_coerce_rejects_text() {
        let (table, columns) = table(vec![
            (Cell::Number(1.0), Cell::Number(2.0)),
            (Cell::Number(1.0), Cell::Text("east".to_string())),
        ]);
        let err = coerce(&table, &columns).unwrap_err();
        match err {
            Error::Coercion { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, "longitude");
                assert_eq!(value, "east");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_coerce_rejects_empty() {
        let (table, columns) = table(vec![(Cell::Empty, Cell::Number(2.0))]);
        assert!(matches!(
            coerce(&table, &columns),
            Err(Error::Coercion {
                column: "latitude",
                ..
            })
        ));
    }

    #[test]
    fn test_scaled_text_is_rescaled_with_numbers() {
        // The maxima come from the text row, so both rows are divided.
        let (table, columns) = table(vec![
            (Cell::Number(-6.0), Cell::Number(106.0)),
            (Cell::Text("-6200000".to_string()), Cell::Text("106800000".to_string())),
        ]);
        let coords = normalize(coerce(&table, &columns).unwrap(), 1_000_000.0).unwrap();
        assert!(coords.rescaled);
        assert!((coords.points[1].0 - -6.2).abs() < 1e-9);
        assert!((coords.points[1].1 - 106.8).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_scaled_values() {
        let coords = normalize(vec![(90_000_000.0, 120_000_000.0)], 1_000_000.0).unwrap();
        assert!(coords.rescaled);
        assert_eq!(coords.points, vec![(90.0, 120.0)]);
    }

    #[test]
    fn test_normalize_is_all_or_nothing() {
        // Only the second row is scaled, but both are divided.
        let coords = normalize(
            vec![(-6.0, 106.0), (-6_200_000.0, 106_800_000.0)],
            1_000_000.0,
        )
        .unwrap();
        assert!(coords.rescaled);
        assert!((coords.points[0].0 - -0.000_006).abs() < 1e-12);
        assert!((coords.points[1].0 - -6.2).abs() < 1e-9);
        assert!((coords.points[1].1 - 106.8).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_longitude_only_triggers() {
        let coords = normalize(vec![(45.0, 181.0)], 1_000_000.0).unwrap();
        assert!(coords.rescaled);
    }

    #[test]
    fn test_normalize_leaves_valid_values() {
        let coords = normalize(vec![(90.0, -180.0), (-6.2, 106.8)], 1_000_000.0).unwrap();
        assert!(!coords.rescaled);
        assert_eq!(coords.points, vec![(90.0, -180.0), (-6.2, 106.8)]);
    }

    #[test]
    fn test_normalize_out_of_range_after_scaling() {
        let err = normalize(vec![(1.0, 2.0), (95_000_000_000.0, 0.0)], 1_000_000.0).unwrap_err();
        assert!(matches!(err, Error::CoordinateRange { row: 2, .. }));
    }

    #[test]
    fn test_needs_rescale_empty() {
        assert!(!needs_rescale(&[]));
    }
}
