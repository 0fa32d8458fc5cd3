//! Initial map viewport.

use serde::Serialize;

use crate::error::{Error, Result};

/// Bounding box as `[[south, west], [north, east]]`, the order Leaflet takes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    /// Smallest latitude.
    pub south: f64,
    /// Smallest longitude.
    pub west: f64,
    /// Largest latitude.
    pub north: f64,
    /// Largest longitude.
    pub east: f64,
}

impl Bounds {
    /// Leaflet `LatLngBounds` literal.
    #[must_use]
    pub fn corners(&self) -> [[f64; 2]; 2] {
        [[self.south, self.west], [self.north, self.east]]
    }
}

/// Where the map opens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    /// Mean `(latitude, longitude)` of all points.
    pub center: (f64, f64),
    /// Zoom used before any bounds fitting.
    pub zoom: u8,
    /// Present when there is more than one point.
    pub bounds: Option<Bounds>,
}

impl MapView {
    /// Compute the view for a set of points.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyDataset`] when there are no points.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_points(points: &[(f64, f64)], zoom: u8) -> Result<Self> {
        let Some(&first) = points.first() else {
            return Err(Error::EmptyDataset);
        };

        let n = points.len() as f64;
        let (sum_lat, sum_lon) = points
            .iter()
            .fold((0.0, 0.0), |(a, b), (lat, lon)| (a + lat, b + lon));
        let center = (sum_lat / n, sum_lon / n);

        let bounds = (points.len() > 1).then(|| {
            points.iter().fold(
                Bounds {
                    south: first.0,
                    west: first.1,
                    north: first.0,
                    east: first.1,
                },
                |b, &(lat, lon)| Bounds {
                    south: b.south.min(lat),
                    west: b.west.min(lon),
                    north: b.north.max(lat),
                    east: b.east.max(lon),
                },
            )
        });

        Ok(Self {
            center,
            zoom,
            bounds,
        })
    }
}
