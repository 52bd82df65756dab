//! Bounding-box geometry helpers
//!
//! Spherical degree-to-metre approximation, good enough for the sub-degree
//! monitoring regions this pipeline works with. Not a geodesy library.

use serde::{Deserialize, Serialize};

use crate::constants::{METERS_PER_DEG_LAT, SQM_PER_HECTARE};

/// Rectangle approximating a region's extent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

/// A coordinate point (lon, lat)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

/// Closed polygon ring (first point repeated last)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPolygon {
    pub ring: Vec<GeoPoint>,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self { min_lon, min_lat, max_lon, max_lat }
    }

    /// Approximate area in hectares, floored at 0.
    ///
    /// 1 deg of latitude ~ 111320 m; longitude scaled by cos(mean latitude).
    pub fn area_hectares(&self) -> f64 {
        let lat_span = self.max_lat - self.min_lat;
        let lon_span = self.max_lon - self.min_lon;
        let mean_lat = (self.min_lat + self.max_lat) / 2.0;

        let height_m = lat_span * METERS_PER_DEG_LAT;
        let width_m = lon_span * METERS_PER_DEG_LAT * mean_lat.to_radians().cos();

        (height_m * width_m / SQM_PER_HECTARE).max(0.0)
    }

    /// Midpoint of the lon/lat extents
    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            lon: (self.min_lon + self.max_lon) / 2.0,
            lat: (self.min_lat + self.max_lat) / 2.0,
        }
    }

    /// Closed 5-point ring: min/min -> max/min -> max/max -> min/max -> min/min
    pub fn to_polygon(&self) -> GeoPolygon {
        GeoPolygon {
            ring: vec![
                GeoPoint { lon: self.min_lon, lat: self.min_lat },
                GeoPoint { lon: self.max_lon, lat: self.min_lat },
                GeoPoint { lon: self.max_lon, lat: self.max_lat },
                GeoPoint { lon: self.min_lon, lat: self.max_lat },
                GeoPoint { lon: self.min_lon, lat: self.min_lat },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equatorial_degree_square() {
        // 1x1 degree at the equator: ~111320 m per side => ~1.239M ha
        let bbox = BoundingBox::new(0.0, -0.5, 1.0, 0.5);
        let ha = bbox.area_hectares();
        assert!((ha - 1_239_214.24).abs() / ha < 0.01, "got {}", ha);
    }

    #[test]
    fn test_area_never_negative() {
        // Inverted box degenerates to zero, not a negative area
        let bbox = BoundingBox::new(1.0, 1.0, 0.0, 2.0);
        assert!(bbox.area_hectares() >= 0.0);
    }

    #[test]
    fn test_polygon_ring_is_closed() {
        let bbox = BoundingBox::new(-50.0, -10.0, -49.0, -9.0);
        let poly = bbox.to_polygon();
        assert_eq!(poly.ring.len(), 5);
        assert_eq!(poly.ring[0], poly.ring[4]);
    }

    #[test]
    fn test_center() {
        let c = BoundingBox::new(-50.0, -10.0, -49.0, -9.0).center();
        assert_eq!(c.lon, -49.5);
        assert_eq!(c.lat, -9.5);
    }
}
