//! # Geodesy
//!
//! Course and distance between geographic points, and the inverse problem of projecting a point
//! along a course. Guidance code reaches these through the [`Geodesy`] trait so the earth model
//! can be swapped out (or mocked) without touching the navigation laws.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::maths::wrap_360;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Mean radius of the earth (IUGG).
///
/// Units: meters
pub const EARTH_MEAN_RADIUS_M: f64 = 6_371_008.8;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A point on the surface of the earth.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Longitude, positive east.
    ///
    /// Units: degrees
    pub lon_deg: f64,

    /// Latitude, positive north.
    ///
    /// Units: degrees
    pub lat_deg: f64
}

/// Spherical earth model using great circle navigation.
#[derive(Debug, Copy, Clone)]
pub struct GreatCircle {
    radius_m: f64
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Geodesy calculations required by the guidance laws.
pub trait Geodesy {
    /// Get the initial course (degrees true, [0, 360)) and distance (meters) to travel from
    /// `from` to `to`.
    fn course_and_distance(&self, from: &GeoPoint, to: &GeoPoint) -> (f64, f64);

    /// Get the point reached by travelling `dist_m` meters from `from` along the initial course
    /// `course_deg`.
    fn direct(&self, from: &GeoPoint, course_deg: f64, dist_m: f64) -> GeoPoint;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GeoPoint {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }
}

impl GreatCircle {
    /// Create a model with a custom sphere radius.
    pub fn with_radius(radius_m: f64) -> Self {
        Self { radius_m }
    }
}

impl Default for GreatCircle {
    fn default() -> Self {
        Self::with_radius(EARTH_MEAN_RADIUS_M)
    }
}

impl Geodesy for GreatCircle {
    fn course_and_distance(&self, from: &GeoPoint, to: &GeoPoint) -> (f64, f64) {
        let lat_0 = from.lat_deg.to_radians();
        let lat_1 = to.lat_deg.to_radians();
        let d_lat = lat_1 - lat_0;
        let d_lon = (to.lon_deg - from.lon_deg).to_radians();

        // Haversine distance, the argument of the sqrt is clamped so that numerical noise on
        // antipodal points can't produce a NaN.
        let a = (d_lat / 2.0).sin().powi(2)
            + lat_0.cos() * lat_1.cos() * (d_lon / 2.0).sin().powi(2);
        let dist_m = 2.0 * self.radius_m * a.min(1.0).sqrt().asin();

        // Initial bearing
        let y = d_lon.sin() * lat_1.cos();
        let x = lat_0.cos() * lat_1.sin() - lat_0.sin() * lat_1.cos() * d_lon.cos();
        let course_deg = if dist_m > 0.0 {
            wrap_360(y.atan2(x).to_degrees())
        }
        else {
            0.0
        };

        (course_deg, dist_m)
    }

    fn direct(&self, from: &GeoPoint, course_deg: f64, dist_m: f64) -> GeoPoint {
        let lat_0 = from.lat_deg.to_radians();
        let lon_0 = from.lon_deg.to_radians();
        let crs = course_deg.to_radians();
        let ang = dist_m / self.radius_m;

        let lat_1 = (lat_0.sin() * ang.cos() + lat_0.cos() * ang.sin() * crs.cos())
            .max(-1.0)
            .min(1.0)
            .asin();
        let lon_1 = lon_0
            + (crs.sin() * ang.sin() * lat_0.cos())
                .atan2(ang.cos() - lat_0.sin() * lat_1.sin());

        GeoPoint {
            // Normalise longitude into [-180, 180)
            lon_deg: wrap_360(lon_1.to_degrees() + 180.0) - 180.0,
            lat_deg: lat_1.to_degrees()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cardinal_courses() {
        let geo = GreatCircle::default();
        let origin = GeoPoint::new(0.0, 0.0);

        let (crs, dist) = geo.course_and_distance(&origin, &GeoPoint::new(0.0, 1.0));
        assert!(crs.abs() < 1e-9);
        // One degree of arc on the mean sphere
        assert!((dist - 111_195.08).abs() < 0.1);

        let (crs, _) = geo.course_and_distance(&origin, &GeoPoint::new(1.0, 0.0));
        assert!((crs - 90.0).abs() < 1e-9);

        let (crs, _) = geo.course_and_distance(&origin, &GeoPoint::new(0.0, -1.0));
        assert!((crs - 180.0).abs() < 1e-9);

        let (crs, _) = geo.course_and_distance(&origin, &GeoPoint::new(-1.0, 0.0));
        assert!((crs - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_coincident_points() {
        let geo = GreatCircle::default();
        let p = GeoPoint::new(-122.3, 37.4);
        let (crs, dist) = geo.course_and_distance(&p, &p);
        assert_eq!(dist, 0.0);
        assert_eq!(crs, 0.0);
    }

    #[test]
    fn test_direct_inverts_course_and_distance() {
        let geo = GreatCircle::default();
        let from = GeoPoint::new(-93.15, 45.21);

        let to = geo.direct(&from, 37.0, 1500.0);
        let (crs, dist) = geo.course_and_distance(&from, &to);

        assert!((crs - 37.0).abs() < 1e-6);
        assert!((dist - 1500.0).abs() < 1e-6);
    }
}
