//! # Waypoint
//!
//! A waypoint is a target point on the earth plus navigation metadata. It is
//! either defined absolutely (longitude and latitude) or relative to a
//! reference point as a heading offset and distance. Relative waypoints only
//! get a real location once the route is repositioned around a reference.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// Internal
use super::FEET_TO_METERS;
use util::geo::{GeoPoint, Geodesy};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Sentinel value marking an altitude as not set.
///
/// Units: meters
pub const ALT_UNSET_M: f64 = -9999.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single target point of a route.
///
/// Waypoints are immutable once built, repositioning produces a new waypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    mode: WaypointMode,

    target: GeoPoint,

    target_alt_m: f64,

    target_agl_m: f64,

    target_speed_kt: f64,

    offset_hdg_deg: f64,

    offset_dist_m: f64,

    id: String
}

/// The definition of a waypoint as found in a route file.
///
/// Altitudes are given in feet as this is how routes are planned, they are
/// converted into meters when the waypoint is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaypointSpec {
    #[serde(default)]
    pub mode: WaypointMode,

    #[serde(default)]
    pub lon_deg: f64,

    #[serde(default)]
    pub lat_deg: f64,

    pub alt_ft: Option<f64>,

    pub agl_ft: Option<f64>,

    pub speed_kt: Option<f64>,

    /// Heading offset from the reference azimuth, relative waypoints only.
    #[serde(default)]
    pub offset_heading_deg: f64,

    /// Distance from the reference, relative waypoints only.
    #[serde(default)]
    pub offset_dist_m: f64,

    pub id: Option<String>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How the location of a waypoint is defined.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaypointMode {
    /// Fixed longitude and latitude.
    Absolute,

    /// Heading offset and distance from a reference point.
    Relative
}

#[derive(Debug, thiserror::Error)]
pub enum WaypointError {
    #[error("Waypoint field `{0}` is not a finite number")]
    NonFinite(&'static str),

    #[error("Relative waypoint has a negative offset distance ({0} m)")]
    NegativeOffset(f64)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Waypoint {
    /// Create a new waypoint.
    ///
    /// For `Absolute` waypoints `field1` and `field2` are the longitude and
    /// latitude in degrees. For `Relative` waypoints they are the heading
    /// offset (degrees) and the distance (meters) from the reference.
    pub fn new(
        field1: f64,
        field2: f64,
        target_alt_m: f64,
        target_agl_m: f64,
        target_speed_kt: f64,
        mode: WaypointMode,
        id: &str
    ) -> Self {
        let (target, offset_hdg_deg, offset_dist_m) = match mode {
            WaypointMode::Absolute => (GeoPoint::new(field1, field2), 0.0, 0.0),
            WaypointMode::Relative => (GeoPoint::default(), field1, field2)
        };

        Self {
            mode,
            target,
            target_alt_m,
            target_agl_m,
            target_speed_kt,
            offset_hdg_deg,
            offset_dist_m,
            id: id.to_string()
        }
    }

    /// Create an absolute waypoint with no altitude or speed targets.
    pub fn at(lon_deg: f64, lat_deg: f64) -> Self {
        Self::new(
            lon_deg, lat_deg, ALT_UNSET_M, ALT_UNSET_M, 0.0, WaypointMode::Absolute, ""
        )
    }

    /// Create a waypoint from the ad-hoc re-tasking fields.
    ///
    /// For `Relative` waypoints `field1` is the distance (meters) and
    /// `field2` the heading offset (degrees), for `Absolute` waypoints they
    /// are the longitude and latitude. `alt_m` is a height above ground.
    pub fn from_fields(field1: f64, field2: f64, alt_m: f64, mode: WaypointMode) -> Self {
        match mode {
            WaypointMode::Relative => Self::new(
                field2, field1, ALT_UNSET_M, alt_m, 0.0, mode, ""
            ),
            WaypointMode::Absolute => Self::new(
                field1, field2, ALT_UNSET_M, alt_m, 0.0, mode, ""
            )
        }
    }

    /// Return a copy of this waypoint placed relative to `reference`.
    ///
    /// Absolute waypoints are returned unchanged. The target of a relative
    /// waypoint is projected `offset_dist_m` along `ref_heading_deg +
    /// offset_hdg_deg` from the reference.
    pub fn resolved<G: Geodesy>(
        &self,
        geo: &G,
        reference: &GeoPoint,
        ref_heading_deg: f64
    ) -> Self {
        match self.mode {
            WaypointMode::Absolute => self.clone(),
            WaypointMode::Relative => {
                let course_deg = ref_heading_deg + self.offset_hdg_deg;
                let mut wp = self.clone();
                wp.target = geo.direct(reference, course_deg, self.offset_dist_m);
                wp
            }
        }
    }

    pub fn mode(&self) -> WaypointMode {
        self.mode
    }

    /// Target location of the waypoint.
    pub fn target(&self) -> &GeoPoint {
        &self.target
    }

    pub fn target_lon_deg(&self) -> f64 {
        self.target.lon_deg
    }

    pub fn target_lat_deg(&self) -> f64 {
        self.target.lat_deg
    }

    /// Target altitude above mean sea level, or `ALT_UNSET_M`.
    pub fn target_alt_m(&self) -> f64 {
        self.target_alt_m
    }

    /// Target altitude above ground level, or `ALT_UNSET_M`.
    pub fn target_agl_m(&self) -> f64 {
        self.target_agl_m
    }

    /// Target speed in knots, zero if unset.
    pub fn target_speed_kt(&self) -> f64 {
        self.target_speed_kt
    }

    pub fn offset_hdg_deg(&self) -> f64 {
        self.offset_hdg_deg
    }

    pub fn offset_dist_m(&self) -> f64 {
        self.offset_dist_m
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Parse the compact `<lon>,<lat>[@<alt_ft>]` form.
///
/// The parse is lenient: each number is read from the longest numeric prefix
/// of its field (zero if there is none), and text without a comma gives a
/// waypoint at (0, 0).
impl FromStr for Waypoint {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut target = s;
        let mut alt_m = ALT_UNSET_M;

        if let Some(pos) = target.find('@') {
            alt_m = lenient_f64(&target[pos + 1..]) * FEET_TO_METERS;
            target = &target[..pos];
        }

        let (lon_deg, lat_deg) = match target.find(',') {
            Some(pos) => (lenient_f64(&target[..pos]), lenient_f64(&target[pos + 1..])),
            None => (0.0, 0.0)
        };

        debug!(
            "Parsed waypoint lon = {:.6} lat = {:.6} alt_m = {:.0}",
            lon_deg, lat_deg, alt_m
        );

        Ok(Self::new(
            lon_deg, lat_deg, alt_m, ALT_UNSET_M, 0.0, WaypointMode::Absolute, ""
        ))
    }
}

impl std::convert::TryFrom<&WaypointSpec> for Waypoint {
    type Error = WaypointError;

    fn try_from(spec: &WaypointSpec) -> Result<Self, Self::Error> {
        let alt_m = feet_or_unset(spec.alt_ft, "alt_ft")?;
        let agl_m = feet_or_unset(spec.agl_ft, "agl_ft")?;
        let speed_kt = spec.speed_kt.unwrap_or(0.0);
        if !speed_kt.is_finite() {
            return Err(WaypointError::NonFinite("speed_kt"));
        }
        let id = spec.id.as_deref().unwrap_or("");

        match spec.mode {
            WaypointMode::Absolute => {
                if !spec.lon_deg.is_finite() {
                    return Err(WaypointError::NonFinite("lon_deg"));
                }
                if !spec.lat_deg.is_finite() {
                    return Err(WaypointError::NonFinite("lat_deg"));
                }
                Ok(Self::new(
                    spec.lon_deg, spec.lat_deg, alt_m, agl_m, speed_kt, spec.mode, id
                ))
            },
            WaypointMode::Relative => {
                if !spec.offset_heading_deg.is_finite() {
                    return Err(WaypointError::NonFinite("offset_heading_deg"));
                }
                if !spec.offset_dist_m.is_finite() {
                    return Err(WaypointError::NonFinite("offset_dist_m"));
                }
                if spec.offset_dist_m < 0.0 {
                    return Err(WaypointError::NegativeOffset(spec.offset_dist_m));
                }
                Ok(Self::new(
                    spec.offset_heading_deg, spec.offset_dist_m,
                    alt_m, agl_m, speed_kt, spec.mode, id
                ))
            }
        }
    }
}

impl Default for WaypointMode {
    fn default() -> Self {
        WaypointMode::Absolute
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert an optional altitude in feet into meters, using the unset sentinel
/// for `None`.
fn feet_or_unset(value_ft: Option<f64>, field: &'static str) -> Result<f64, WaypointError> {
    match value_ft {
        Some(ft) if !ft.is_finite() => Err(WaypointError::NonFinite(field)),
        Some(ft) => Ok(ft * FEET_TO_METERS),
        None => Ok(ALT_UNSET_M)
    }
}

/// Read the longest numeric prefix of `s`, ignoring leading whitespace.
///
/// The prefix is `[+-]digits[.digits][(e|E)[+-]digits]` with at least one
/// mantissa digit. Returns zero if there is no such prefix or it overflows.
fn lenient_f64(s: &str) -> f64 {
    let bytes = s.trim_start().as_bytes();

    let skip_digits = |from: usize| {
        from + bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count()
    };
    let skip_sign = |from: usize| match bytes.get(from) {
        Some(b'+') | Some(b'-') => from + 1,
        _ => from
    };

    let int_start = skip_sign(0);
    let mut end = skip_digits(int_start);
    let mut num_digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = skip_digits(end + 1);
        num_digits += frac_end - end - 1;
        end = frac_end;
    }

    if num_digits == 0 {
        return 0.0;
    }

    // Exponent only counts if it has digits
    if let Some(b'e') | Some(b'E') = bytes.get(end) {
        let exp_start = skip_sign(end + 1);
        let exp_end = skip_digits(exp_start);
        if exp_end > exp_start {
            end = exp_end;
        }
    }

    // The prefix is pure ASCII so always valid UTF-8
    std::str::from_utf8(&bytes[..end])
        .ok()
        .and_then(|p| p.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::convert::TryFrom;
    use util::geo::GreatCircle;

    #[test]
    fn test_parse_compact() {
        let wp: Waypoint = "10.0,45.0@1000".parse().unwrap();

        assert_eq!(wp.target_lon_deg(), 10.0);
        assert_eq!(wp.target_lat_deg(), 45.0);
        assert!((wp.target_alt_m() - 304.8).abs() < 1e-9);
        assert_eq!(wp.target_agl_m(), ALT_UNSET_M);
        assert_eq!(wp.mode(), WaypointMode::Absolute);
    }

    #[test]
    fn test_parse_without_altitude() {
        let wp: Waypoint = "-122.375,37.619".parse().unwrap();

        assert_eq!(wp.target_lon_deg(), -122.375);
        assert_eq!(wp.target_lat_deg(), 37.619);
        assert_eq!(wp.target_alt_m(), ALT_UNSET_M);
    }

    #[test]
    fn test_parse_legacy_malformed() {
        // No comma, the location falls back to (0, 0) but the altitude is kept
        let wp: Waypoint = "garbage@500".parse().unwrap();
        assert_eq!(wp.target_lon_deg(), 0.0);
        assert_eq!(wp.target_lat_deg(), 0.0);
        assert!((wp.target_alt_m() - 152.4).abs() < 1e-9);

        // Trailing junk after the numbers is ignored
        let wp: Waypoint = " 12.5deg, -3.25xyz".parse().unwrap();
        assert_eq!(wp.target_lon_deg(), 12.5);
        assert_eq!(wp.target_lat_deg(), -3.25);

        // Non-numeric fields read as zero
        let wp: Waypoint = "abc,def".parse().unwrap();
        assert_eq!(wp.target_lon_deg(), 0.0);
        assert_eq!(wp.target_lat_deg(), 0.0);
    }

    #[test]
    fn test_lenient_f64() {
        assert_eq!(lenient_f64("1.5e2"), 150.0);
        assert_eq!(lenient_f64("  -7"), -7.0);
        assert_eq!(lenient_f64("3.°"), 3.0);
        assert_eq!(lenient_f64(""), 0.0);
        // "inf" and "nan" are not accepted as numbers
        assert_eq!(lenient_f64("nan"), 0.0);
        assert_eq!(lenient_f64("1e"), 1.0);
        assert_eq!(lenient_f64("2.5E-1x"), 0.25);
        assert_eq!(lenient_f64("-.5"), -0.5);
        assert_eq!(lenient_f64("+."), 0.0);
    }

    #[test]
    fn test_lenient_f64_long_field() {
        // Long fields are read in a single pass over the text
        let field = format!("2.{}5{}", "0".repeat(200_000), "x".repeat(200_000));
        assert_eq!(lenient_f64(&field), 2.0);

        let wp: Waypoint = format!("1.0,{}{}", "9".repeat(20_000), "x".repeat(20_000))
            .parse()
            .unwrap();
        assert_eq!(wp.target_lon_deg(), 1.0);
        // Too big to be a latitude, or a finite number at all
        assert_eq!(wp.target_lat_deg(), 0.0);
    }

    #[test]
    fn test_from_fields() {
        let wp = Waypoint::from_fields(-93.1, 45.2, 120.0, WaypointMode::Absolute);
        assert_eq!(wp.target_lon_deg(), -93.1);
        assert_eq!(wp.target_lat_deg(), 45.2);
        assert_eq!(wp.target_agl_m(), 120.0);

        // Relative fields are distance first
        let wp = Waypoint::from_fields(400.0, 90.0, 60.0, WaypointMode::Relative);
        assert_eq!(wp.offset_dist_m(), 400.0);
        assert_eq!(wp.offset_hdg_deg(), 90.0);
        assert_eq!(wp.mode(), WaypointMode::Relative);
    }

    #[test]
    fn test_spec_conversion() {
        let spec = WaypointSpec {
            lon_deg: 1.0,
            lat_deg: 2.0,
            alt_ft: Some(100.0),
            id: Some(String::from("alpha")),
            ..Default::default()
        };
        let wp = Waypoint::try_from(&spec).unwrap();
        assert_eq!(wp.target(), &GeoPoint::new(1.0, 2.0));
        assert!((wp.target_alt_m() - 30.48).abs() < 1e-9);
        assert_eq!(wp.target_agl_m(), ALT_UNSET_M);
        assert_eq!(wp.id(), "alpha");

        let bad = WaypointSpec {
            mode: WaypointMode::Relative,
            offset_dist_m: -10.0,
            ..Default::default()
        };
        assert!(matches!(
            Waypoint::try_from(&bad),
            Err(WaypointError::NegativeOffset(_))
        ));

        let bad = WaypointSpec {
            lat_deg: std::f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            Waypoint::try_from(&bad),
            Err(WaypointError::NonFinite("lat_deg"))
        ));
    }

    #[test]
    fn test_resolve_relative() {
        let geo = GreatCircle::default();
        let home = GeoPoint::new(0.0, 0.0);

        // 90 deg offset from a north facing reference puts the point due east
        let wp = Waypoint::new(90.0, 1000.0, ALT_UNSET_M, 50.0, 0.0, WaypointMode::Relative, "");
        let placed = wp.resolved(&geo, &home, 0.0);

        let (crs, dist) = geo.course_and_distance(&home, placed.target());
        assert!((crs - 90.0).abs() < 1e-6);
        assert!((dist - 1000.0).abs() < 1e-6);
        assert_eq!(placed.target_agl_m(), 50.0);

        // Absolute points never move
        let abs = Waypoint::at(5.0, 5.0);
        assert_eq!(abs.resolved(&geo, &home, 45.0), abs);
    }
}
