//! # Route Check
//!
//! Loads a route file, builds it and prints the resulting waypoints and legs.
//! Relative waypoints can be placed around a home given on the command line.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use color_eyre::{eyre::{eyre, WrapErr}, Result};
use std::path::PathBuf;
use structopt::StructOpt;

use guide_lib::route_mgr::{build::build_route, Route, RouteFile, WaypointMode};
use util::geo::{GeoPoint, Geodesy, GreatCircle};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "route_check", about = "Build a route file and print the result")]
struct Opts {
    /// Path to the route file
    #[structopt(parse(from_os_str))]
    route: PathBuf,

    /// Home to place relative waypoints around, as `lon,lat,azimuth` in degrees
    #[structopt(long)]
    home: Option<String>
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opts = Opts::from_args();
    let geo = GreatCircle::default();

    let file: RouteFile = util::params::load_path(&opts.route)
        .wrap_err_with(|| format!("Could not load the route file {:?}", opts.route))?;

    let mut route = Route::new();
    build_route(&file.entries, &mut route)
        .wrap_err("Could not build the route")?;

    if let Some(ref home) = opts.home {
        let (reference, azimuth_deg) = parse_home(home)?;
        route.refresh_offset_positions(&geo, &reference, azimuth_deg);
        println!(
            "Relative waypoints placed around ({:.6}, {:.6}), azimuth {:.1} deg\n",
            reference.lon_deg, reference.lat_deg, azimuth_deg
        );
    }

    println!("{:>4}  {:>12} {:>11}  {:>8} {:>8}  {:>8} {:>10}  {}",
        "wpt", "lon (deg)", "lat (deg)", "alt (m)", "agl (m)", "crs", "leg (m)", "id");

    let mut prev: Option<&GeoPoint> = None;
    for (i, wp) in route.waypoints().iter().enumerate() {
        let (crs, leg) = match prev {
            Some(p) => {
                let (c, d) = geo.course_and_distance(p, wp.target());
                (format!("{:8.1}", c), format!("{:10.1}", d))
            },
            None => (format!("{:>8}", "-"), format!("{:>10}", "-"))
        };

        let mode = match wp.mode() {
            WaypointMode::Absolute => "",
            WaypointMode::Relative => " (rel)"
        };

        println!("{:>4}  {:12.6} {:11.6}  {:8.1} {:8.1}  {} {}  {}{}",
            i,
            wp.target_lon_deg(),
            wp.target_lat_deg(),
            wp.target_alt_m(),
            wp.target_agl_m(),
            crs,
            leg,
            wp.id(),
            mode
        );

        prev = Some(wp.target());
    }

    println!(
        "\n{} waypoints, {:.1} m from the first to the last",
        route.size(),
        route.remaining_distance_from_current(&geo)
    );

    Ok(())
}

/// Parse a `lon,lat,azimuth` home string.
fn parse_home(s: &str) -> Result<(GeoPoint, f64)> {
    let fields = s
        .split(',')
        .map(|f| f.trim().parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .wrap_err_with(|| format!("Invalid home {:?}", s))?;

    match fields.as_slice() {
        [lon_deg, lat_deg, azimuth_deg] => Ok((GeoPoint::new(*lon_deg, *lat_deg), *azimuth_deg)),
        _ => Err(eyre!("Expected the home as lon,lat,azimuth, found {:?}", s))
    }
}
