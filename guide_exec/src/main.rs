//! Main guidance executable entry point.
//!
//! # Architecture
//!
//! The executable flies a simulated vehicle along a route at a fixed cycle
//! rate. Each cycle consists of:
//!
//!     - Route command processing (from the optional script)
//!     - Vehicle state acquisition from the simulation
//!     - Route manager processing
//!     - Bank demand selection and vehicle simulation
//!     - Archiving
//!
//! # Modules
//!
//! All modules (e.g. `route_mgr`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use guide_lib::{
    data_store::{DataStore, MAX_CONSEC_CYCLE_OVERRUNS},
    route_mgr::{self, RouteCmd},
    sim::{SimParams, SimVehicle}
};
use util::{
    archive::{Archived, Archiver},
    geo::GreatCircle,
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::{Pending, ScriptInterpreter},
    session::Session
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.10;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Command line options of the executable.
#[derive(Debug, StructOpt)]
#[structopt(name = "guide_exec", about = "Fly a simulated vehicle along a route")]
struct Opts {
    /// Route command script to run
    #[structopt(parse(from_os_str))]
    script: Option<PathBuf>,

    /// Route file to load at start up, relative to the params directory
    #[structopt(long, default_value = "route.toml")]
    route: String,

    /// Route manager parameter file, relative to the params directory
    #[structopt(long, default_value = "route_mgr.toml")]
    params: String,

    /// Simulation parameter file, relative to the params directory
    #[structopt(long, default_value = "sim.toml")]
    sim: String,

    /// Hold each cycle to the cycle period rather than running as fast as possible
    #[structopt(long)]
    realtime: bool,

    /// Trace every route manager cycle
    #[structopt(short, long)]
    verbose: bool
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "guide_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger, verbose mode traces every route manager cycle
    let module_levels: &[(&'static str, LevelFilter)] = if opts.verbose {
        &[("guide_lib::route_mgr", LevelFilter::Trace)]
    }
    else {
        &[]
    };
    logger_init(LevelFilter::Debug, module_levels, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Route Guidance Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opts);

    // ---- LOAD PARAMETERS ----

    let sim_params: SimParams = util::params::load(&opts.sim)
        .wrap_err("Could not load sim params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE SCRIPT ----

    let mut script: Option<ScriptInterpreter<RouteCmd>> = match opts.script {
        Some(ref path) => {
            info!("Loading script from {:?}", path);

            let si = ScriptInterpreter::<RouteCmd>::new(path)
                .wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} commands\n",
                si.get_duration(),
                si.get_num_cmds()
            );

            Some(si)
        },
        None => {
            info!("No script provided, the initial route will be flown\n");
            None
        }
    };

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.route_mgr.init(
        route_mgr::InitData {
            params_path: opts.params.clone(),
            route_path: Some(opts.route.clone())
        },
        &session
    ).wrap_err("Failed to initialise RouteMgr")?;
    info!("RouteMgr init complete");

    let geo = GreatCircle::default();
    let mut vehicle = SimVehicle::new(&sim_params);
    let mut arch_vehicle = Archiver::from_path(&session, "sim/vehicle.csv")
        .wrap_err("Failed to initialise the vehicle archive")?;
    info!("Simulated vehicle initialised");

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    while ds.sim_time_s < sim_params.duration_s {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ);

        // ---- COMMAND PROCESSING ----

        let mut end_of_script = false;

        if let Some(ref mut si) = script {
            match si.get_pending(ds.sim_time_s) {
                Pending::None => (),
                Pending::Some(cmds) => {
                    for cmd in cmds.iter() {
                        if let Err(e) = ds.route_mgr.handle_cmd(cmd) {
                            warn!("Could not execute route command {:?}: {}", cmd, e);
                        }
                    }
                },
                Pending::EndOfScript => {
                    info!("End of route script reached");
                    end_of_script = true;
                }
            }
        }

        if end_of_script {
            script = None;
        }

        // ---- DATA INPUT ----

        ds.route_mgr_input = vehicle.input_data(ds.sim_time_s, &sim_params);

        // ---- GUIDANCE PROCESSING ----

        match ds.route_mgr.proc(&ds.route_mgr_input) {
            Ok((o, r)) => {
                ds.route_mgr_output = o;
                ds.route_mgr_status_rpt = r;
            },
            Err(e) => warn!("Error during RouteMgr processing: {}", e)
        };

        ds.select_bank_dem(sim_params.loiter_bank_deg);

        // ---- VEHICLE SIMULATION ----

        vehicle.step(&geo, ds.bank_dem_deg, CYCLE_PERIOD_S);

        // ---- WRITE ARCHIVES ----

        if let Err(e) = ds.route_mgr.write() {
            warn!("Could not archive RouteMgr: {}", e);
        }
        if let Err(e) = arch_vehicle.serialise(vehicle.record(ds.sim_time_s, ds.bank_dem_deg)) {
            warn!("Could not archive the vehicle state: {}", e);
        }

        if ds.is_1_hz_cycle {
            info!(
                "t = {:6.1} s, wpt {}: {:.0} m (ETA {:.0} s), course {:.1} deg, xtrack {:.1} m, \
                bank {:.1} deg",
                ds.sim_time_s,
                ds.route_mgr_output.target_waypoint_idx,
                ds.route_mgr_output.wp_dist_m,
                ds.route_mgr_output.wp_eta_s,
                ds.route_mgr_output.target_course_deg,
                ds.route_mgr_output.xtrack_dist_m,
                ds.bank_dem_deg
            );
        }

        // ---- CYCLE MANAGEMENT ----

        if opts.realtime {
            let cycle_dur = Instant::now() - cycle_start_instant;

            // Get sleep duration
            let sleep = Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur);

            if sleep.is_none() {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
            }

            if ds.record_overrun(sleep.is_none()) {
                error!(
                    "More than {} consecutive cycle overruns, stopping",
                    MAX_CONSEC_CYCLE_OVERRUNS
                );
                break;
            }

            if let Some(d) = sleep {
                thread::sleep(d);
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    info!(
        "Simulation complete after {} cycles, {:.0} m of the route remaining",
        ds.num_cycles,
        ds.route_mgr_output.dist_remaining_m
    );

    session.save("route_mgr/final_route.json", ds.route_mgr.active_route().clone());
    session.exit();

    info!("End of execution");

    Ok(())
}
