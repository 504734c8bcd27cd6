//! # Planning executable
//!
//! Runs the trajectory generator in closed loop against a straight road. A
//! simulated consumer executes a fixed number of points of each output path
//! and reports its new pose from the last executed point, handing the rest of
//! the path back to the generator on the next cycle.
//!
//! Usage: `plan_exec [PARAMS_FILE]`. Without an argument the parameters are
//! loaded from `$TRAJ_GEN_ROOT/params/traj_gen.toml`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::env;

use color_eyre::{eyre::WrapErr, Result};
use log::{debug, info, warn};
use nalgebra::Vector2;

use plan_lib::{
    map::{Map, StraightRoad},
    path::Path,
    traj_gen::{EgoPose, Params, PlanRequest, StatusReport, TrajGen, TrajGenError, TrajGenInitData},
};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of planning cycles to run.
const NUM_CYCLES: usize = 100;

/// Number of path points the simulated consumer executes every cycle.
const POINTS_PER_CYCLE: usize = 5;

/// Cycle on which the lane change is requested.
const LANE_CHANGE_CYCLE: usize = 50;

const START_LANE: u32 = 1;
const TARGET_LANE: u32 = 2;

/// Requested speed, in the units of `Params::speed_conversion_factor`.
const TARGET_SPEED: f64 = 49.0;

// ---------------------------------------------------------------------------
// MAIN
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    let session = Session::new("plan_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Planning Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    let params: Params = match args.get(1) {
        Some(path) => {
            info!("Loading parameters from \"{}\"", path);
            util::params::load_path(path).wrap_err("Could not load the parameters")?
        }
        None => Params::load("traj_gen.toml").wrap_err("Could not load the parameters")?,
    };

    // ---- MODULE INIT ----

    let road = StraightRoad::new(Vector2::new(0.0, 0.0), 0.0);

    let mut traj_gen = TrajGen::init(
        TrajGenInitData {
            params: params.clone(),
            map: Box::new(road),
        },
        Some(&session),
    )
    .wrap_err("Failed to initialise TrajGen")?;

    // Start at rest in the centre of the start lane
    let start_d_m = params.lane_centre_m(START_LANE);
    let start_m = road.frenet_to_cartesian_exact(0.0, start_d_m);
    let mut pose = EgoPose {
        x_m: start_m.x,
        y_m: start_m.y,
        yaw_rad: road.heading_rad,
        s_m: 0.0,
        d_m: start_d_m,
    };

    // ---- MAIN LOOP ----

    info!("Beginning main loop\n");

    let mut previous_path = Path::new_empty();
    let mut target_lane = START_LANE;
    let mut last_report = StatusReport::default();
    let mut num_resets = 0;
    let mut distance_m = 0.0;

    for cycle in 0..NUM_CYCLES {
        if cycle == LANE_CHANGE_CYCLE {
            info!("Requesting change to lane {}", TARGET_LANE);
            target_lane = TARGET_LANE;
        }

        let request = PlanRequest {
            target_lane,
            target_speed: TARGET_SPEED,
            pose,
            previous_path,
        };

        let (path, report) = match traj_gen.proc(&request) {
            Ok(o) => o,
            Err(TrajGenError::ContinuityViolation { .. }) => {
                warn!("Lost continuity on cycle {}, restarting from the pose", cycle);
                num_resets += 1;
                traj_gen.reset();
                traj_gen
                    .proc(&request)
                    .wrap_err("Trajectory generation failed after reset")?
            }
            Err(e) => return Err(e).wrap_err("Trajectory generation failed"),
        };

        // ---- SIMULATED CONSUMER ----

        let executed = POINTS_PER_CYCLE.min(path.get_num_points());

        if executed > 0 {
            let last_m = path.points_m[executed - 1];
            let (s_m, d_m) = road.cartesian_to_frenet(&last_m);

            let yaw_rad = path
                .get_segment_to_target(executed - 1)
                .filter(|seg| seg.length_m > 0.0)
                .map(|seg| seg.heading_rad)
                .unwrap_or(pose.yaw_rad);

            distance_m += (last_m - Vector2::new(pose.x_m, pose.y_m)).norm();

            pose = EgoPose {
                x_m: last_m.x,
                y_m: last_m.y,
                yaw_rad,
                s_m,
                d_m,
            };
        }

        previous_path = path.remainder(executed);
        last_report = report;
    }

    // ---- SUMMARY ----

    info!("Main loop complete\n");
    info!(
        "{} cycles, {} resets, {:.2} m travelled, final pose s = {:.2} m, d = {:.2} m",
        NUM_CYCLES, num_resets, distance_m, pose.s_m, pose.d_m
    );
    info!(
        "Final status report: {}",
        serde_json::to_string(&last_report).wrap_err("Could not serialise the status report")?
    );

    Ok(())
}
