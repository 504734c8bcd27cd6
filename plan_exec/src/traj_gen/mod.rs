//! # Trajectory generation module
//!
//! Trajectory generation turns a requested target lane and speed into a fixed
//! length, time sampled Cartesian path for the downstream consumer. Every
//! cycle the consumer hands back the points it has not executed yet. These are
//! carried over unchanged to the front of the new path and only the tail is
//! recomputed, so that the vehicle never sees a jump in the part of the path
//! it is about to execute.
//!
//! Two strategies are provided, both implementing [`TrajectoryGenerator`]:
//!
//! - [`JmtGenerator`] plans in the Frenet frame with jerk minimising quintic
//!   polynomials, grafting each new plan onto the exact position, velocity and
//!   acceleration tracked for the last consumed point.
//! - [`LocalSplineGenerator`] fits a cubic spline through the tail of the
//!   previous path and a few waypoints ahead, in the vehicle's local frame,
//!   and resamples it to hit the target speed.
//!
//! [`TrajGen`] is the cyclic module which owns the selected strategy and the
//! map.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod cubic_spline;
pub mod jmt;
pub mod local_spline;
pub mod params;
pub mod path_state;
pub mod poly;
pub mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::{
    map::Map,
    path::{OutputPath, Path},
};
pub use cubic_spline::{CubicSpline, CubicSplineError};
pub use jmt::{JmtGenerator, TerminalPolicy};
pub use local_spline::{LocalAnchors, LocalSplineGenerator};
pub use params::Params;
pub use path_state::{MotionTriple, PathState};
pub use poly::{solve_jmt, QuinticCoeffs};
pub use state::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose of the vehicle, as reported by the localisation source.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EgoPose {
    /// Cartesian x position
    pub x_m: f64,

    /// Cartesian y position
    pub y_m: f64,

    /// Heading (angle to the +ve x axis)
    pub yaw_rad: f64,

    /// Frenet longitudinal position
    pub s_m: f64,

    /// Frenet lateral position
    pub d_m: f64,
}

/// The input to one planning cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Index of the lane to drive in, 0 being the lane at the lowest `d`
    pub target_lane: u32,

    /// Desired speed, in the units configured by
    /// `Params::speed_conversion_factor`
    pub target_speed: f64,

    /// Current pose of the vehicle
    pub pose: EgoPose,

    /// The points of the previous output which have not been executed yet
    pub previous_path: Path,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The available trajectory generation strategies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    Jmt,
    LocalSpline,
}

/// Potential errors that can occur during trajectory generation.
#[derive(Debug, thiserror::Error)]
pub enum TrajGenError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Could not create the archives: {0}")]
    ArchiveError(util::archive::ArchiveError),

    /// The tracked state of the graft point disagrees with the reported pose,
    /// meaning the tracker and the consumer are no longer in step.
    #[error(
        "Tracked state at graft index {index} (s = {tracked_s_m}, d = {tracked_d_m}) does not \
         match the reported pose (s = {pose_s_m}, d = {pose_d_m})"
    )]
    ContinuityViolation {
        index: usize,
        tracked_s_m: f64,
        tracked_d_m: f64,
        pose_s_m: f64,
        pose_d_m: f64,
    },

    /// The spline anchor points are not strictly increasing in local x.
    #[error("Spline anchor {index} (local x = {x_m}) does not follow its predecessor")]
    InvalidWaypoints { index: usize, x_m: f64 },

    #[error("Could not fit the local spline: {0}")]
    SplineFitError(CubicSplineError),

    /// The boundary value problem cannot be solved for this duration.
    #[error("Cannot solve the boundary value problem over a duration of {0} s")]
    InvalidDuration(f64),

    #[error("Previous path has {len} points, more than the horizon of {horizon}")]
    PreviousPathTooLong { len: usize, horizon: usize },

    #[error("Index {index} is outside the path state buffer of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The target speed cannot be used by the selected strategy, for example a
    /// non-positive speed when resampling the local spline.
    #[error("Invalid target speed: {0}")]
    InvalidTargetSpeed(f64),
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A strategy able to produce the next output path.
pub trait TrajectoryGenerator {
    /// Name of the strategy, used in logs.
    fn name(&self) -> &str;

    /// Generate the next output path.
    ///
    /// The returned path always holds exactly `Params::num_points` points, the
    /// first of which are the points of `req.previous_path`, unchanged.
    fn generate(
        &mut self,
        req: &PlanRequest,
        map: &dyn Map,
    ) -> Result<OutputPath, TrajGenError>;

    /// Forget any state carried between cycles. The next call to `generate`
    /// starts again from the reported pose.
    fn reset(&mut self);
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the generator implementing the given strategy.
pub fn new_generator(strategy: Strategy, params: &Params) -> Box<dyn TrajectoryGenerator> {
    match strategy {
        Strategy::Jmt => Box::new(JmtGenerator::new(params)),
        Strategy::LocalSpline => Box::new(LocalSplineGenerator::new(params)),
    }
}
