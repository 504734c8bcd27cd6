//! Trajectory generation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use super::{Strategy, TerminalPolicy, TrajGenError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory generation
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Params {
    /// Number of points in every output path, and the length of the path
    /// state buffers.
    pub num_points: usize,

    /// Time between two consecutive path points.
    ///
    /// Units: seconds
    pub dt_s: f64,

    /// Duration of the jerk minimising manoeuvre.
    ///
    /// Units: seconds
    pub jmt_horizon_s: f64,

    /// Frenet `s` spacing between the forward waypoints of the local spline.
    /// Also the local x distance used to size the spline resampling step.
    ///
    /// Units: meters
    pub waypoint_spacing_m: f64,

    /// Number of forward waypoints added after the two anchor points.
    pub num_waypoints: usize,

    /// Width of a single lane.
    ///
    /// Units: meters
    pub lane_width_m: f64,

    /// Multiplier converting a requested target speed into meters/second.
    pub speed_conversion_factor: f64,

    /// Maximum allowed difference between the tracked graft point and the
    /// reported pose.
    ///
    /// Units: meters
    pub continuity_tolerance_m: f64,

    /// The strategy used to generate paths
    pub strategy: Strategy,

    /// The terminal state law used by the JMT strategy
    pub terminal_policy: TerminalPolicy,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            num_points: 50,
            dt_s: 0.02,
            jmt_horizon_s: 2.0,
            waypoint_spacing_m: 30.0,
            num_waypoints: 3,
            lane_width_m: 4.0,
            // mph -> m/s
            speed_conversion_factor: 0.44704,
            continuity_tolerance_m: 1e-6,
            strategy: Strategy::LocalSpline,
            terminal_policy: TerminalPolicy::HoldPosition,
        }
    }
}

impl Params {
    /// Load the parameters from a file relative to the params directory and
    /// check them.
    pub fn load(param_file_path: &str) -> Result<Self, TrajGenError> {
        let params: Self =
            util::params::load(param_file_path).map_err(TrajGenError::ParamLoadError)?;
        params.validate()?;
        Ok(params)
    }

    /// Lateral offset of the centre of the given lane.
    pub fn lane_centre_m(&self, lane: u32) -> f64 {
        self.lane_width_m * (lane as f64 + 0.5)
    }

    /// Convert a requested target speed into meters/second.
    pub fn target_speed_ms(&self, target_speed: f64) -> f64 {
        target_speed * self.speed_conversion_factor
    }

    /// Check that the parameters describe a usable generator.
    pub fn validate(&self) -> Result<(), TrajGenError> {
        let positive = [
            ("dt_s", self.dt_s),
            ("jmt_horizon_s", self.jmt_horizon_s),
            ("waypoint_spacing_m", self.waypoint_spacing_m),
            ("lane_width_m", self.lane_width_m),
            ("speed_conversion_factor", self.speed_conversion_factor),
        ];

        for (name, value) in positive.iter() {
            if !(value.is_finite() && *value > 0.0) {
                return Err(TrajGenError::InvalidParams(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }

        if self.num_points == 0 {
            return Err(TrajGenError::InvalidParams(
                "num_points must be at least 1".into(),
            ));
        }

        if self.num_waypoints == 0 {
            return Err(TrajGenError::InvalidParams(
                "num_waypoints must be at least 1".into(),
            ));
        }

        if !(self.continuity_tolerance_m >= 0.0) {
            return Err(TrajGenError::InvalidParams(format!(
                "continuity_tolerance_m must not be negative, got {}",
                self.continuity_tolerance_m
            )));
        }

        Ok(())
    }
}
