//! # Map
//!
//! The road geometry collaborator used by trajectory generation. The planner
//! only needs Frenet to Cartesian conversions, which are exposed through the
//! [`Map`] trait. A full waypoint map lives outside this crate; [`StraightRoad`]
//! is provided for the executable, benches and tests.
//!
//! Frenet convention: `s` is the arc length along the road centreline, `d` is
//! the lateral offset, positive to the right of the direction of travel.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Road geometry able to convert Frenet coordinates into Cartesian ones.
///
/// Both conversions must be pure, non-blocking lookups.
pub trait Map {
    /// Nearest-waypoint conversion, used for the coarse spline waypoints.
    fn frenet_to_cartesian_exact(&self, s_m: f64, d_m: f64) -> Vector2<f64>;

    /// Interpolated conversion, used for dense per-sample output.
    fn frenet_to_cartesian_smooth(&self, s_m: f64, d_m: f64) -> Vector2<f64>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A perfectly straight road, for which both conversions are exact.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct StraightRoad {
    /// Cartesian position of `s = 0, d = 0`
    pub origin_m: Vector2<f64>,

    /// Heading of the centreline (angle to the +ve x axis)
    pub heading_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StraightRoad {
    pub fn new(origin_m: Vector2<f64>, heading_rad: f64) -> Self {
        Self {
            origin_m,
            heading_rad,
        }
    }

    /// Unit vector along the direction of travel
    fn tangent(&self) -> Vector2<f64> {
        Vector2::new(self.heading_rad.cos(), self.heading_rad.sin())
    }

    /// Unit vector pointing to the right of the direction of travel
    fn normal(&self) -> Vector2<f64> {
        Vector2::new(self.heading_rad.sin(), -self.heading_rad.cos())
    }

    /// Convert a Cartesian point back into `(s, d)`.
    pub fn cartesian_to_frenet(&self, point_m: &Vector2<f64>) -> (f64, f64) {
        let rel = point_m - self.origin_m;
        (rel.dot(&self.tangent()), rel.dot(&self.normal()))
    }
}

impl Map for StraightRoad {
    fn frenet_to_cartesian_exact(&self, s_m: f64, d_m: f64) -> Vector2<f64> {
        self.origin_m + s_m * self.tangent() + d_m * self.normal()
    }

    fn frenet_to_cartesian_smooth(&self, s_m: f64, d_m: f64) -> Vector2<f64> {
        self.frenet_to_cartesian_exact(s_m, d_m)
    }
}
