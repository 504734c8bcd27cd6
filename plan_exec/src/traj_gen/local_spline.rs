//! # Local spline trajectory generator
//!
//! Fits a cubic spline through the last two points of the previous path and a
//! few waypoints ahead in the target lane. The fit is done in a local frame
//! centred on the last anchor and aligned with its heading, so the spline is a
//! function `y = f(x)` pointing forwards. The spline is then sampled so that
//! consecutive points are one time step apart at the target speed.
//!
//! The generator carries no state between cycles.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use nalgebra::Vector2;
use util::maths::{to_local_frame, to_parent_frame};

// Internal
use super::{CubicSpline, CubicSplineError, Params, PlanRequest, TrajGenError, TrajectoryGenerator};
use crate::{
    map::Map,
    path::{OutputPath, Path},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Trajectory generator sampling a cubic spline in the vehicle's local frame.
pub struct LocalSplineGenerator {
    params: Params,
}

/// The spline anchor points and the frame they are expressed in.
#[derive(Debug, Clone)]
pub struct LocalAnchors {
    /// Origin of the local frame in the parent frame
    pub origin_m: Vector2<f64>,

    /// Heading of the local frame's x axis in the parent frame
    pub yaw_rad: f64,

    /// Anchor points in the local frame, the two path anchors first
    pub local_m: Vec<Vector2<f64>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LocalSplineGenerator {
    pub fn new(params: &Params) -> Self {
        Self {
            params: params.clone(),
        }
    }

    /// Build the spline anchor points for this request.
    ///
    /// With fewer than two previous points the anchors are a point one meter
    /// behind the pose and the pose itself. Otherwise the last two previous
    /// points are used, and the frame heading is the direction between them.
    pub fn anchor_points(&self, req: &PlanRequest, map: &dyn Map) -> LocalAnchors {
        let (behind_m, origin_m, yaw_rad) = match req.previous_path.get_last_segment() {
            Some(seg) => (seg.start_m, seg.target_m, seg.heading_rad),
            None => {
                let origin = Vector2::new(req.pose.x_m, req.pose.y_m);
                let yaw = req.pose.yaw_rad;
                let behind = origin - Vector2::new(yaw.cos(), yaw.sin());
                (behind, origin, yaw)
            }
        };

        let lane_d_m = self.params.lane_centre_m(req.target_lane);

        let mut global = vec![behind_m, origin_m];
        global.extend((1..=self.params.num_waypoints).map(|k| {
            map.frenet_to_cartesian_exact(
                req.pose.s_m + k as f64 * self.params.waypoint_spacing_m,
                lane_d_m,
            )
        }));

        let local_m = global
            .iter()
            .map(|p| {
                let (x, y) = to_local_frame((p.x, p.y), (origin_m.x, origin_m.y), yaw_rad);
                Vector2::new(x, y)
            })
            .collect();

        LocalAnchors {
            origin_m,
            yaw_rad,
            local_m,
        }
    }
}

impl TrajectoryGenerator for LocalSplineGenerator {
    fn name(&self) -> &str {
        "LocalSpline"
    }

    fn generate(
        &mut self,
        req: &PlanRequest,
        map: &dyn Map,
    ) -> Result<OutputPath, TrajGenError> {
        let num_points = self.params.num_points;
        let prev_size = req.previous_path.get_num_points();

        if prev_size > num_points {
            return Err(TrajGenError::PreviousPathTooLong {
                len: prev_size,
                horizon: num_points,
            });
        }

        if prev_size == num_points {
            trace!("Previous path is full, carrying it over unchanged");
            return Ok(req.previous_path.clone());
        }

        let speed_ms = self.params.target_speed_ms(req.target_speed);
        if !(speed_ms.is_finite() && speed_ms > 0.0) {
            return Err(TrajGenError::InvalidTargetSpeed(req.target_speed));
        }

        // ---- FIT ----

        let anchors = self.anchor_points(req, map);
        let xs = anchors.local_m.iter().map(|p| p.x).collect();
        let ys = anchors.local_m.iter().map(|p| p.y).collect();

        let spline = CubicSpline::new(xs, ys).map_err(|e| match e {
            CubicSplineError::NotStrictlyIncreasing { index, x } => {
                TrajGenError::InvalidWaypoints { index, x_m: x }
            }
            e => TrajGenError::SplineFitError(e),
        })?;

        // ---- SAMPLE ----

        // Split the chord to the first waypoint into steps travelled in one
        // time step at the target speed
        let horizon_x_m = self.params.waypoint_spacing_m;
        let horizon_y_m = spline.eval(horizon_x_m);
        let chord_m = horizon_x_m.hypot(horizon_y_m);
        let num_steps = chord_m / (self.params.dt_s * speed_ms);
        let step_x_m = horizon_x_m / num_steps;

        debug!(
            "Local spline from ({:.3}, {:.3}) heading {:.3} rad, step {:.3} m, {} new points",
            anchors.origin_m.x,
            anchors.origin_m.y,
            anchors.yaw_rad,
            step_x_m,
            num_points - prev_size
        );

        let mut path = Path::with_capacity(num_points);
        path.points_m.extend_from_slice(&req.previous_path.points_m);

        let origin = (anchors.origin_m.x, anchors.origin_m.y);
        for i in 1..=(num_points - prev_size) {
            let x = i as f64 * step_x_m;
            let (px, py) = to_parent_frame((x, spline.eval(x)), origin, anchors.yaw_rad);
            path.points_m.push(Vector2::new(px, py));
        }

        Ok(path)
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{map::StraightRoad, traj_gen::EgoPose};
    use std::f64::consts::{FRAC_PI_2, PI};

    /// A road along +x whose lane 1 centre (`d = 6`) lies on `y = 0`.
    fn road() -> StraightRoad {
        StraightRoad::new(Vector2::new(0.0, 6.0), 0.0)
    }

    fn request(pose: EgoPose, lane: u32, target_speed: f64, previous_path: Path) -> PlanRequest {
        PlanRequest {
            target_lane: lane,
            target_speed,
            pose,
            previous_path,
        }
    }

    fn start_pose() -> EgoPose {
        EgoPose {
            x_m: 0.0,
            y_m: 0.0,
            yaw_rad: 0.0,
            s_m: 0.0,
            d_m: 6.0,
        }
    }

    #[test]
    fn test_from_rest() {
        let params = Params::default();
        let mut gen = LocalSplineGenerator::new(&params);
        let req = request(start_pose(), 1, 49.0, Path::new_empty());

        let anchors = gen.anchor_points(&req, &road());
        assert_eq!(anchors.local_m.len(), 2 + params.num_waypoints);
        assert_eq!(anchors.local_m[0].y, 0.0);
        assert_eq!(anchors.local_m[1].y, 0.0);
        assert!((anchors.local_m[0].x + 1.0).abs() < 1e-12);

        let path = gen.generate(&req, &road()).unwrap();
        assert_eq!(path.get_num_points(), params.num_points);
        assert_eq!(path.xs().len(), params.num_points);
        assert_eq!(path.ys().len(), params.num_points);

        // Straight along the lane, one time step at 49 mph between points
        let step_m = params.dt_s * params.target_speed_ms(49.0);
        for (i, p) in path.points_m.iter().enumerate() {
            assert!(p.y.abs() < 1e-9);
            assert!((p.x - (i + 1) as f64 * step_m).abs() < 1e-9);
        }
    }

    #[test]
    fn test_carry_over() {
        let params = Params::default();
        let mut gen = LocalSplineGenerator::new(&params);
        let road = road();
        let step_m = params.dt_s * params.target_speed_ms(49.0);

        let first = gen
            .generate(&request(start_pose(), 1, 49.0, Path::new_empty()), &road)
            .unwrap();

        // Keep many points, a single point, and all but one point
        for &executed in [7, params.num_points - 1, 1].iter() {
            let last_executed = first.points_m[executed - 1];
            let (s_m, d_m) = road.cartesian_to_frenet(&last_executed);
            let pose = EgoPose {
                x_m: last_executed.x,
                y_m: last_executed.y,
                yaw_rad: 0.0,
                s_m,
                d_m,
            };
            let previous = first.remainder(executed);
            let prev_size = previous.get_num_points();
            assert_eq!(prev_size, params.num_points - executed);

            let req = request(pose, 1, 49.0, previous.clone());
            let second = gen.generate(&req, &road).unwrap();

            assert_eq!(second.get_num_points(), params.num_points);
            assert_eq!(&second.points_m[..prev_size], &previous.points_m[..]);

            let anchors = gen.anchor_points(&req, &road);
            let gap = second.points_m[prev_size] - second.points_m[prev_size - 1];

            if prev_size == 1 {
                // One point is not enough to give a heading, so the frame is
                // built on the pose and sampling restarts from there, landing
                // back on the carried point
                assert_eq!(anchors.origin_m, last_executed);
                assert!((anchors.local_m[0].x + 1.0).abs() < 1e-12);
                assert!(gap.norm() < 1e-6);
            } else {
                // New points continue on from the carried over tail
                assert_eq!(anchors.origin_m, previous.points_m[prev_size - 1]);
                assert!((gap.norm() - step_m).abs() < 1e-6);
            }

            for p in second.points_m[prev_size..].iter() {
                assert!(p.y.abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_lane_change() {
        let params = Params::default();
        let mut gen = LocalSplineGenerator::new(&params);

        // Lane 2 centre is 4 m to the right, at y = -4
        let path = gen
            .generate(&request(start_pose(), 2, 49.0, Path::new_empty()), &road())
            .unwrap();

        assert_eq!(path.get_num_points(), params.num_points);
        let last = path.points_m[params.num_points - 1];
        assert!(last.y < -1.0 && last.y > -5.0, "{:?}", last);

        // Still moving forwards
        let xs = path.xs();
        assert!(xs.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_rotated_frame() {
        let params = Params::default();
        let gen = LocalSplineGenerator::new(&params);

        // Road heading up the y axis, lane 1 centre on x = 0
        let road = StraightRoad::new(Vector2::new(-6.0, 0.0), FRAC_PI_2);
        let pose = EgoPose {
            x_m: 0.0,
            y_m: 0.0,
            yaw_rad: FRAC_PI_2,
            s_m: 0.0,
            d_m: 6.0,
        };

        let anchors = gen.anchor_points(&request(pose, 1, 49.0, Path::new_empty()), &road);
        assert!((anchors.yaw_rad - FRAC_PI_2).abs() < 1e-12);
        for (k, p) in anchors.local_m.iter().skip(2).enumerate() {
            assert!((p.x - (k + 1) as f64 * params.waypoint_spacing_m).abs() < 1e-9);
            assert!(p.y.abs() < 1e-9);
        }
    }

    #[test]
    fn test_backwards_waypoints() {
        let params = Params::default();
        let mut gen = LocalSplineGenerator::new(&params);

        // The previous path tail points in -x while the waypoints lie in +x
        let previous = Path::from_xy(&[10.0, 9.0], &[0.0, 0.0]).unwrap();
        let req = request(start_pose(), 1, 49.0, previous);

        let anchors = gen.anchor_points(&req, &road());
        assert!((anchors.yaw_rad.abs() - PI).abs() < 1e-12);

        match gen.generate(&req, &road()) {
            Err(TrajGenError::InvalidWaypoints { index, x_m }) => {
                assert_eq!(index, 2);
                assert!((x_m + 21.0).abs() < 1e-9);
            }
            other => panic!("Expected InvalidWaypoints, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_target_speed() {
        let params = Params::default();
        let mut gen = LocalSplineGenerator::new(&params);

        for speed in [0.0, -10.0, std::f64::INFINITY].iter() {
            let req = request(start_pose(), 1, *speed, Path::new_empty());
            assert!(matches!(
                gen.generate(&req, &road()),
                Err(TrajGenError::InvalidTargetSpeed(_))
            ));
        }
    }

    #[test]
    fn test_previous_path_limits() {
        let params = Params::default();
        let mut gen = LocalSplineGenerator::new(&params);

        let xs: Vec<f64> = (0..params.num_points).map(|i| i as f64).collect();
        let ys = vec![0.0; params.num_points];
        let full = Path::from_xy(&xs, &ys).unwrap();

        let out = gen
            .generate(&request(start_pose(), 1, 49.0, full.clone()), &road())
            .unwrap();
        assert_eq!(out, full);

        let mut too_long = full.clone();
        too_long.points_m.push(Vector2::new(99.0, 0.0));
        assert!(matches!(
            gen.generate(&request(start_pose(), 1, 49.0, too_long), &road()),
            Err(TrajGenError::PreviousPathTooLong { .. })
        ));
    }
}
