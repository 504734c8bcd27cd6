//! # Frenet jerk minimising trajectory generator
//!
//! Plans the `s` and `d` axes independently with jerk minimising quintics.
//! Each plan starts from the exact tracked state of the last point the
//! consumer executed, so position, velocity and acceleration are continuous
//! across planning cycles.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::{Deserialize, Serialize};

// Internal
use super::{
    solve_jmt, MotionTriple, Params, PathState, PlanRequest, TrajGenError, TrajectoryGenerator,
};
use crate::{
    map::Map,
    path::{OutputPath, Path},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Trajectory generator planning in the Frenet frame.
pub struct JmtGenerator {
    params: Params,

    /// Planned motion of every point of the last output path
    path_state: PathState,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The law used to pick the end state of each manoeuvre.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalPolicy {
    /// End at the reported `s` at rest, at the centre of the target lane.
    HoldPosition,

    /// Reach the target speed along `s` by the end of the manoeuvre, at the
    /// centre of the target lane.
    ///
    /// New samples restart at `t = 0` from the last executed point, while the
    /// carried over points lie ahead of it. Once the vehicle is moving the
    /// output therefore steps back where the carried points end. The tracked
    /// Frenet state is continuous, the Cartesian path is not.
    CruiseToSpeed,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TerminalPolicy {
    /// Compute the `(s, d)` end states for a manoeuvre starting at `start_s`.
    pub fn end_states(
        &self,
        start_s: &MotionTriple,
        req: &PlanRequest,
        params: &Params,
    ) -> Result<(MotionTriple, MotionTriple), TrajGenError> {
        let end_d = MotionTriple::at_rest(params.lane_centre_m(req.target_lane));

        let end_s = match self {
            TerminalPolicy::HoldPosition => MotionTriple::at_rest(req.pose.s_m),
            TerminalPolicy::CruiseToSpeed => {
                let v_ms = params.target_speed_ms(req.target_speed);
                if !(v_ms.is_finite() && v_ms >= 0.0) {
                    return Err(TrajGenError::InvalidTargetSpeed(req.target_speed));
                }
                MotionTriple::new(start_s.pos + v_ms * params.jmt_horizon_s, v_ms, 0.0)
            }
        };

        Ok((end_s, end_d))
    }
}

impl JmtGenerator {
    pub fn new(params: &Params) -> Self {
        Self {
            params: params.clone(),
            path_state: PathState::new(params.num_points),
        }
    }

    /// The planned motion behind the last output path.
    pub fn path_state(&self) -> &PathState {
        &self.path_state
    }
}

impl TrajectoryGenerator for JmtGenerator {
    fn name(&self) -> &str {
        "Jmt"
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

        // Nothing executed since the last cycle, so there is nothing to
        // graft onto
        if prev_size == num_points {
            trace!("Previous path is full, carrying it over unchanged");
            return Ok(req.previous_path.clone());
        }

        let consumed = num_points - prev_size;
        let graft = consumed - 1;

        if !self.path_state.is_initialised() {
            self.path_state.initialise(req.pose.s_m, req.pose.d_m);
        }

        self.path_state.check_graft(
            graft,
            req.pose.s_m,
            req.pose.d_m,
            self.params.continuity_tolerance_m,
        )?;

        // ---- SOLVE ----

        let (start_s, start_d) = self.path_state.read(graft)?;
        let (end_s, end_d) = self
            .params
            .terminal_policy
            .end_states(&start_s, req, &self.params)?;

        let poly_s = solve_jmt(start_s, end_s, self.params.jmt_horizon_s)?;
        let poly_d = solve_jmt(start_d, end_d, self.params.jmt_horizon_s)?;

        debug!(
            "JMT from (s = {:.3}, d = {:.3}) to (s = {:.3}, d = {:.3}), {} new points",
            start_s.pos, start_d.pos, end_s.pos, end_d.pos, consumed
        );

        // ---- SAMPLE ----

        self.path_state.roll_forward(consumed)?;

        let mut path = Path::with_capacity(num_points);
        path.points_m.extend_from_slice(&req.previous_path.points_m);

        for (step, index) in (prev_size..num_points).enumerate() {
            let t = step as f64 * self.params.dt_s;
            let s = poly_s.eval_triple(t);
            let d = poly_d.eval_triple(t);

            self.path_state.write(index, s, d)?;
            path.points_m.push(map.frenet_to_cartesian_smooth(s.pos, d.pos));
        }

        Ok(path)
    }

    fn reset(&mut self) {
        self.path_state.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{map::StraightRoad, traj_gen::EgoPose};
    use nalgebra::Vector2;

    fn road() -> StraightRoad {
        StraightRoad::new(Vector2::new(0.0, 0.0), 0.0)
    }

    fn cruise_params() -> Params {
        let mut params = Params::default();
        params.terminal_policy = TerminalPolicy::CruiseToSpeed;
        params
    }

    fn request(s_m: f64, d_m: f64, lane: u32, previous_path: Path) -> PlanRequest {
        PlanRequest {
            target_lane: lane,
            target_speed: 20.0,
            pose: EgoPose {
                s_m,
                d_m,
                ..Default::default()
            },
            previous_path,
        }
    }

    #[test]
    fn test_first_cycle_hold_position() {
        let params = Params::default();
        let mut gen = JmtGenerator::new(&params);
        let road = road();

        let path = gen
            .generate(&request(100.0, 6.0, 1, Path::new_empty()), &road)
            .unwrap();

        assert_eq!(path.get_num_points(), params.num_points);
        assert_eq!(path.xs().len(), path.ys().len());

        // Already in the lane centre and holding position
        for p in path.points_m.iter() {
            assert!((p - Vector2::new(100.0, -6.0)).norm() < 1e-9);
        }

        let (s, d) = gen.path_state().read(0).unwrap();
        assert_eq!(s, MotionTriple::new(100.0, 0.0, 0.0));
        assert_eq!(d, MotionTriple::new(6.0, 0.0, 0.0));
    }

    #[test]
    fn test_continuity_across_cycles() {
        let params = cruise_params();
        let mut gen = JmtGenerator::new(&params);
        let road = road();
        let executed = 5;

        // Start in lane 0 and change to lane 1
        let first = gen
            .generate(&request(0.0, 2.0, 1, Path::new_empty()), &road)
            .unwrap();
        assert_eq!(first.get_num_points(), params.num_points);

        let (graft_s, graft_d) = gen.path_state().read(executed - 1).unwrap();
        let (tail_s, _) = gen.path_state().read(executed).unwrap();
        let previous = first.remainder(executed);
        let prev_size = previous.get_num_points();

        let second = gen
            .generate(
                &request(graft_s.pos, graft_d.pos, 1, previous.clone()),
                &road,
            )
            .unwrap();

        // Fixed length, and the unexecuted points are carried over unchanged
        assert_eq!(second.get_num_points(), params.num_points);
        assert_eq!(&second.points_m[..prev_size], &previous.points_m[..]);

        // The tracker was rolled by the number of executed points
        let (s, _) = gen.path_state().read(0).unwrap();
        assert_eq!(s, tail_s);

        // The new plan starts from the exact tracked state of the graft point
        let (s, d) = gen.path_state().read(prev_size).unwrap();
        assert!((s.pos - graft_s.pos).abs() < 1e-9);
        assert!((s.vel - graft_s.vel).abs() < 1e-9);
        assert!((s.acc - graft_s.acc).abs() < 1e-9);
        assert!((d.pos - graft_d.pos).abs() < 1e-9);
        assert!((d.vel - graft_d.vel).abs() < 1e-9);
        assert!((d.acc - graft_d.acc).abs() < 1e-9);

        // Moving forwards
        assert!(second.points_m[params.num_points - 1].x > second.points_m[0].x);
    }

    #[test]
    fn test_cruise_restarts_from_last_executed_point() {
        let params = cruise_params();
        let mut gen = JmtGenerator::new(&params);
        let road = road();
        let executed = 5;

        let first = gen
            .generate(&request(0.0, 6.0, 1, Path::new_empty()), &road)
            .unwrap();
        let (graft_s, graft_d) = gen.path_state().read(executed - 1).unwrap();
        let previous = first.remainder(executed);
        let prev_size = previous.get_num_points();

        let second = gen
            .generate(&request(graft_s.pos, graft_d.pos, 1, previous), &road)
            .unwrap();

        // The first new point is the last executed point, behind the end of
        // the carried over points
        let restart = second.points_m[prev_size];
        assert!((restart - first.points_m[executed - 1]).norm() < 1e-9);
        assert!(restart.x < second.points_m[prev_size - 1].x);

        // and the new points move forwards from there
        let xs = second.xs();
        assert!(xs[prev_size..].windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_full_previous_path() {
        let params = Params::default();
        let mut gen = JmtGenerator::new(&params);
        let road = road();

        let first = gen
            .generate(&request(10.0, 6.0, 1, Path::new_empty()), &road)
            .unwrap();
        let second = gen
            .generate(&request(10.0, 6.0, 1, first.clone()), &road)
            .unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_previous_path_too_long() {
        let params = Params::default();
        let mut gen = JmtGenerator::new(&params);

        let xs = vec![0.0; params.num_points + 1];
        let previous = Path::from_xy(&xs, &xs).unwrap();

        assert!(matches!(
            gen.generate(&request(0.0, 0.0, 0, previous), &road()),
            Err(TrajGenError::PreviousPathTooLong { len: 51, horizon: 50 })
        ));
    }

    #[test]
    fn test_continuity_violation_and_reset() {
        let params = cruise_params();
        let mut gen = JmtGenerator::new(&params);
        let road = road();

        let first = gen
            .generate(&request(0.0, 6.0, 1, Path::new_empty()), &road)
            .unwrap();
        let (graft_s, graft_d) = gen.path_state().read(9).unwrap();
        let previous = first.remainder(10);

        let bad = request(graft_s.pos + 1.0, graft_d.pos, 1, previous.clone());
        match gen.generate(&bad, &road) {
            Err(TrajGenError::ContinuityViolation { index, .. }) => assert_eq!(index, 9),
            other => panic!("Expected ContinuityViolation, got {:?}", other),
        }

        // After a reset the tracker restarts from the reported pose
        gen.reset();
        let path = gen.generate(&bad, &road).unwrap();
        assert_eq!(path.get_num_points(), params.num_points);

        let (s, _) = gen.path_state().read(previous.get_num_points()).unwrap();
        assert!((s.pos - (graft_s.pos + 1.0)).abs() < 1e-9);
        assert!(s.vel.abs() < 1e-9);
    }

    #[test]
    fn test_cruise_rejects_invalid_speed() {
        let params = cruise_params();
        let mut gen = JmtGenerator::new(&params);

        let mut req = request(0.0, 6.0, 1, Path::new_empty());
        req.target_speed = std::f64::NAN;

        assert!(matches!(
            gen.generate(&req, &road()),
            Err(TrajGenError::InvalidTargetSpeed(_))
        ));
    }
}
