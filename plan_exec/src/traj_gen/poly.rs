//! # Quintic polynomials
//!
//! Evaluation of quintic polynomials and their derivatives, and the solution
//! of the jerk minimising boundary value problem.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Matrix3, Vector3};
use serde::Serialize;

// Internal
use super::{MotionTriple, TrajGenError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Coefficients `[a0, .., a5]` of `f(t) = sum(a_i * t^i)`, lowest power first.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct QuinticCoeffs(pub [f64; 6]);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl QuinticCoeffs {
    /// Position at time `t`.
    pub fn eval(&self, t: f64) -> f64 {
        // Horner's scheme, highest power first
        self.0.iter().rev().fold(0.0, |acc, c| acc * t + c)
    }

    /// First derivative (velocity) at time `t`.
    pub fn eval_vel(&self, t: f64) -> f64 {
        self.0
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .fold(0.0, |acc, (i, c)| acc * t + i as f64 * c)
    }

    /// Second derivative (acceleration) at time `t`.
    pub fn eval_acc(&self, t: f64) -> f64 {
        self.0
            .iter()
            .enumerate()
            .skip(2)
            .rev()
            .fold(0.0, |acc, (i, c)| acc * t + (i * (i - 1)) as f64 * c)
    }

    /// Position, velocity and acceleration at time `t`.
    pub fn eval_triple(&self, t: f64) -> MotionTriple {
        MotionTriple::new(self.eval(t), self.eval_vel(t), self.eval_acc(t))
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Solve for the jerk minimising quintic joining `start` to `end` in
/// `duration_s` seconds.
///
/// The first three coefficients follow directly from the start state. The
/// remaining three satisfy the end state:
///
/// ```text
/// | T^3    T^4     T^5   |   | a3 |   | p1 - (p0 + v0 T + a0 T^2 / 2) |
/// | 3T^2   4T^3    5T^4  | * | a4 | = | v1 - (v0 + a0 T)              |
/// | 6T     12T^2   20T^3 |   | a5 |   | a1 - a0                       |
/// ```
///
/// The system is singular for `T = 0`, which is reported as
/// `TrajGenError::InvalidDuration`.
pub fn solve_jmt(
    start: MotionTriple,
    end: MotionTriple,
    duration_s: f64,
) -> Result<QuinticCoeffs, TrajGenError> {
    if !(duration_s.is_finite() && duration_s > 0.0) {
        return Err(TrajGenError::InvalidDuration(duration_s));
    }

    let t = duration_s;
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    let t5 = t4 * t;

    let a = Matrix3::new(
        t3,
        t4,
        t5,
        3.0 * t2,
        4.0 * t3,
        5.0 * t4,
        6.0 * t,
        12.0 * t2,
        20.0 * t3,
    );

    let b = Vector3::new(
        end.pos - (start.pos + start.vel * t + 0.5 * start.acc * t2),
        end.vel - (start.vel + start.acc * t),
        end.acc - start.acc,
    );

    let x = a
        .lu()
        .solve(&b)
        .filter(|x| x.iter().all(|v| v.is_finite()))
        .ok_or(TrajGenError::InvalidDuration(duration_s))?;

    Ok(QuinticCoeffs([
        start.pos,
        start.vel,
        0.5 * start.acc,
        x[0],
        x[1],
        x[2],
    ]))
}
