//! # Path state tracker
//!
//! Holds the planned `(position, velocity, acceleration)` of every point of the
//! current output path, for both Frenet axes. Each cycle the samples already
//! executed by the consumer are dropped from the front so that index 0 is
//! always the earliest point still to be executed. A new plan is then grafted
//! onto the exact kinematic state of the last executed point.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use serde::{Deserialize, Serialize};

use super::TrajGenError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Position, velocity and acceleration along one axis at one sample instant.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionTriple {
    /// Units: meters
    pub pos: f64,

    /// Units: meters/second
    pub vel: f64,

    /// Units: meters/second^2
    pub acc: f64,
}

/// Rolling buffers of planned motion along `s` and `d`.
///
/// Both buffers always hold exactly `len()` samples.
#[derive(Debug, Clone)]
pub struct PathState {
    s: Vec<MotionTriple>,
    d: Vec<MotionTriple>,
    initialised: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotionTriple {
    pub fn new(pos: f64, vel: f64, acc: f64) -> Self {
        Self { pos, vel, acc }
    }

    /// A stationary sample at `pos`.
    pub fn at_rest(pos: f64) -> Self {
        Self::new(pos, 0.0, 0.0)
    }
}

impl PathState {
    /// Create a new, uninitialised tracker for `num_points` samples.
    pub fn new(num_points: usize) -> Self {
        Self {
            s: vec![MotionTriple::default(); num_points],
            d: vec![MotionTriple::default(); num_points],
            initialised: false,
        }
    }

    /// Number of samples held per axis.
    pub fn len(&self) -> usize {
        self.s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.s.is_empty()
    }

    /// Returns true once [`PathState::initialise`] has been called.
    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    /// Initialise the tracker from the vehicle's pose, assuming it is at rest.
    ///
    /// Every sample is set to `(s0, 0, 0)` and `(d0, 0, 0)`, so whichever index
    /// the first plan grafts onto reads back the initial pose.
    pub fn initialise(&mut self, s0: f64, d0: f64) {
        self.s.iter_mut().for_each(|t| *t = MotionTriple::at_rest(s0));
        self.d.iter_mut().for_each(|t| *t = MotionTriple::at_rest(d0));
        self.initialised = true;

        trace!("PathState initialised at s = {}, d = {}", s0, d0);
    }

    /// Mark the tracker as uninitialised, so the next plan starts again from
    /// the reported pose.
    pub fn clear(&mut self) {
        self.initialised = false;
    }

    /// Drop the first `consumed` samples, moving the sample at index
    /// `consumed` to index 0.
    ///
    /// The samples at the back keep their previous values until overwritten.
    pub fn roll_forward(&mut self, consumed: usize) -> Result<(), TrajGenError> {
        let len = self.len();
        if consumed > len {
            return Err(TrajGenError::IndexOutOfRange {
                index: consumed,
                len,
            });
        }

        self.s.copy_within(consumed.., 0);
        self.d.copy_within(consumed.., 0);

        Ok(())
    }

    /// Overwrite the samples at `index`.
    pub fn write(
        &mut self,
        index: usize,
        s: MotionTriple,
        d: MotionTriple,
    ) -> Result<(), TrajGenError> {
        self.check_index(index)?;
        self.s[index] = s;
        self.d[index] = d;
        Ok(())
    }

    /// Read the `(s, d)` samples at `index`.
    pub fn read(&self, index: usize) -> Result<(MotionTriple, MotionTriple), TrajGenError> {
        self.check_index(index)?;
        Ok((self.s[index], self.d[index]))
    }

    /// Check that the tracked position at `index` matches the reported pose.
    pub fn check_graft(
        &self,
        index: usize,
        s_m: f64,
        d_m: f64,
        tolerance_m: f64,
    ) -> Result<(), TrajGenError> {
        let (s, d) = self.read(index)?;

        if (s.pos - s_m).abs() <= tolerance_m && (d.pos - d_m).abs() <= tolerance_m {
            Ok(())
        } else {
            Err(TrajGenError::ContinuityViolation {
                index,
                tracked_s_m: s.pos,
                tracked_d_m: d.pos,
                pose_s_m: s_m,
                pose_d_m: d_m,
            })
        }
    }

    fn check_index(&self, index: usize) -> Result<(), TrajGenError> {
        if index < self.len() {
            Ok(())
        } else {
            Err(TrajGenError::IndexOutOfRange {
                index,
                len: self.len(),
            })
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_initialise() {
        let mut state = PathState::new(50);
        assert!(!state.is_initialised());
        assert_eq!(state.len(), 50);

        state.initialise(100.0, 6.0);
        assert!(state.is_initialised());

        // The first plan after start grafts onto the last index
        let (s, d) = state.read(49).unwrap();
        assert_eq!(s, MotionTriple::new(100.0, 0.0, 0.0));
        assert_eq!(d, MotionTriple::new(6.0, 0.0, 0.0));

        let (s, d) = state.read(0).unwrap();
        assert_eq!(s, MotionTriple::new(100.0, 0.0, 0.0));
        assert_eq!(d, MotionTriple::new(6.0, 0.0, 0.0));

        state.clear();
        assert!(!state.is_initialised());
    }

    #[test]
    fn test_roll_forward() {
        let mut state = PathState::new(5);
        for i in 0..5 {
            let v = i as f64;
            state
                .write(i, MotionTriple::new(v, 1.0, 0.0), MotionTriple::at_rest(-v))
                .unwrap();
        }

        state.roll_forward(2).unwrap();

        // Samples 2, 3, 4 are now at the front
        for i in 0..3 {
            let (s, d) = state.read(i).unwrap();
            assert_eq!(s.pos, (i + 2) as f64);
            assert_eq!(d.pos, -((i + 2) as f64));
        }

        // Length is unchanged
        assert_eq!(state.len(), 5);
        assert!(state.read(4).is_ok());

        // Rolling by the whole buffer keeps everything addressable
        state.roll_forward(5).unwrap();
        assert_eq!(state.len(), 5);

        // Rolling by nothing is a no-op
        let before = state.read(0).unwrap();
        state.roll_forward(0).unwrap();
        assert_eq!(state.read(0).unwrap(), before);

        assert!(matches!(
            state.roll_forward(6),
            Err(TrajGenError::IndexOutOfRange { index: 6, len: 5 })
        ));
    }

    #[test]
    fn test_out_of_range() {
        let mut state = PathState::new(3);
        assert!(matches!(
            state.read(3),
            Err(TrajGenError::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert!(state
            .write(7, MotionTriple::default(), MotionTriple::default())
            .is_err());
    }

    #[test]
    fn test_check_graft() {
        let mut state = PathState::new(10);
        state.initialise(20.0, 2.0);

        assert!(state.check_graft(9, 20.0, 2.0, 1e-6).is_ok());
        assert!(state.check_graft(9, 20.0 + 1e-9, 2.0, 1e-6).is_ok());

        match state.check_graft(4, 21.0, 2.0, 1e-6) {
            Err(TrajGenError::ContinuityViolation {
                index,
                tracked_s_m,
                pose_s_m,
                ..
            }) => {
                assert_eq!(index, 4);
                assert_eq!(tracked_s_m, 20.0);
                assert_eq!(pose_s_m, 21.0);
            }
            other => panic!("Expected ContinuityViolation, got {:?}", other),
        }
    }
}
