//! # Path
//!
//! This module defines the Cartesian path exchanged with the downstream
//! consumer. The consumer executes points from the front of the path and hands
//! back the unconsumed remainder on the next planning cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An ordered sequence of Cartesian points, one per sample instant.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Path {
    pub points_m: Vec<Vector2<f64>>,
}

/// The path produced by one planning cycle.
pub type OutputPath = Path;

/// A segment between two path points
#[derive(Default, Serialize, Deserialize, Debug)]
pub struct PathSegment {
    /// The target of the segment
    pub target_m: Vector2<f64>,

    /// The start point of the segment
    pub start_m: Vector2<f64>,

    /// The length of the segment
    pub length_m: f64,

    /// The heading (angle to the +ve x axis) of the segment
    pub heading_rad: f64,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("The x ({0}) and y ({1}) sequences have different lengths")]
    MismatchedLengths(usize, usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Path {
    /// Create a new empty path
    pub fn new_empty() -> Self {
        Path {
            points_m: Vec::new(),
        }
    }

    /// Create an empty path able to hold `capacity` points without reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Path {
            points_m: Vec::with_capacity(capacity),
        }
    }

    /// Build a path from separate x and y sequences, as reported by simulators.
    pub fn from_xy(xs: &[f64], ys: &[f64]) -> Result<Self, PathError> {
        if xs.len() != ys.len() {
            return Err(PathError::MismatchedLengths(xs.len(), ys.len()));
        }

        Ok(Path {
            points_m: xs
                .iter()
                .zip(ys.iter())
                .map(|(x, y)| Vector2::new(*x, *y))
                .collect(),
        })
    }

    /// The x coordinates of every point.
    pub fn xs(&self) -> Vec<f64> {
        self.points_m.iter().map(|p| p.x).collect()
    }

    /// The y coordinates of every point.
    pub fn ys(&self) -> Vec<f64> {
        self.points_m.iter().map(|p| p.y).collect()
    }

    /// Returns the path segment connecting the target point and the previous
    /// point.
    ///
    /// If no segment exists (the target is the first point in the sequence or
    /// is beyond the end of the sequence) then `None` will be returned
    pub fn get_segment_to_target(&self, target_index: usize) -> Option<PathSegment> {
        // Catch invalid targets, which also covers paths with fewer than two
        // points
        if target_index == 0 || target_index >= self.points_m.len() {
            return None;
        }

        let target_m = self.points_m[target_index];
        let start_m = self.points_m[target_index - 1];
        let diff = target_m - start_m;

        Some(PathSegment {
            target_m,
            start_m,
            length_m: diff.norm(),
            heading_rad: diff.y.atan2(diff.x),
        })
    }

    /// Returns the segment joining the last two points of the path.
    pub fn get_last_segment(&self) -> Option<PathSegment> {
        self.get_segment_to_target(self.points_m.len().checked_sub(1)?)
    }

    /// Return the length of the path in meters.
    ///
    /// If the path is empty (not enough points) then `None` is returned.
    pub fn get_length(&self) -> Option<f64> {
        if self.points_m.len() < 2 {
            return None;
        }

        // Length is defined as the sum of the length of all path segments
        Some(
            self.points_m
                .windows(2)
                .map(|w| (w[1] - w[0]).norm())
                .sum(),
        )
    }

    /// Get the number of points in the path
    pub fn get_num_points(&self) -> usize {
        self.points_m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points_m.is_empty()
    }

    /// Return a new path containing the points from `start` onwards, as a
    /// consumer hands back after executing `start` points.
    pub fn remainder(&self, start: usize) -> Path {
        Path {
            points_m: self.points_m.iter().skip(start).cloned().collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn test_from_xy() {
        let path = Path::from_xy(&[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0]).unwrap();
        assert_eq!(path.get_num_points(), 3);
        assert_eq!(path.xs(), vec![0.0, 1.0, 2.0]);
        assert_eq!(path.ys(), vec![0.0, 1.0, 2.0]);

        match Path::from_xy(&[0.0, 1.0], &[0.0]) {
            Err(PathError::MismatchedLengths(2, 1)) => (),
            other => panic!("Expected MismatchedLengths, got {:?}", other),
        }
    }

    #[test]
    fn test_segments() {
        let path = Path::from_xy(&[0.0, 1.0, 4.0], &[0.0, 1.0, 5.0]).unwrap();

        assert!(path.get_segment_to_target(0).is_none());
        assert!(path.get_segment_to_target(3).is_none());

        let seg = path.get_segment_to_target(1).unwrap();
        assert!((seg.heading_rad - FRAC_PI_4).abs() < 1e-12);
        assert!((seg.length_m - 2f64.sqrt()).abs() < 1e-12);

        let last = path.get_last_segment().unwrap();
        assert!((last.length_m - 5.0).abs() < 1e-12);
        assert_eq!(last.target_m, Vector2::new(4.0, 5.0));

        assert!((path.get_length().unwrap() - (5.0 + 2f64.sqrt())).abs() < 1e-12);

        assert!(Path::new_empty().get_last_segment().is_none());
        assert!(Path::new_empty().get_length().is_none());
    }

    #[test]
    fn test_remainder() {
        let path = Path::from_xy(&[0.0, 1.0, 2.0, 3.0], &[0.0; 4]).unwrap();
        assert_eq!(path.remainder(1).xs(), vec![1.0, 2.0, 3.0]);
        assert!(path.remainder(4).is_empty());
        assert!(path.remainder(10).is_empty());
    }
}
