//! # Cubic spline
//!
//! Natural cubic spline interpolation of `y = f(x)` through a set of knots.
//! Outside the knot range the spline is continued linearly, which is where
//! the natural end condition (zero second derivative) leaves it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use util::maths::first_non_increasing;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A natural cubic spline.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    /// Knot abscissae, strictly increasing
    x: Vec<f64>,

    /// Knot ordinates
    y: Vec<f64>,

    /// Second derivative at each knot
    m: Vec<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CubicSplineError {
    #[error("At least two knots are required, got {0}")]
    TooFewPoints(usize),

    #[error("The x ({0}) and y ({1}) sequences have different lengths")]
    MismatchedLengths(usize, usize),

    #[error("Knot {index} (x = {x}) is not strictly greater than the previous knot")]
    NotStrictlyIncreasing { index: usize, x: f64 },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CubicSpline {
    /// Fit a spline through the given knots.
    ///
    /// `x` must be strictly increasing.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self, CubicSplineError> {
        if x.len() != y.len() {
            return Err(CubicSplineError::MismatchedLengths(x.len(), y.len()));
        }
        if x.len() < 2 {
            return Err(CubicSplineError::TooFewPoints(x.len()));
        }
        if let Some(index) = first_non_increasing(&x) {
            return Err(CubicSplineError::NotStrictlyIncreasing { index, x: x[index] });
        }

        let n = x.len();
        let mut m = vec![0.0; n];

        // Interior second derivatives satisfy, for i in 1..n-1:
        //   h[i-1] m[i-1] + 2 (h[i-1] + h[i]) m[i] + h[i] m[i+1]
        //     = 6 ((y[i+1] - y[i]) / h[i] - (y[i] - y[i-1]) / h[i-1])
        // with m[0] = m[n-1] = 0.
        if n > 2 {
            let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

            let sub: Vec<f64> = (1..n - 1).map(|i| h[i - 1]).collect();
            let diag: Vec<f64> = (1..n - 1).map(|i| 2.0 * (h[i - 1] + h[i])).collect();
            let sup: Vec<f64> = (1..n - 1).map(|i| h[i]).collect();
            let rhs: Vec<f64> = (1..n - 1)
                .map(|i| 6.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]))
                .collect();

            let interior = solve_tridiagonal(&sub, &diag, &sup, &rhs);
            m[1..n - 1].copy_from_slice(&interior);
        }

        Ok(Self { x, y, m })
    }

    /// Evaluate the spline at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.x.len();

        if x < self.x[0] {
            return self.y[0] + self.slope_at_knot(0) * (x - self.x[0]);
        }
        if x > self.x[n - 1] {
            return self.y[n - 1] + self.slope_at_knot(n - 1) * (x - self.x[n - 1]);
        }

        let i = self.segment_index(x);
        let h = self.x[i + 1] - self.x[i];
        let t = x - self.x[i];

        self.y[i]
            + self.segment_slope(i) * t
            + 0.5 * self.m[i] * t * t
            + (self.m[i + 1] - self.m[i]) / (6.0 * h) * t * t * t
    }

    /// First derivative of the spline at `x`.
    pub fn eval_deriv(&self, x: f64) -> f64 {
        let n = self.x.len();

        if x < self.x[0] {
            return self.slope_at_knot(0);
        }
        if x > self.x[n - 1] {
            return self.slope_at_knot(n - 1);
        }

        let i = self.segment_index(x);
        let h = self.x[i + 1] - self.x[i];
        let t = x - self.x[i];

        self.segment_slope(i) + self.m[i] * t + (self.m[i + 1] - self.m[i]) / (2.0 * h) * t * t
    }

    /// Index of the segment `[x[i], x[i + 1]]` containing `x`, which must lie
    /// within the knot range.
    fn segment_index(&self, x: f64) -> usize {
        let upper = self.x.partition_point(|k| *k <= x);
        upper.saturating_sub(1).min(self.x.len() - 2)
    }

    /// Slope of segment `i` at its start knot.
    fn segment_slope(&self, i: usize) -> f64 {
        let h = self.x[i + 1] - self.x[i];
        (self.y[i + 1] - self.y[i]) / h - h * (2.0 * self.m[i] + self.m[i + 1]) / 6.0
    }

    /// Slope of the spline at a given knot.
    fn slope_at_knot(&self, k: usize) -> f64 {
        let n = self.x.len();
        if k < n - 1 {
            self.segment_slope(k)
        } else {
            let i = n - 2;
            let h = self.x[i + 1] - self.x[i];
            self.segment_slope(i) + 0.5 * h * (self.m[i] + self.m[i + 1])
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Solve a tridiagonal system with the Thomas algorithm.
///
/// - `sub`: sub-diagonal (`sub[0]` unused)
/// - `diag`: main diagonal
/// - `sup`: super-diagonal (`sup[n-1]` unused)
/// - `rhs`: right hand side
///
/// The spline system is strictly diagonally dominant so no pivot is zero.
fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> Vec<f64> {
    let n = rhs.len();
    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![0.0; n];

    // Forward sweep
    c_prime[0] = sup[0] / diag[0];
    d_prime[0] = rhs[0] / diag[0];

    for i in 1..n {
        let den = diag[i] - sub[i] * c_prime[i - 1];
        c_prime[i] = sup[i] / den;
        d_prime[i] = (rhs[i] - sub[i] * d_prime[i - 1]) / den;
    }

    // Back substitution
    let mut x = vec![0.0; n];
    x[n - 1] = d_prime[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = d_prime[i] - c_prime[i] * x[i + 1];
    }

    x
}
