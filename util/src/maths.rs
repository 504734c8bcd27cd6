//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Rotate the point `(x, y)` about the origin by `angle` radians.
pub fn rotate<T>(x: T, y: T, angle: T) -> (T, T)
where
    T: Float,
{
    let (sin, cos) = angle.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

/// Express a point given in the parent frame in a child frame whose origin is
/// at `origin` and whose x axis points along `heading`.
pub fn to_local_frame<T>(point: (T, T), origin: (T, T), heading: T) -> (T, T)
where
    T: Float,
{
    rotate(point.0 - origin.0, point.1 - origin.1, -heading)
}

/// Inverse of [`to_local_frame`].
pub fn to_parent_frame<T>(point: (T, T), origin: (T, T), heading: T) -> (T, T)
where
    T: Float,
{
    let (x, y) = rotate(point.0, point.1, heading);
    (x + origin.0, y + origin.1)
}

/// Return the index of the first element which is not strictly greater than
/// its predecessor, or `None` if the slice is strictly increasing.
pub fn first_non_increasing<T>(values: &[T]) -> Option<usize>
where
    T: Float,
{
    values
        .windows(2)
        .position(|w| !(w[1] > w[0]))
        .map(|i| i + 1)
}
