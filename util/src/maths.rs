//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap an angle in degrees into the range (-180, 180].
pub fn wrap_180<T>(angle_deg: T) -> T
where
    T: Float
{
    let half: T = T::from(180.0).unwrap_or_else(T::zero);
    let full = half + half;

    let wrapped = half - rem_euclid(half - angle_deg, full);

    // Round-off in rem_euclid can land us exactly on the excluded bound
    if wrapped <= -half {
        wrapped + full
    }
    else {
        wrapped
    }
}

/// Wrap an angle in degrees into the range [0, 360).
pub fn wrap_360<T>(angle_deg: T) -> T
where
    T: Float
{
    let full: T = T::from(360.0).unwrap_or_else(T::zero);

    let wrapped = rem_euclid(angle_deg, full);

    if wrapped >= full {
        wrapped - full
    }
    else {
        wrapped
    }
}
