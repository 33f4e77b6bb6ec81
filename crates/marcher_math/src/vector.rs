//! Free-standing vector helpers that glam does not provide in the shape the
//! marcher needs.

use crate::Vec3;

/// Smallest magnitude `unit` will divide by.
pub const UNIT_EPSILON: f64 = 1e-12;

/// Normalize a vector, clamping its magnitude to [`UNIT_EPSILON`].
///
/// A zero-length input is a logic fault upstream (a gradient sampled at a
/// degenerate point, a light colocated with a hit point). Clamping keeps the
/// result finite so the fault shows up as a dark pixel instead of NaN
/// spreading through the shading math.
#[inline]
pub fn unit(v: Vec3) -> Vec3 {
    v / v.length().max(UNIT_EPSILON)
}

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Angle between two vectors, in degrees.
pub fn angle_between(a: Vec3, b: Vec3) -> f64 {
    let denom = (a.length() * b.length()).max(UNIT_EPSILON);
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Unit vector pointing from `from` to `to`.
#[inline]
pub fn direction_between(from: Vec3, to: Vec3) -> Vec3 {
    unit(to - from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_length() {
        let v = unit(Vec3::new(3.0, 4.0, 0.0));
        assert!((v.length() - 1.0).abs() < 1e-12);
        assert!((v.x - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_unit_zero_is_finite() {
        let v = unit(Vec3::ZERO);
        assert!(v.is_finite(), "unit(0) must not produce NaN, got {v:?}");
        assert_eq!(v, Vec3::ZERO);
    }

    #[test]
    fn test_reflect() {
        let r = reflect(Vec3::new(1.0, -1.0, 0.0), Vec3::Y);
        assert_eq!(r, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_angle_between() {
        assert!((angle_between(Vec3::X, Vec3::Y) - 90.0).abs() < 1e-9);
        assert!(angle_between(Vec3::X, Vec3::X * 5.0).abs() < 1e-6);
        assert!((angle_between(Vec3::X, -Vec3::X) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_direction_between() {
        let d = direction_between(Vec3::ZERO, Vec3::new(0.0, 0.0, -7.0));
        assert_eq!(d, -Vec3::Z);
    }
}
