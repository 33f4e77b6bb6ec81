// Re-export glam for convenience
pub use glam::*;

// Marcher math types
mod color;
mod ray;
mod slope;
mod vector;

pub use color::{rgba_to_vec3, vec3_to_rgba, Color};
pub use ray::Ray;
pub use slope::SlopeWindow;
pub use vector::{angle_between, direction_between, reflect, unit, UNIT_EPSILON};

/// Double-precision 3-vector used for every position, direction and color
/// calculation in the marcher.
pub type Vec3 = DVec3;

/// Double-precision 2-vector used for screen-space offsets.
pub type Vec2 = DVec2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_creation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(a.dot(b), 32.0);
        assert_eq!(Vec3::X.cross(Vec3::Y), Vec3::Z);
    }
}
