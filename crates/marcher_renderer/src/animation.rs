//! Camera pose sequences for batch animation.

use marcher_math::{direction_between, Vec3};

use crate::camera::CameraPose;

/// Poses circling the origin in the XY plane, each looking at the origin.
///
/// Starts on the +X axis and advances counter-clockwise by `step_degrees`
/// while the angle stays below `degrees`. A non-positive step yields no
/// poses.
pub fn orbit_poses(radius: f64, degrees: f64, step_degrees: f64) -> Vec<CameraPose> {
    if step_degrees <= 0.0 || degrees <= 0.0 {
        return Vec::new();
    }

    let frames = (degrees / step_degrees).ceil() as usize;
    (0..frames)
        .map(|frame| frame as f64 * step_degrees)
        .filter(|angle| *angle < degrees)
        .map(|angle| {
            let (sin, cos) = angle.to_radians().sin_cos();
            let position = Vec3::new(radius * cos, radius * sin, 0.0);
            CameraPose {
                position,
                direction: direction_between(position, Vec3::ZERO),
            }
        })
        .collect()
}
