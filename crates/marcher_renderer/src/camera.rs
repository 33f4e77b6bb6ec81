//! Pinhole camera for ray generation.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use marcher_math::{unit, Ray, Vec2, Vec3};

use crate::error::RenderResult;
use crate::pixels::PixelBuffer;

/// Position and viewing direction, e.g. one frame of an animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub direction: Vec3,
}

/// Camera that generates one ray per pixel and owns the output pixels.
///
/// Vertical field of view is the user-facing parameter; the horizontal one
/// follows from it and the aspect ratio. Movement operators take `&mut self`,
/// so they cannot run while a render pass holds the camera.
pub struct Camera {
    // Camera positioning
    position: Vec3,
    direction: Vec3,
    up: Vec3,

    // Image settings
    width: u32,
    height: u32,

    // Lens settings (radians)
    fov_v: f64,
    fov_h: f64,

    // Output
    pixels: Arc<PixelBuffer>,
    next_frame: AtomicU32,
}

impl Camera {
    /// Create a camera looking down +X with +Z up.
    ///
    /// `fov_degrees` is the vertical field of view. Zero-sized dimensions are
    /// bumped to one pixel.
    pub fn new(position: Vec3, width: u32, height: u32, fov_degrees: f64) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut camera = Self {
            position,
            direction: Vec3::X,
            up: Vec3::Z,
            width,
            height,
            fov_v: 0.0,
            fov_h: 0.0,
            pixels: Arc::new(PixelBuffer::new(width, height)),
            next_frame: AtomicU32::new(0),
        };
        camera.set_fov(fov_degrees);
        camera
    }

    /// Set viewing direction and up vector.
    pub fn with_orientation(mut self, direction: Vec3, up: Vec3) -> Self {
        self.direction = unit(direction);
        self.up = unit(up);
        self
    }

    /// Point the camera at `target`, keeping the current up vector.
    pub fn looking_at(mut self, target: Vec3) -> Self {
        self.look_at(target);
        self
    }

    /// Set the vertical field of view in degrees.
    pub fn set_fov(&mut self, fov_degrees: f64) {
        let aspect = f64::from(self.width) / f64::from(self.height);
        self.fov_v = fov_degrees.to_radians();
        self.fov_h = ((self.fov_v / 2.0).tan() * aspect).atan() * 2.0;
    }

    /// Change the output resolution. Discards the current pixels.
    pub fn resize(&mut self, width: u32, height: u32) {
        let fov_degrees = self.fov_v.to_degrees();
        self.width = width.max(1);
        self.height = height.max(1);
        self.pixels = Arc::new(PixelBuffer::new(self.width, self.height));
        self.set_fov(fov_degrees);
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Vertical field of view, radians.
    pub fn fov_vertical(&self) -> f64 {
        self.fov_v
    }

    /// Horizontal field of view, radians.
    pub fn fov_horizontal(&self) -> f64 {
        self.fov_h
    }

    /// Length of the image diagonal in pixels.
    pub fn diagonal(&self) -> f64 {
        Vec2::new(f64::from(self.width), f64::from(self.height)).length()
    }

    /// Offset of a pixel's center from the image center, in pixels.
    #[inline]
    pub fn center_offset(&self, x: u32, y: u32) -> Vec2 {
        Vec2::new(
            f64::from(x) + 0.5 - f64::from(self.width) / 2.0,
            f64::from(y) + 0.5 - f64::from(self.height) / 2.0,
        )
    }

    /// Horizontal image axis, `up × direction`. Increasing pixel x moves
    /// along it.
    #[inline]
    pub fn right(&self) -> Vec3 {
        unit(self.up.cross(self.direction))
    }

    /// Generate the ray through pixel (x, y).
    ///
    /// Increasing x moves along [`Camera::right`] and increasing y moves
    /// along `up`, so row 0 looks below the view direction.
    pub fn ray_for_pixel(&self, x: u32, y: u32) -> Ray {
        let offset = self.center_offset(x, y);
        let right = self.right();
        let true_up = self.direction.cross(right);

        let adjacent_x = (f64::from(self.width) / 2.0) / (self.fov_h / 2.0).tan();
        let horizontal = offset.x / offset.x.hypot(adjacent_x);

        let adjacent_y = (f64::from(self.height) / 2.0) / (self.fov_v / 2.0).tan();
        let vertical = offset.y / offset.y.hypot(adjacent_y);

        let direction = self.direction + right * horizontal + true_up * vertical;
        Ray::new(self.position, direction)
    }

    /// Current pose.
    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.position,
            direction: self.direction,
        }
    }

    /// Jump to a pose.
    pub fn set_pose(&mut self, pose: CameraPose) {
        self.position = pose.position;
        self.set_direction(pose.direction);
    }

    /// Aim at `target`.
    pub fn look_at(&mut self, target: Vec3) {
        self.set_direction(target - self.position);
    }

    fn set_direction(&mut self, direction: Vec3) {
        if direction.length_squared() == 0.0 {
            log::warn!("Ignoring zero-length camera direction");
            return;
        }
        self.direction = unit(direction);
    }

    pub fn move_up(&mut self, amount: f64) {
        self.position += self.up * amount;
    }

    pub fn move_down(&mut self, amount: f64) {
        self.position -= self.up * amount;
    }

    pub fn move_left(&mut self, amount: f64) {
        self.position -= self.right() * amount;
    }

    pub fn move_right(&mut self, amount: f64) {
        self.position += self.right() * amount;
    }

    pub fn move_forward(&mut self, amount: f64) {
        self.position += self.direction * amount;
    }

    pub fn move_backward(&mut self, amount: f64) {
        self.position -= self.direction * amount;
    }

    /// Turn toward the left by blending the direction with the left vector.
    pub fn rotate_left(&mut self, amount: f64) {
        let turned = self.direction * (1.0 - amount) - self.right() * amount;
        self.set_direction(turned);
    }

    pub fn rotate_right(&mut self, amount: f64) {
        let turned = self.direction * (1.0 - amount) + self.right() * amount;
        self.set_direction(turned);
    }

    /// Clear the pixel buffer.
    pub fn reset(&mut self) {
        self.pixels.clear();
    }

    /// The pixel buffer.
    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Shared handle to the pixel buffer, for display threads.
    pub fn shared_pixels(&self) -> Arc<PixelBuffer> {
        Arc::clone(&self.pixels)
    }

    /// Write the current pixels to `dir/renderNNN.png`, numbering frames
    /// sequentially per camera. Returns the written path.
    pub fn flush_to_disk<P: AsRef<Path>>(&self, dir: P) -> RenderResult<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let frame = self.next_frame.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!("render{frame:03}.png"));
        self.pixels.save_png(&path)?;
        log::info!("Wrote {}", path.display());
        Ok(path)
    }
}

impl std::fmt::Debug for Camera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Camera")
            .field("position", &self.position)
            .field("direction", &self.direction)
            .field("up", &self.up)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("fov_v", &self.fov_v)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn angle(a: Vec3, b: Vec3) -> f64 {
        marcher_math::angle_between(a, b)
    }

    #[test]
    fn test_camera_defaults() {
        let camera = Camera::new(Vec3::new(-5.0, 0.0, 0.0), 64, 48, 40.0);
        assert_eq!(camera.direction(), Vec3::X);
        assert_eq!(camera.up(), Vec3::Z);
        assert_eq!(camera.pixel_count(), 64 * 48);
        assert!((camera.fov_vertical() - 40f64.to_radians()).abs() < 1e-12);
        // Wider than tall, so horizontal FOV is larger.
        assert!(camera.fov_horizontal() > camera.fov_vertical());
    }

    #[test]
    fn test_square_image_fov_matches() {
        let camera = Camera::new(Vec3::ZERO, 100, 100, 30.0);
        assert!((camera.fov_horizontal() - camera.fov_vertical()).abs() < 1e-12);
    }

    #[test]
    fn test_center_ray_is_view_direction() {
        let camera = Camera::new(Vec3::ZERO, 101, 101, 40.0);
        let ray = camera.ray_for_pixel(50, 50);
        assert_eq!(ray.origin(), Vec3::ZERO);
        assert!(angle(ray.direction(), Vec3::X) < 1e-9);
    }

    #[test]
    fn test_ray_orientation() {
        let camera = Camera::new(Vec3::ZERO, 64, 64, 40.0);
        // Looking down +X with +Z up: up × direction is +Y.
        assert!((camera.right() - Vec3::Y).length() < 1e-12);

        let first_row = camera.ray_for_pixel(32, 0).direction();
        let last_row = camera.ray_for_pixel(32, 63).direction();
        assert!(first_row.dot(Vec3::Z) < 0.0, "row 0 looks against up");
        assert!(last_row.dot(Vec3::Z) > 0.0, "last row looks along up");

        let first_column = camera.ray_for_pixel(0, 32).direction();
        let last_column = camera.ray_for_pixel(63, 32).direction();
        assert!(first_column.y < 0.0);
        assert!(last_column.y > 0.0, "positive x offset maps to +Y");
        assert!(last_column.z.abs() < 0.01);
    }

    #[test]
    fn test_with_orientation_sets_basis() {
        let camera = Camera::new(Vec3::ZERO, 32, 32, 40.0)
            .with_orientation(Vec3::new(0.0, 3.0, 0.0), Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(camera.direction(), Vec3::Y);
        assert_eq!(camera.up(), Vec3::Z);
        // Z × Y = -X.
        assert!((camera.right() + Vec3::X).length() < 1e-12);

        let center = camera.ray_for_pixel(16, 16).direction();
        assert!(angle(center, Vec3::Y) < 2.0);
        let last_column = camera.ray_for_pixel(31, 16).direction();
        assert!(last_column.x < 0.0, "positive x offset maps to -X");
        let last_row = camera.ray_for_pixel(16, 31).direction();
        assert!(last_row.z > 0.0);
    }

    #[test]
    fn test_edge_ray_spans_half_fov() {
        // Edge ray deflection is tan(half fov) scaled through the unit
        // projection, so it stays within the half angle.
        let camera = Camera::new(Vec3::ZERO, 200, 200, 40.0);
        let edge = camera.ray_for_pixel(100, 0).direction();
        let deg = angle(edge, Vec3::X);
        assert!(deg > 10.0 && deg < 20.0, "edge ray at {deg} degrees");
    }

    #[test]
    fn test_movement() {
        let mut camera = Camera::new(Vec3::ZERO, 10, 10, 40.0);
        camera.move_forward(2.0);
        assert_eq!(camera.position(), Vec3::new(2.0, 0.0, 0.0));
        camera.move_backward(2.0);
        camera.move_up(1.0);
        assert_eq!(camera.position(), Vec3::Z);
        camera.move_down(1.0);
        camera.move_right(3.0);
        assert!((camera.position() - camera.right() * 3.0).length() < 1e-12);
        camera.move_left(3.0);
        assert!(camera.position().length() < 1e-12);
    }

    #[test]
    fn test_rotation_keeps_unit_direction() {
        let mut camera = Camera::new(Vec3::ZERO, 10, 10, 40.0);
        let right = camera.right();
        camera.rotate_right(0.1);
        assert!((camera.direction().length() - 1.0).abs() < 1e-12);
        assert!(camera.direction().dot(right) > 0.0);
        camera.rotate_left(0.2);
        assert!(camera.direction().dot(right) < 0.0);
    }

    #[test]
    fn test_look_at_and_pose() {
        let mut camera = Camera::new(Vec3::new(-5.0, 0.0, 0.0), 10, 10, 40.0);
        camera.look_at(Vec3::new(-5.0, 3.0, 0.0));
        assert!(angle(camera.direction(), Vec3::Y) < 1e-9);

        let pose = CameraPose {
            position: Vec3::new(0.0, 5.0, 0.0),
            direction: Vec3::new(0.0, -2.0, 0.0),
        };
        camera.set_pose(pose);
        assert_eq!(camera.position(), pose.position);
        assert_eq!(camera.direction(), -Vec3::Y);

        // Zero-length direction is ignored.
        camera.look_at(camera.position());
        assert_eq!(camera.direction(), -Vec3::Y);
    }

    #[test]
    fn test_reset_and_resize() {
        let mut camera = Camera::new(Vec3::ZERO, 4, 4, 40.0);
        camera.pixels().set(1, 1, marcher_math::Color::WHITE);
        assert_eq!(camera.pixels().written_count(), 1);
        camera.reset();
        assert_eq!(camera.pixels().written_count(), 0);

        camera.resize(8, 2);
        assert_eq!(camera.pixels().width(), 8);
        assert_eq!(camera.pixels().height(), 2);
        assert!((camera.fov_vertical() - 40f64.to_radians()).abs() < 1e-12);
    }
}
