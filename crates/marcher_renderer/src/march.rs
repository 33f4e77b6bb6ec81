//! Sphere tracing through the scene's distance field.

use marcher_core::{Primitive, Scene};
use marcher_math::{unit, Ray, SlopeWindow, Vec3};

/// Fraction of the distance bound taken per step.
///
/// Stepping slightly short of the bound keeps rounding error from carrying
/// the ray through a surface it should have stopped at.
pub const STEP_SCALE: f64 = 0.95;

/// Seed for the slope window; reads as "moving away" on the first steps.
const SLOPE_SENTINEL: f64 = -1.0;

/// Which primitives a ray can stop at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarchTargets {
    /// Camera and reflection rays: lights are invisible.
    Drawables,
    /// Shadow rays: stop at lights too, so the caller can check which light
    /// was reached.
    DrawablesAndLights,
}

/// Outcome of marching one ray.
#[derive(Debug, Clone, Copy)]
pub struct MarchResult {
    /// Surface the ray stopped at, if any.
    pub hit: Option<Primitive>,
    /// Where the ray stopped.
    pub position: Vec3,
    /// Unit direction the ray travelled in.
    pub direction: Vec3,
    pub steps: u32,
    pub distance_traveled: f64,
    /// Hit threshold in effect at the final step. Also the normal sample offset.
    pub hit_threshold: f64,
    pub reached_max_steps: bool,
    pub reached_max_distance: bool,
}

impl MarchResult {
    pub fn is_hit(&self) -> bool {
        self.hit.is_some()
    }

    /// Surface normal at the stop position, or `None` for a miss.
    pub fn normal(&self) -> Option<Vec3> {
        self.hit
            .as_ref()
            .map(|primitive| surface_normal(primitive, self.position, self.hit_threshold))
    }
}

/// Closest primitive to `point` and its signed distance.
#[inline]
fn nearest<'a>(
    primitives: impl Iterator<Item = &'a Primitive>,
    point: Vec3,
    mut best: f64,
) -> (Option<&'a Primitive>, f64) {
    let mut closest = None;
    for primitive in primitives {
        let distance = primitive.distance(point);
        if distance < best {
            best = distance;
            closest = Some(primitive);
        }
    }
    (closest, best)
}

/// March `ray` through `scene` until it hits a surface or runs out of budget.
///
/// A hit requires the distance to be below the current threshold while the
/// recent distance samples are shrinking. Rays that start on a surface
/// (shadow and reflection rays) therefore leave it rather than stopping
/// immediately. Running out of steps reports the closest primitive of the
/// last step as the hit; running out of distance is a miss.
pub fn march(ray: &Ray, scene: &Scene, targets: MarchTargets) -> MarchResult {
    let trace = &scene.options().trace;
    let direction = unit(ray.direction());

    let mut position = ray.origin();
    let mut traveled = 0.0;
    let mut steps = 0u32;
    let mut window = SlopeWindow::new(SLOPE_SENTINEL);
    let mut threshold = trace.hit_threshold(0.0);
    let mut closest: Option<Primitive> = None;

    while traveled < trace.max_trace_distance && steps < trace.max_steps {
        let drawables = scene.drawables().iter();
        let (hit, distance) = match targets {
            MarchTargets::Drawables => nearest(drawables, position, trace.max_trace_distance),
            MarchTargets::DrawablesAndLights => nearest(
                drawables.chain(scene.lights()),
                position,
                trace.max_trace_distance,
            ),
        };
        closest = hit.copied();

        window.push(distance);
        threshold = trace.hit_threshold(traveled);

        if closest.is_some() && window.slope() < 0.0 && distance < threshold {
            if distance < 0.0 {
                // Overstepped into the surface; back out so the normal
                // samples straddle it.
                position += direction * (distance - threshold);
            }
            return MarchResult {
                hit: closest,
                position,
                direction,
                steps,
                distance_traveled: traveled,
                hit_threshold: threshold,
                reached_max_steps: false,
                reached_max_distance: false,
            };
        }

        let step = distance * STEP_SCALE;
        position += direction * step;
        traveled += step;
        steps += 1;
    }

    if traveled >= trace.max_trace_distance {
        return MarchResult {
            hit: None,
            position,
            direction,
            steps,
            distance_traveled: traveled,
            hit_threshold: threshold,
            reached_max_steps: false,
            reached_max_distance: true,
        };
    }

    log::trace!("Ray exhausted {steps} steps after {traveled:.3} units");
    MarchResult {
        hit: closest,
        position,
        direction,
        steps,
        distance_traveled: traveled,
        hit_threshold: threshold,
        reached_max_steps: true,
        reached_max_distance: false,
    }
}

/// Central-difference gradient of `primitive`'s distance at `point`.
///
/// `step` should be the hit threshold the ray stopped with, so the samples
/// straddle the surface the same way the hit test did.
pub fn surface_normal(primitive: &Primitive, point: Vec3, step: f64) -> Vec3 {
    let dx = Vec3::new(step, 0.0, 0.0);
    let dy = Vec3::new(0.0, step, 0.0);
    let dz = Vec3::new(0.0, 0.0, step);
    let gradient = Vec3::new(
        primitive.distance(point + dx) - primitive.distance(point - dx),
        primitive.distance(point + dy) - primitive.distance(point - dy),
        primitive.distance(point + dz) - primitive.distance(point - dz),
    );
    unit(gradient)
}
