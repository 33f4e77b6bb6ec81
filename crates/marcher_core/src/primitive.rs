//! Signed distance primitives.
//!
//! Every primitive answers one question for the marcher: how far is this
//! point from my surface? The answer must never overestimate the true
//! Euclidean distance, because the marcher steps by it. The Mandelbulb
//! estimator is the exception that proves the rule: it is a heuristic lower
//! bound, and with a high power or few iterations it can miss fine detail.

use std::f64::consts::E;
use std::sync::atomic::{AtomicU64, Ordering};

use marcher_math::{rgba_to_vec3, Color, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Cell size used by [`Primitive::repeating`] callers that don't care.
pub const DEFAULT_REPEAT_DOMAIN: f64 = 20.0;

/// Default Mandelbulb iteration count.
pub const DEFAULT_MANDEL_ITERATIONS: u32 = 60;

/// Default Mandelbulb escape radius.
pub const DEFAULT_MANDEL_BAILOUT: f64 = 1.5;

/// Default Mandelbulb power (the classic 8-fold bulb).
pub const DEFAULT_MANDEL_POWER: f64 = 8.0;

/// Identity of a primitive.
///
/// Shading compares surfaces found by independent marches ("did the shadow
/// ray reach the light I aimed at?"), so identity is by id, never by address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId(u64);

impl PrimitiveId {
    /// Allocate a process-unique id.
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Material coefficients consumed by the shading pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionProperties {
    /// Always visible, regardless of lights in the scene.
    pub ambient: f64,
    /// Matte reflection of light falling directly onto the surface.
    pub lambertian: f64,
    /// Mirror-like highlight of a light source toward the eye.
    pub specular: f64,
    /// 0 = highlight takes the light's color, 1 = the surface's color.
    pub metalness: f64,
    /// Highlight sharpness; exponent of the specular term.
    pub smoothness: f64,
    /// Blend weight of the recursively traced reflection.
    pub reflectivity: f64,
}

impl ReflectionProperties {
    /// All coefficients zero. Lights report this.
    pub const NONE: ReflectionProperties = ReflectionProperties {
        ambient: 0.0,
        lambertian: 0.0,
        specular: 0.0,
        metalness: 0.0,
        smoothness: 0.0,
        reflectivity: 0.0,
    };
}

impl Default for ReflectionProperties {
    fn default() -> Self {
        Self {
            ambient: 0.0,
            lambertian: 1.0,
            specular: 0.0,
            metalness: 1.0,
            smoothness: 1.0,
            reflectivity: 0.0,
        }
    }
}

/// Geometry of a primitive, in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Sphere {
        center: Vec3,
        radius: f64,
    },
    /// Axis-aligned box.
    Box {
        center: Vec3,
        half_extents: Vec3,
    },
    /// Ring lying in the XY plane around the Z axis.
    Torus {
        center: Vec3,
        major_radius: f64,
        minor_radius: f64,
    },
    MandelBulb {
        center: Vec3,
        #[serde(default = "default_mandel_power")]
        power: f64,
        #[serde(default = "default_mandel_bailout")]
        bailout: f64,
        #[serde(default = "default_mandel_iterations")]
        iterations: u32,
    },
    /// Emitter with a (usually tiny) spherical extent so rays can hit it.
    Light {
        center: Vec3,
        radius: f64,
    },
}

fn default_mandel_power() -> f64 {
    DEFAULT_MANDEL_POWER
}

fn default_mandel_bailout() -> f64 {
    DEFAULT_MANDEL_BAILOUT
}

fn default_mandel_iterations() -> u32 {
    DEFAULT_MANDEL_ITERATIONS
}

impl Shape {
    /// Signed distance from `point` to the surface (negative inside).
    #[inline]
    pub fn distance(&self, point: Vec3) -> f64 {
        match *self {
            Shape::Sphere { center, radius } | Shape::Light { center, radius } => {
                (point - center).length() - radius
            }
            Shape::Box {
                center,
                half_extents,
            } => {
                let q = (point - center).abs() - half_extents;
                q.max(Vec3::ZERO).length() + q.max_element().min(0.0)
            }
            Shape::Torus {
                center,
                major_radius,
                minor_radius,
            } => {
                let p = point - center;
                let q = Vec2::new(Vec2::new(p.x, p.y).length() - major_radius, p.z);
                q.length() - minor_radius
            }
            Shape::MandelBulb {
                center,
                power,
                bailout,
                iterations,
            } => mandel_bulb_distance(point - center, power, bailout, iterations),
        }
    }

    /// Anchor position of the shape.
    pub fn position(&self) -> Vec3 {
        match *self {
            Shape::Sphere { center, .. }
            | Shape::Box { center, .. }
            | Shape::Torus { center, .. }
            | Shape::MandelBulb { center, .. }
            | Shape::Light { center, .. } => center,
        }
    }

    /// Check the size parameters, returning a description of the first
    /// problem found.
    pub fn validate(&self) -> Result<(), String> {
        fn positive(name: &str, value: f64) -> Result<(), String> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(format!("{name} must be positive and finite, got {value}"))
            }
        }

        if !self.position().is_finite() {
            return Err(format!("center must be finite, got {}", self.position()));
        }
        match *self {
            Shape::Sphere { radius, .. } => positive("sphere radius", radius),
            Shape::Light { radius, .. } => positive("light radius", radius),
            Shape::Box { half_extents, .. } => {
                positive("box half extent x", half_extents.x)?;
                positive("box half extent y", half_extents.y)?;
                positive("box half extent z", half_extents.z)
            }
            Shape::Torus {
                major_radius,
                minor_radius,
                ..
            } => {
                positive("torus major radius", major_radius)?;
                positive("torus minor radius", minor_radius)
            }
            Shape::MandelBulb {
                power,
                bailout,
                iterations,
                ..
            } => {
                if !(power.is_finite() && power > 1.0) {
                    return Err(format!("mandel bulb power must exceed 1, got {power}"));
                }
                if iterations == 0 {
                    return Err("mandel bulb needs at least one iteration".to_string());
                }
                positive("mandel bulb bailout", bailout)
            }
        }
    }
}

/// Escape-time distance estimate for the power-`power` Mandelbulb centered
/// at the origin.
///
/// Iterates `z <- z^power + p` in spherical coordinates while tracking the
/// running derivative `dr`, then returns `0.5 * ln(r) * r / dr`. A point that
/// escapes before the first iteration has `dr == 1`, where the log estimate
/// overshoots badly for large `r`; beyond `r = e` that case falls back to the
/// distance to a sphere of radius `e / 2` enclosing the bulb.
fn mandel_bulb_distance(p: Vec3, power: f64, bailout: f64, iterations: u32) -> f64 {
    let mut z = p;
    let mut dr = 1.0;
    let mut r = 0.0;
    let mut completed = 0;

    for _ in 0..iterations {
        r = z.length();
        if r > bailout {
            break;
        }
        completed += 1;

        if r == 0.0 {
            // 0^power is 0 and the derivative restarts at 1.
            z = p;
            dr = 1.0;
            continue;
        }

        let theta = (z.z / r).acos() * power;
        let phi = z.y.atan2(z.x) * power;
        dr = r.powf(power - 1.0) * power * dr + 1.0;

        let zr = r.powf(power);
        z = Vec3::new(
            theta.sin() * phi.cos(),
            phi.sin() * theta.sin(),
            theta.cos(),
        ) * zr
            + p;
    }

    if completed == 0 && r >= E {
        return r - E / 2.0;
    }
    let r = r.max(f64::EPSILON);
    0.5 * r.ln() * r / dr
}

/// Fold a point into the periodic cell of size `domain` centered on the
/// origin.
#[inline]
fn repeat_point(point: Vec3, domain: f64) -> Vec3 {
    let half = domain / 2.0;
    let fold = |c: f64| (c + half).rem_euclid(domain) - half;
    Vec3::new(fold(point.x), fold(point.y), fold(point.z))
}

/// A surface in the scene: shape, color, identity and material.
///
/// Primitives are small immutable values; the scene owns them and the
/// marcher copies the one it hits into its result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primitive {
    shape: Shape,
    color: Color,
    id: PrimitiveId,
    repeat: Option<f64>,
    reflection: ReflectionProperties,
}

impl Primitive {
    /// Create a primitive with a fresh id and default material.
    pub fn new(shape: Shape, color: Color) -> Self {
        let reflection = if matches!(shape, Shape::Light { .. }) {
            ReflectionProperties::NONE
        } else {
            ReflectionProperties::default()
        };
        Self {
            shape,
            color,
            id: PrimitiveId::next(),
            repeat: None,
            reflection,
        }
    }

    pub fn sphere(center: Vec3, radius: f64, color: Color) -> Self {
        Self::new(Shape::Sphere { center, radius }, color)
    }

    /// Cube with the given half side length.
    pub fn cube(center: Vec3, half_size: f64, color: Color) -> Self {
        Self::cuboid(center, Vec3::splat(half_size), color)
    }

    pub fn cuboid(center: Vec3, half_extents: Vec3, color: Color) -> Self {
        Self::new(
            Shape::Box {
                center,
                half_extents,
            },
            color,
        )
    }

    pub fn torus(center: Vec3, major_radius: f64, minor_radius: f64, color: Color) -> Self {
        Self::new(
            Shape::Torus {
                center,
                major_radius,
                minor_radius,
            },
            color,
        )
    }

    /// Mandelbulb with the default bailout and iteration count.
    pub fn mandel_bulb(center: Vec3, power: f64, color: Color) -> Self {
        Self::new(
            Shape::MandelBulb {
                center,
                power,
                bailout: DEFAULT_MANDEL_BAILOUT,
                iterations: DEFAULT_MANDEL_ITERATIONS,
            },
            color,
        )
    }

    /// Light source. The color's alpha channel is its brightness.
    pub fn light(center: Vec3, radius: f64, color: Color) -> Self {
        Self::new(Shape::Light { center, radius }, color)
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Replace the material. Lights ignore this and stay non-reflective.
    pub fn with_reflection(mut self, reflection: ReflectionProperties) -> Self {
        if !self.is_light() {
            self.reflection = reflection;
        }
        self
    }

    /// Tile this primitive through space with period `domain` on every axis.
    pub fn repeating(mut self, domain: f64) -> Self {
        self.repeat = Some(domain);
        self
    }

    /// Signed distance from `point` to this primitive's surface.
    #[inline]
    pub fn distance(&self, point: Vec3) -> f64 {
        match self.repeat {
            Some(domain) => self.shape.distance(repeat_point(point, domain)),
            None => self.shape.distance(point),
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// RGB color as a `[0, 1]` vector.
    pub fn color_vec(&self) -> Vec3 {
        rgba_to_vec3(self.color)
    }

    pub fn position(&self) -> Vec3 {
        self.shape.position()
    }

    pub fn id(&self) -> PrimitiveId {
        self.id
    }

    pub fn is_light(&self) -> bool {
        matches!(self.shape, Shape::Light { .. })
    }

    pub fn reflection(&self) -> &ReflectionProperties {
        &self.reflection
    }

    pub fn repeat_domain(&self) -> Option<f64> {
        self.repeat
    }

    /// True when both refer to the same surface.
    #[inline]
    pub fn same_surface(&self, other: &Primitive) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_sphere_surface_is_zero() {
        let center = Vec3::new(1.0, -2.0, 3.0);
        let sphere = Primitive::sphere(center, 1.5, Color::WHITE);

        let directions = [
            Vec3::X,
            -Vec3::Y,
            Vec3::Z,
            Vec3::new(1.0, 1.0, 1.0).normalize(),
            Vec3::new(-0.3, 0.8, -0.1).normalize(),
        ];
        for dir in directions {
            let d = sphere.distance(center + dir * 1.5);
            assert!(approx(d, 0.0, 1e-12), "distance on surface was {d}");
        }

        assert!(sphere.distance(center) < 0.0);
        assert!(sphere.distance(center + Vec3::X) < 0.0);
        assert!(approx(sphere.distance(center + Vec3::X * 4.0), 2.5, 1e-12));
    }

    #[test]
    fn test_box_distance() {
        let b = Primitive::cuboid(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0), Color::WHITE);

        assert!(approx(b.distance(Vec3::new(2.0, 0.0, 0.0)), 1.0, 1e-12));
        assert!(approx(b.distance(Vec3::new(0.0, 0.0, 5.0)), 2.0, 1e-12));
        // Corner region uses the Euclidean norm.
        assert!(approx(
            b.distance(Vec3::new(2.0, 3.0, 3.0)),
            2.0_f64.sqrt(),
            1e-12
        ));
        // Interior is negative: nearest face is x at distance 0.5.
        assert!(approx(b.distance(Vec3::new(0.5, 0.0, 0.0)), -0.5, 1e-12));
    }

    #[test]
    fn test_torus_distance() {
        let t = Primitive::torus(Vec3::ZERO, 4.0, 0.5, Color::WHITE);

        // On the tube's center line.
        assert!(approx(t.distance(Vec3::new(4.0, 0.0, 0.0)), -0.5, 1e-12));
        // Through the hole, on the axis.
        assert!(approx(t.distance(Vec3::ZERO), 3.5, 1e-12));
        // Above the tube.
        assert!(approx(t.distance(Vec3::new(0.0, 4.0, 2.0)), 1.5, 1e-12));
    }

    #[test]
    fn test_mandel_bulb_distance_is_sane() {
        let bulb = Primitive::mandel_bulb(Vec3::ZERO, 8.0, Color::WHITE);

        // Far away: the bounding-sphere fallback keeps the estimate under
        // the true distance (the bulb fits in radius ~1.2).
        let far = bulb.distance(Vec3::new(10.0, 0.0, 0.0));
        assert!(far > 0.0 && far < 10.0, "far estimate {far}");

        // The origin is inside the set.
        let inside = bulb.distance(Vec3::ZERO);
        assert!(inside.is_finite());
        assert!(inside <= 0.0);

        // Nearer points report smaller distances.
        let near = bulb.distance(Vec3::new(2.0, 0.0, 0.0));
        assert!(near.is_finite() && near > 0.0);
        assert!(near < far);
    }

    #[test]
    fn test_mandel_bulb_translated() {
        let offset = Vec3::new(5.0, 5.0, 5.0);
        let at_origin = Primitive::mandel_bulb(Vec3::ZERO, 8.0, Color::WHITE);
        let moved = Primitive::mandel_bulb(offset, 8.0, Color::WHITE);
        let p = Vec3::new(1.3, -0.2, 0.4);
        assert!(approx(
            at_origin.distance(p),
            moved.distance(p + offset),
            1e-9
        ));
    }

    #[test]
    fn test_repeating_is_periodic() {
        let domain = DEFAULT_REPEAT_DOMAIN;
        let shapes = [
            Primitive::sphere(Vec3::new(1.0, 0.0, 0.0), 1.0, Color::WHITE).repeating(domain),
            Primitive::cube(Vec3::ZERO, 2.0, Color::WHITE).repeating(domain),
            Primitive::torus(Vec3::ZERO, 3.0, 0.5, Color::WHITE).repeating(domain),
        ];
        let p = Vec3::new(0.7, -3.1, 2.2);

        for shape in shapes {
            let base = shape.distance(p);
            for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
                for k in [-3.0, -1.0, 1.0, 2.0, 7.0] {
                    let shifted = shape.distance(p + axis * (k * domain));
                    assert!(
                        approx(base, shifted, 1e-9),
                        "k={k} axis={axis}: {base} vs {shifted}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Primitive::sphere(Vec3::ZERO, 1.0, Color::WHITE);
        let b = Primitive::sphere(Vec3::ZERO, 1.0, Color::WHITE);
        assert_ne!(a.id(), b.id());
        assert!(!a.same_surface(&b));

        let copy = a;
        assert!(a.same_surface(&copy));
    }

    #[test]
    fn test_lights_are_not_reflective() {
        let light = Primitive::light(Vec3::ZERO, 0.1, Color::WHITE).with_reflection(
            ReflectionProperties {
                reflectivity: 1.0,
                ..Default::default()
            },
        );
        assert!(light.is_light());
        assert_eq!(*light.reflection(), ReflectionProperties::NONE);
    }

    #[test]
    fn test_validate() {
        assert!(Shape::Sphere {
            center: Vec3::ZERO,
            radius: 1.0
        }
        .validate()
        .is_ok());
        assert!(Shape::Sphere {
            center: Vec3::ZERO,
            radius: -1.0
        }
        .validate()
        .is_err());
        assert!(Shape::MandelBulb {
            center: Vec3::ZERO,
            power: 8.0,
            bailout: 1.5,
            iterations: 0,
        }
        .validate()
        .is_err());
    }
}
