//! Lighting and trace configuration.
//!
//! All option structs deserialize with `#[serde(default)]`, so a scene file
//! only has to mention the values it changes.

use marcher_math::Color;
use serde::{Deserialize, Serialize};

/// Trace distance used to derive the other defaults.
const DEFAULT_MAX_TRACE_DISTANCE: f64 = 5000.0;

/// Default recursion cap for reflections.
pub const DEFAULT_MAX_REFLECTION_DEPTH: u32 = 100;

/// Marching termination and hit-threshold settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceOptions {
    /// Hit threshold close to the camera.
    pub min_hit_distance: f64,
    /// Hit threshold at `max_trace_distance` when level of detail is on.
    pub max_hit_distance: f64,
    /// Rays that travel this far are misses.
    pub max_trace_distance: f64,
    /// Step budget per ray.
    pub max_steps: u32,
    /// Relax the hit threshold with distance traveled.
    pub level_of_detail: bool,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            min_hit_distance: 0.0001,
            max_hit_distance: 10.0,
            max_trace_distance: DEFAULT_MAX_TRACE_DISTANCE,
            max_steps: 100_000,
            level_of_detail: true,
        }
    }
}

impl TraceOptions {
    /// Hit threshold for a sample `traveled` units from the ray origin.
    ///
    /// Grows with the square of the traveled fraction, so far surfaces that
    /// cover little of the screen register a hit in fewer steps.
    #[inline]
    pub fn hit_threshold(&self, traveled: f64) -> f64 {
        if !self.level_of_detail || self.max_trace_distance <= 0.0 {
            return self.min_hit_distance;
        }
        let fraction = (traveled / self.max_trace_distance).clamp(0.0, 1.0);
        let spread = (self.max_hit_distance - self.min_hit_distance).max(0.0);
        self.min_hit_distance + spread * fraction * fraction
    }
}

/// Step-count ambient occlusion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientOcclusionOptions {
    pub enabled: bool,
    /// Brighten occluded areas instead of darkening them.
    pub inverted: bool,
    /// Step count treated as fully occluded.
    pub max_steps: f64,
}

impl Default for AmbientOcclusionOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            inverted: false,
            max_steps: (DEFAULT_MAX_TRACE_DISTANCE * 10.0).sqrt() / 10.0 + 150.0,
        }
    }
}

/// Distance fog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropoffOptions {
    pub enabled: bool,
    /// Color blended in as distance grows.
    pub color: Color,
    /// Distance at which the blend is complete.
    pub distance: f64,
}

impl Default for DropoffOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            color: Color::TRANSPARENT,
            distance: DEFAULT_MAX_TRACE_DISTANCE / 25.0,
        }
    }
}

/// Radial darkening toward the image corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VignetteOptions {
    pub enabled: bool,
    pub strength: f64,
}

impl Default for VignetteOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            strength: 0.05,
        }
    }
}

/// Everything the shading pipeline reads from the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingOptions {
    /// March a visibility ray toward each light before it contributes.
    pub shadows_enabled: bool,
    pub reflections_enabled: bool,
    pub max_reflection_depth: u32,
    pub ambient_occlusion: AmbientOcclusionOptions,
    pub dropoff: DropoffOptions,
    pub vignette: VignetteOptions,
    /// Color of rays that hit nothing. Its alpha is used for every pixel.
    pub background_color: Color,
    pub trace: TraceOptions,
}

impl Default for LightingOptions {
    fn default() -> Self {
        Self {
            shadows_enabled: true,
            reflections_enabled: true,
            max_reflection_depth: DEFAULT_MAX_REFLECTION_DEPTH,
            ambient_occlusion: AmbientOcclusionOptions::default(),
            dropoff: DropoffOptions::default(),
            vignette: VignetteOptions::default(),
            background_color: Color::BLACK,
            trace: TraceOptions::default(),
        }
    }
}

impl LightingOptions {
    /// Plain lighting only: no occlusion, fog, vignette or reflections.
    ///
    /// Handy for tests and previews where the post effects would hide what
    /// is being looked at.
    pub fn unprocessed() -> Self {
        Self {
            reflections_enabled: false,
            ambient_occlusion: AmbientOcclusionOptions {
                enabled: false,
                ..Default::default()
            },
            dropoff: DropoffOptions {
                enabled: false,
                ..Default::default()
            },
            vignette: VignetteOptions {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
