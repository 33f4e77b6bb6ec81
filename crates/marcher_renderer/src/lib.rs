//! Marcher Renderer - CPU Sphere Tracing
//!
//! Renders signed distance field scenes by marching one ray per pixel
//! through the field, with:
//! - Shadow rays toward every light
//! - Bounded recursive reflections
//! - Step-count ambient occlusion, distance fog and vignette
//! - A cancellable worker pool that fills the frame in random order

mod animation;
mod camera;
mod error;
mod interactive;
mod march;
mod partition;
mod pixels;
mod renderer;
mod shading;

pub use animation::orbit_poses;
pub use camera::{Camera, CameraPose};
pub use error::{RenderError, RenderResult};
pub use interactive::InteractiveSession;
pub use march::{march, surface_normal, MarchResult, MarchTargets, STEP_SCALE};
pub use partition::{partition, pixel_coords, PermutationCache, PermutationKey, WorkRange};
pub use pixels::PixelBuffer;
pub use renderer::{FrameStats, RenderHandle, RenderOutcome, RenderStatus, Renderer};
pub use shading::{post_process, shade, shade_pixel};

/// Re-export the scene model and math types
pub use marcher_core::{LightingOptions, Primitive, PrimitiveId, ReflectionProperties, Scene};
pub use marcher_math::{Color, Ray, Vec3};
