//! Marcher Core - distance-field scene model.
//!
//! This crate provides:
//!
//! - **Primitives**: signed distance functions for spheres, boxes, tori,
//!   Mandelbulb fractals and point-like lights
//! - **Scene**: drawables + lights + the lighting/trace configuration
//! - **Scene files**: JSON scene descriptions loaded with serde
//!
//! # Example
//!
//! ```ignore
//! use marcher_core::{load_scene, Primitive, Scene};
//!
//! let scene = load_scene("scene.json")?;
//! println!("Loaded {} drawables, {} lights",
//!     scene.drawables().len(),
//!     scene.lights().len());
//! ```

pub mod loader;
pub mod options;
pub mod primitive;
pub mod scene;

// Re-export commonly used types
pub use loader::{load_scene, load_scene_from_str, LoadError, LoadResult, SceneDescription};
pub use options::{
    AmbientOcclusionOptions, DropoffOptions, LightingOptions, TraceOptions, VignetteOptions,
};
pub use primitive::{Primitive, PrimitiveId, ReflectionProperties, Shape, DEFAULT_REPEAT_DOMAIN};
pub use scene::Scene;
