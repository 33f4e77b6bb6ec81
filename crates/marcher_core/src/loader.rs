//! JSON scene descriptions.
//!
//! A description lists drawables and lights as tagged shapes plus optional
//! lighting overrides:
//!
//! ```json
//! {
//!   "options": { "shadows_enabled": true },
//!   "drawables": [
//!     { "type": "sphere", "center": [0, 0, 0], "radius": 1.0,
//!       "color": { "r": 255, "g": 255, "b": 255, "a": 255 } }
//!   ],
//!   "lights": [
//!     { "type": "light", "center": [-10, -10, -10], "radius": 0.001 }
//!   ]
//! }
//! ```

use std::path::Path;

use marcher_math::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::options::LightingOptions;
use crate::primitive::{Primitive, ReflectionProperties, Shape};
use crate::scene::Scene;

/// Errors that can occur while loading a scene description.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid primitive {index} in {list}: {message}")]
    InvalidPrimitive {
        list: &'static str,
        index: usize,
        message: String,
    },
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

fn default_color() -> Color {
    Color::WHITE
}

/// One primitive as written in a scene file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimitiveDescription {
    #[serde(flatten)]
    pub shape: Shape,

    #[serde(default = "default_color")]
    pub color: Color,

    /// Domain-repeat cell size, if the primitive tiles space.
    #[serde(default)]
    pub repeat: Option<f64>,

    #[serde(default)]
    pub reflection: ReflectionProperties,
}

impl PrimitiveDescription {
    fn build(&self, list: &'static str, index: usize) -> LoadResult<Primitive> {
        let invalid = |message: String| LoadError::InvalidPrimitive {
            list,
            index,
            message,
        };

        self.shape.validate().map_err(invalid)?;
        let mut primitive = Primitive::new(self.shape, self.color).with_reflection(self.reflection);
        if let Some(domain) = self.repeat {
            if !(domain.is_finite() && domain > 0.0) {
                return Err(invalid(format!(
                    "repeat domain must be positive and finite, got {domain}"
                )));
            }
            primitive = primitive.repeating(domain);
        }
        Ok(primitive)
    }
}

/// Top-level scene file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    pub options: LightingOptions,
    pub drawables: Vec<PrimitiveDescription>,
    pub lights: Vec<PrimitiveDescription>,
}

impl SceneDescription {
    /// Validate every primitive and build the scene.
    pub fn into_scene(self) -> LoadResult<Scene> {
        let drawables = self
            .drawables
            .iter()
            .enumerate()
            .map(|(i, d)| d.build("drawables", i))
            .collect::<LoadResult<Vec<_>>>()?;
        let lights = self
            .lights
            .iter()
            .enumerate()
            .map(|(i, d)| d.build("lights", i))
            .collect::<LoadResult<Vec<_>>>()?;

        Ok(Scene::with_options(self.options, drawables, lights))
    }
}

/// Load a scene description from a JSON file.
pub fn load_scene<P: AsRef<Path>>(path: P) -> LoadResult<Scene> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let scene = load_scene_from_str(&text)?;
    log::info!(
        "Loaded scene {}: {} drawables, {} lights",
        path.display(),
        scene.drawables().len(),
        scene.lights().len()
    );
    Ok(scene)
}

/// Load a scene description from a JSON string.
pub fn load_scene_from_str(text: &str) -> LoadResult<Scene> {
    let description: SceneDescription = serde_json::from_str(text)?;
    description.into_scene()
}
