//! Scene container for the marcher.
//!
//! A scene is the set of surfaces the distance field is built from, the
//! lights that illuminate them, and the options governing both marching and
//! shading. Scenes are read concurrently by every render worker, so they are
//! only edited between render passes.

use crate::options::LightingOptions;
use crate::primitive::{Primitive, PrimitiveId};

/// Drawables + lights + lighting/trace configuration.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    /// Surfaces that make up the distance field
    drawables: Vec<Primitive>,

    /// Light sources (only marched against by shadow rays)
    lights: Vec<Primitive>,

    /// Lighting and trace configuration
    options: LightingOptions,
}

impl Scene {
    /// Create a scene with default options.
    pub fn new(drawables: Vec<Primitive>, lights: Vec<Primitive>) -> Self {
        Self::with_options(LightingOptions::default(), drawables, lights)
    }

    /// Create a scene with explicit options.
    pub fn with_options(
        options: LightingOptions,
        drawables: Vec<Primitive>,
        lights: Vec<Primitive>,
    ) -> Self {
        Self {
            drawables,
            lights,
            options,
        }
    }

    /// Append drawables.
    pub fn add_drawables(&mut self, drawables: impl IntoIterator<Item = Primitive>) {
        self.drawables.extend(drawables);
    }

    /// Append lights.
    pub fn add_lights(&mut self, lights: impl IntoIterator<Item = Primitive>) {
        self.lights.extend(lights);
    }

    pub fn drawables(&self) -> &[Primitive] {
        &self.drawables
    }

    pub fn lights(&self) -> &[Primitive] {
        &self.lights
    }

    pub fn options(&self) -> &LightingOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut LightingOptions {
        &mut self.options
    }

    /// Look up a drawable or light by id.
    pub fn find(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.drawables
            .iter()
            .chain(self.lights.iter())
            .find(|p| p.id() == id)
    }

    /// Total number of primitives, lights included.
    pub fn primitive_count(&self) -> usize {
        self.drawables.len() + self.lights.len()
    }
}
