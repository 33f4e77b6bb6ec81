//! 8-bit RGBA color and conversion to and from `[0, 1]` vectors.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::Vec3;

/// 4-channel 8-bit color.
///
/// For lights the alpha channel doubles as brightness.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Alpha as a `[0, 1]` factor.
    #[inline]
    pub fn brightness(&self) -> f64 {
        f64::from(self.a) / 255.0
    }

    /// RGB channels as a `[0, 1]` vector.
    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        rgba_to_vec3(self)
    }

    /// Pack into a single word, for lock-free pixel storage.
    #[inline]
    pub fn to_bits(self) -> u32 {
        bytemuck::cast(self)
    }

    #[inline]
    pub fn from_bits(bits: u32) -> Self {
        bytemuck::cast(bits)
    }

    #[inline]
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Convert the RGB channels to a `[0, 1]` vector. Alpha is dropped.
#[inline]
pub fn rgba_to_vec3(color: Color) -> Vec3 {
    Vec3::new(f64::from(color.r), f64::from(color.g), f64::from(color.b)) / 255.0
}

/// Convert a `[0, 1]` vector to a color with the given alpha.
///
/// Channels are clamped and rounded to the nearest 8-bit step, so a vector
/// produced by [`rgba_to_vec3`] converts back to the same color.
#[inline]
pub fn vec3_to_rgba(v: Vec3, a: u8) -> Color {
    let scaled = (v.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    Color::new(scaled.x as u8, scaled.y as u8, scaled.z as u8, a)
}
