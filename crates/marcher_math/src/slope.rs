//! Fixed three-sample window over recent distance estimates.

/// Ring buffer of the last three minimum-distance samples taken along a ray.
///
/// The marcher only declares a hit while the distance field is shrinking;
/// the window's slope is how it tells. Seeding with a negative sentinel makes
/// the first samples read as "growing", so a ray that starts right on a
/// surface (shadow and reflection rays) walks away from it instead of
/// hitting it immediately.
#[derive(Debug, Clone, Copy)]
pub struct SlopeWindow {
    samples: [f64; 3],
    head: usize,
}

impl SlopeWindow {
    /// Create a window filled with `fill`.
    pub fn new(fill: f64) -> Self {
        Self {
            samples: [fill; 3],
            head: 0,
        }
    }

    /// Push the newest sample, evicting the oldest.
    #[inline]
    pub fn push(&mut self, value: f64) {
        self.samples[self.head] = value;
        self.head = (self.head + 1) % 3;
    }

    /// Sample `age` pushes ago (0 = newest, 2 = oldest).
    #[inline]
    pub fn get(&self, age: usize) -> f64 {
        debug_assert!(age < 3);
        self.samples[(self.head + 2 - age % 3) % 3]
    }

    /// Mean of the two most recent differences. Negative while approaching.
    #[inline]
    pub fn slope(&self) -> f64 {
        let newest = self.get(0);
        let middle = self.get(1);
        let oldest = self.get(2);
        ((newest - middle) + (middle - oldest)) / 2.0
    }
}
