//! Renderer errors.

use thiserror::Error;

/// Errors that can occur while driving a render.
///
/// Rays that miss or exhaust their step budget are not errors; they resolve
/// to a pixel like any other ray.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Render thread panicked")]
    RenderThreadPanicked,
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
