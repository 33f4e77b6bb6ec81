//! Restartable background rendering for live previews.

use std::sync::Arc;

use crate::camera::Camera;
use crate::error::{RenderError, RenderResult};
use crate::pixels::PixelBuffer;
use crate::renderer::{FrameStats, RenderHandle, Renderer};

/// Keeps at most one pass in flight and restarts it whenever the camera
/// changes.
///
/// A camera edit cancels the running pass, waits for its workers, applies
/// the edit, clears the pixels and launches a fresh pass. A display thread
/// can read [`InteractiveSession::pixels`] at any time and sees a sparse but
/// evenly spread image while a pass is still filling in.
pub struct InteractiveSession {
    renderer: Arc<Renderer>,
    workers: usize,
    in_flight: Option<RenderHandle>,
}

impl InteractiveSession {
    pub fn new(renderer: Arc<Renderer>, workers: usize) -> RenderResult<Self> {
        if workers == 0 {
            return Err(RenderError::InvalidWorkerCount(workers));
        }
        Ok(Self {
            renderer,
            workers,
            in_flight: None,
        })
    }

    pub fn renderer(&self) -> &Arc<Renderer> {
        &self.renderer
    }

    /// Launch a pass unless one is already running.
    pub fn start(&mut self) -> RenderResult<()> {
        if self.in_flight.as_ref().is_some_and(|h| !h.is_finished()) {
            return Ok(());
        }
        self.reap()?;
        self.in_flight = Some(self.renderer.render_frame_cancellable(self.workers)?);
        Ok(())
    }

    /// Collect a finished pass, if any.
    fn reap(&mut self) -> RenderResult<Option<FrameStats>> {
        match self.in_flight.take() {
            Some(handle) => handle.join().map(Some),
            None => Ok(None),
        }
    }

    /// Cancel the running pass and wait for it to return.
    pub fn stop(&mut self) -> RenderResult<Option<FrameStats>> {
        if let Some(handle) = self.in_flight.as_ref() {
            handle.cancel();
        }
        let stats = self.reap();
        // The pass may have finished before seeing the request.
        self.renderer.clear_cancel();
        stats
    }

    /// Apply a camera edit and restart rendering from a blank frame.
    pub fn update_camera(&mut self, edit: impl FnOnce(&mut Camera)) -> RenderResult<()> {
        self.stop()?;
        self.renderer.update_camera(|camera| {
            edit(camera);
            camera.reset();
        });
        self.start()
    }

    /// True once the current pass has returned (or none was started).
    pub fn is_idle(&self) -> bool {
        self.in_flight.as_ref().map_or(true, RenderHandle::is_finished)
    }

    /// Wait for the current pass without cancelling it.
    pub fn wait(&mut self) -> RenderResult<Option<FrameStats>> {
        self.reap()
    }

    pub fn pixels(&self) -> Arc<PixelBuffer> {
        self.renderer.pixels()
    }
}

impl Drop for InteractiveSession {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            log::warn!("Interactive render ended with error: {err}");
        }
    }
}
