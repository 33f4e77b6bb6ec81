//! Render orchestration: one frame at a time across a pool of workers.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use marcher_core::Scene;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::camera::{Camera, CameraPose};
use crate::error::{RenderError, RenderResult};
use crate::partition::{partition, pixel_coords, PermutationCache, PermutationKey};
use crate::pixels::PixelBuffer;
use crate::shading::shade_pixel;

/// Where the renderer is in its pass lifecycle.
///
/// `Completed` and `Cancelled` describe the most recent pass and hold until
/// the next one starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RenderStatus {
    Idle = 0,
    Running = 1,
    Completed = 2,
    Cancelled = 3,
}

impl RenderStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => RenderStatus::Running,
            2 => RenderStatus::Completed,
            3 => RenderStatus::Cancelled,
            _ => RenderStatus::Idle,
        }
    }
}

/// How a pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Every pixel was written.
    Completed,
    /// Workers stopped early; some pixels keep their previous contents.
    Cancelled,
}

/// Statistics for one render pass.
#[derive(Debug, Clone, Copy)]
pub struct FrameStats {
    pub outcome: RenderOutcome,
    pub pixels_rendered: usize,
    pub total_pixels: usize,
    pub workers: usize,
    pub elapsed: Duration,
}

impl FrameStats {
    pub fn is_complete(&self) -> bool {
        self.outcome == RenderOutcome::Completed
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Renders a scene through a camera.
///
/// A pass holds read access to the scene and camera for its whole duration,
/// so edits made through [`Renderer::update_scene`] or
/// [`Renderer::update_camera`] wait for it to finish. Workers write disjoint
/// pixels and poll `cancel_requested` before each one.
pub struct Renderer {
    scene: RwLock<Scene>,
    camera: RwLock<Camera>,

    is_done: AtomicBool,
    cancel_requested: AtomicBool,
    status: AtomicU8,

    // Progress of the current pass
    rendered: AtomicUsize,
    total: AtomicUsize,

    // Serializes passes
    pass: Mutex<()>,
    permutations: Mutex<PermutationCache>,
    pool: Mutex<Option<(usize, Arc<ThreadPool>)>>,
}

impl Renderer {
    pub fn new(scene: Scene, camera: Camera) -> Self {
        Self::with_permutations(scene, camera, PermutationCache::new())
    }

    /// Use a specific permutation cache, e.g. a seeded one.
    pub fn with_permutations(scene: Scene, camera: Camera, permutations: PermutationCache) -> Self {
        Self {
            scene: RwLock::new(scene),
            camera: RwLock::new(camera),
            is_done: AtomicBool::new(true),
            cancel_requested: AtomicBool::new(false),
            status: AtomicU8::new(RenderStatus::Idle as u8),
            rendered: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            pass: Mutex::new(()),
            permutations: Mutex::new(permutations),
            pool: Mutex::new(None),
        }
    }

    /// Thread pool with exactly `workers` threads, rebuilt only when the
    /// count changes.
    fn thread_pool(&self, workers: usize) -> RenderResult<Arc<ThreadPool>> {
        let mut cached = lock(&self.pool);
        if let Some((count, pool)) = cached.as_ref() {
            if *count == workers {
                return Ok(Arc::clone(pool));
            }
        }
        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("marcher-worker-{i}"))
                .build()?,
        );
        *cached = Some((workers, Arc::clone(&pool)));
        Ok(pool)
    }

    /// Render one frame into the camera's pixel buffer, blocking until every
    /// worker has returned.
    ///
    /// Returns [`RenderOutcome::Cancelled`] if a cancellation request stopped
    /// the workers before every pixel was written. The request is cleared
    /// when the pass ends.
    pub fn render_frame(&self, workers: usize) -> RenderResult<FrameStats> {
        if workers == 0 {
            return Err(RenderError::InvalidWorkerCount(workers));
        }

        let _pass = lock(&self.pass);
        let scene = read(&self.scene);
        let camera = read(&self.camera);
        let pool = self.thread_pool(workers)?;

        let (width, height) = (camera.width(), camera.height());
        let total = camera.pixel_count();
        let ranges = partition(total, workers);
        let orders: Vec<Arc<[usize]>> = {
            let mut cache = lock(&self.permutations);
            ranges
                .iter()
                .map(|range| {
                    let key = PermutationKey {
                        worker: range.worker,
                        width,
                        height,
                        workers,
                    };
                    cache.order_for(key, *range)
                })
                .collect()
        };

        self.is_done.store(false, Ordering::SeqCst);
        self.rendered.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
        self.status
            .store(RenderStatus::Running as u8, Ordering::SeqCst);
        log::debug!("Rendering {width}x{height} with {workers} workers");

        let start = Instant::now();
        let scene: &Scene = &scene;
        let camera: &Camera = &camera;
        let pixels = camera.pixels();

        pool.scope(|s| {
            for order in &orders {
                s.spawn(move |_| {
                    for &index in order.iter() {
                        if self.cancel_requested.load(Ordering::Relaxed) {
                            return;
                        }
                        let (x, y) = pixel_coords(index, height);
                        pixels.set(x, y, shade_pixel(scene, camera, x, y));
                        self.rendered.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        });

        let elapsed = start.elapsed();
        let pixels_rendered = self.rendered.load(Ordering::SeqCst);
        let outcome = if pixels_rendered < total {
            RenderOutcome::Cancelled
        } else {
            RenderOutcome::Completed
        };

        self.cancel_requested.store(false, Ordering::SeqCst);
        let status = match outcome {
            RenderOutcome::Completed => RenderStatus::Completed,
            RenderOutcome::Cancelled => RenderStatus::Cancelled,
        };
        self.status.store(status as u8, Ordering::SeqCst);
        self.is_done.store(true, Ordering::SeqCst);

        match outcome {
            RenderOutcome::Completed => log::info!(
                "Rendered {width}x{height} in {:.2}s",
                elapsed.as_secs_f64()
            ),
            RenderOutcome::Cancelled => log::debug!(
                "Render cancelled after {pixels_rendered}/{total} pixels"
            ),
        }

        Ok(FrameStats {
            outcome,
            pixels_rendered,
            total_pixels: total,
            workers,
            elapsed,
        })
    }

    /// Start a pass on a background thread.
    pub fn render_frame_cancellable(self: &Arc<Self>, workers: usize) -> RenderResult<RenderHandle> {
        if workers == 0 {
            return Err(RenderError::InvalidWorkerCount(workers));
        }
        let renderer = Arc::clone(self);
        let thread = std::thread::Builder::new()
            .name("marcher-render".into())
            .spawn(move || renderer.render_frame(workers))?;
        Ok(RenderHandle {
            renderer: Arc::clone(self),
            thread,
        })
    }

    /// Render each pose to completion and write it as the next numbered
    /// PNG in `out_dir`. Returns the written paths.
    ///
    /// `on_frame` is called after each frame is written, with its stats and
    /// path.
    pub fn render_sequence<P: AsRef<Path>>(
        &self,
        poses: &[CameraPose],
        workers: usize,
        out_dir: P,
        mut on_frame: impl FnMut(&FrameStats, &Path),
    ) -> RenderResult<Vec<PathBuf>> {
        let out_dir = out_dir.as_ref();
        let mut written = Vec::with_capacity(poses.len());

        for (frame, pose) in poses.iter().enumerate() {
            self.update_camera(|camera| {
                camera.set_pose(*pose);
                camera.reset();
            });

            let stats = self.render_frame(workers)?;
            if !stats.is_complete() {
                log::warn!("Sequence cancelled at frame {}/{}", frame + 1, poses.len());
                break;
            }

            let path = self.camera().flush_to_disk(out_dir)?;
            log::debug!("Frame {}/{} done", frame + 1, poses.len());
            on_frame(&stats, &path);
            written.push(path);
        }

        Ok(written)
    }

    /// Ask in-flight workers to stop before their next pixel.
    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    /// Drop a cancellation request that no pass consumed.
    pub fn clear_cancel(&self) {
        self.cancel_requested.store(false, Ordering::SeqCst);
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    /// False only while a pass is running.
    pub fn is_done(&self) -> bool {
        self.is_done.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> RenderStatus {
        RenderStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    /// Pixels rendered so far in the current (or last) pass, and its total.
    pub fn progress(&self) -> (usize, usize) {
        (
            self.rendered.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
        )
    }

    pub fn scene(&self) -> RwLockReadGuard<'_, Scene> {
        read(&self.scene)
    }

    pub fn camera(&self) -> RwLockReadGuard<'_, Camera> {
        read(&self.camera)
    }

    /// Edit the scene. Waits for any running pass to finish.
    pub fn update_scene<R>(&self, edit: impl FnOnce(&mut Scene) -> R) -> R {
        edit(&mut write(&self.scene))
    }

    /// Edit the camera. Waits for any running pass to finish.
    pub fn update_camera<R>(&self, edit: impl FnOnce(&mut Camera) -> R) -> R {
        edit(&mut write(&self.camera))
    }

    /// Handle to the camera's pixel buffer, readable during a pass.
    pub fn pixels(&self) -> Arc<PixelBuffer> {
        self.camera().shared_pixels()
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("status", &self.status())
            .field("cancel_requested", &self.cancel_requested())
            .finish_non_exhaustive()
    }
}

/// A pass running on a background thread.
pub struct RenderHandle {
    renderer: Arc<Renderer>,
    thread: JoinHandle<RenderResult<FrameStats>>,
}

impl RenderHandle {
    /// Request cancellation. Does not wait.
    pub fn cancel(&self) {
        self.renderer.request_cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the pass to return.
    pub fn join(self) -> RenderResult<FrameStats> {
        self.thread
            .join()
            .map_err(|_| RenderError::RenderThreadPanicked)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marcher_core::{LightingOptions, Primitive};
    use marcher_math::{Color, Vec3};

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn sphere_scene() -> Scene {
        Scene::new(
            vec![Primitive::sphere(Vec3::ZERO, 1.0, Color::WHITE)],
            vec![Primitive::light(
                Vec3::new(-10.0, -10.0, -10.0),
                1.0,
                Color::WHITE,
            )],
        )
    }

    fn camera(size: u32) -> Camera {
        Camera::new(Vec3::new(-5.0, 0.0, 0.0), size, size, 40.0).looking_at(Vec3::ZERO)
    }

    #[test]
    fn test_render_frame_completes() {
        init_logs();
        let renderer = Renderer::new(sphere_scene(), camera(64));
        assert_eq!(renderer.status(), RenderStatus::Idle);

        let stats = renderer.render_frame(4).expect("render");
        assert_eq!(stats.outcome, RenderOutcome::Completed);
        assert_eq!(stats.pixels_rendered, 64 * 64);
        assert_eq!(renderer.status(), RenderStatus::Completed);
        assert!(renderer.is_done());
        assert_eq!(renderer.progress(), (4096, 4096));

        let pixels = renderer.pixels();
        let background = LightingOptions::default().background_color;
        assert_ne!(pixels.get(32, 32), background, "center pixel is the sphere");
        assert_eq!(pixels.get(0, 0), background, "corner pixel is background");
        assert_eq!(pixels.written_count(), 64 * 64);
    }

    #[test]
    fn test_worker_count_does_not_change_image() {
        let scene = sphere_scene();
        let single = Renderer::new(scene.clone(), camera(24));
        let many = Renderer::new(scene, camera(24));

        single.render_frame(1).expect("single worker");
        many.render_frame(5).expect("five workers");

        assert_eq!(single.pixels().snapshot(), many.pixels().snapshot());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let renderer = Renderer::new(sphere_scene(), camera(4));
        assert!(matches!(
            renderer.render_frame(0),
            Err(RenderError::InvalidWorkerCount(0))
        ));
    }

    #[test]
    fn test_cancel_before_launch() {
        let renderer = Renderer::new(sphere_scene(), camera(32));
        renderer.request_cancel();

        let stats = renderer.render_frame(4).expect("render");
        assert_eq!(stats.outcome, RenderOutcome::Cancelled);
        assert!(stats.pixels_rendered < stats.total_pixels);
        assert!(renderer.pixels().written_count() < 32 * 32);
        assert_eq!(renderer.status(), RenderStatus::Cancelled);
        assert!(!renderer.cancel_requested(), "request cleared after the pass");

        // Next pass runs normally.
        let stats = renderer.render_frame(4).expect("render");
        assert!(stats.is_complete());
    }

    #[test]
    fn test_cancellable_handle() {
        let renderer = Arc::new(Renderer::new(sphere_scene(), camera(16)));
        let handle = renderer.render_frame_cancellable(2).expect("spawn");
        let stats = handle.join().expect("join");
        assert!(stats.is_complete());
        assert!(renderer.is_done());

        renderer.request_cancel();
        let handle = renderer.render_frame_cancellable(2).expect("spawn");
        let stats = handle.join().expect("join");
        assert_eq!(stats.outcome, RenderOutcome::Cancelled);
    }

    #[test]
    fn test_update_camera_between_passes() {
        let renderer = Renderer::new(sphere_scene(), camera(16));
        renderer.render_frame(2).expect("render");

        renderer.update_camera(|camera| {
            camera.move_backward(100.0);
            camera.reset();
        });
        assert_eq!(renderer.pixels().written_count(), 0);
        assert_eq!(renderer.camera().position(), Vec3::new(-105.0, 0.0, 0.0));

        renderer.update_scene(|scene| {
            scene.add_drawables([Primitive::cube(Vec3::new(0.0, 3.0, 0.0), 0.5, Color::WHITE)]);
        });
        assert_eq!(renderer.scene().drawables().len(), 2);
    }

    #[test]
    fn test_render_sequence_writes_frames() {
        let dir = std::env::temp_dir().join(format!("marcher-seq-{}", std::process::id()));
        let renderer = Renderer::new(sphere_scene(), camera(8));
        let poses = crate::animation::orbit_poses(5.0, 90.0, 45.0);
        assert_eq!(poses.len(), 2);

        let mut reported = Vec::new();
        let written = renderer
            .render_sequence(&poses, 2, &dir, |stats, path| {
                assert!(stats.is_complete());
                reported.push(path.to_path_buf());
            })
            .expect("sequence");
        assert_eq!(written.len(), 2);
        assert_eq!(reported, written);
        assert!(written[0].ends_with("render000.png"));
        assert!(written[1].ends_with("render001.png"));
        assert!(written.iter().all(|p| p.exists()));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
