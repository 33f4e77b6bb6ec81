use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use marcher_core::{load_scene, Primitive, Scene};
use marcher_math::{Color, Vec3};
use marcher_renderer::{orbit_poses, Camera, Renderer};

mod args;
mod progress;

use args::{Command, MarcherArgs};
use progress::{init_logging, new_progress_bar};

/// How often the image progress bar samples the pass counters.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Where the default camera sits, looking down +X at the origin.
const DEFAULT_CAMERA_POSITION: Vec3 = Vec3::new(-15.0, 0.0, 0.0);

/// Mandelbulb at the origin lit from several sides by point-like lights.
fn default_scene() -> Scene {
    let light = |x: f64, y: f64, z: f64, r: u8, g: u8, b: u8| {
        Primitive::light(Vec3::new(x, y, z), 0.001, Color::rgb(r, g, b))
    };

    let mut scene = Scene::default();
    scene.add_drawables([Primitive::mandel_bulb(Vec3::ZERO, 8.0, Color::WHITE)]);
    scene.add_lights([
        light(-8.0, -20.0, -8.0, 200, 19, 200),
        light(3.0, -7.0, 8.0, 200, 200, 200),
        light(101.0, -20.0, 10.0, 199, 219, 19),
        light(-8.0, -100.0, -8.0, 70, 80, 90),
        light(220.0, -8.0, -8.0, 100, 200, 200),
        light(10.0, 20.0, 10.0, 199, 219, 19),
    ]);
    scene
}

fn build_scene(path: Option<&Path>) -> Result<Scene> {
    match path {
        Some(path) => load_scene(path)
            .with_context(|| format!("Failed to load scene from {}", path.display())),
        None => Ok(default_scene()),
    }
}

fn render_image(renderer: Renderer, workers: usize, out_dir: &Path) -> Result<()> {
    let renderer = Arc::new(renderer);
    let pixel_count = renderer.camera().pixel_count();
    let bar = new_progress_bar(pixel_count as u64, "image")?;
    let handle = renderer.render_frame_cancellable(workers)?;

    while !handle.is_finished() {
        bar.set_position(renderer.progress().0 as u64);
        std::thread::sleep(PROGRESS_INTERVAL);
    }

    let stats = handle.join()?;
    bar.set_position(stats.pixels_rendered as u64);
    bar.finish_and_clear();
    log::info!(
        "Rendered {} pixels with {} workers in {:.2}s",
        stats.pixels_rendered,
        stats.workers,
        stats.elapsed.as_secs_f64()
    );

    let path = renderer.camera().flush_to_disk(out_dir)?;
    println!("{}", path.display());
    Ok(())
}

fn render_movie(
    renderer: &Renderer,
    workers: usize,
    out_dir: &Path,
    radius: f64,
    degrees: f64,
    step: f64,
) -> Result<()> {
    let poses = orbit_poses(radius, degrees, step);
    anyhow::ensure!(!poses.is_empty(), "Orbit with step {step} over {degrees} degrees has no frames");
    log::info!("Rendering {} frames", poses.len());

    let bar = new_progress_bar(poses.len() as u64, "movie")?;
    let written = renderer
        .render_sequence(&poses, workers, out_dir, |stats, path| {
            bar.set_message(format!(
                "{} in {:.2}s",
                path.file_name().unwrap_or_default().to_string_lossy(),
                stats.elapsed.as_secs_f64()
            ));
            bar.inc(1);
        })
        .context("Movie render failed")?;
    bar.finish_and_clear();
    log::info!("Done rendering {} frames to {}", written.len(), out_dir.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = MarcherArgs::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    init_logging(level)?;

    let (width, height) = args.dimensions;
    log::info!(
        "Rendering {width}x{height}, fov {}, {} workers, output {}",
        args.fov,
        args.workers,
        args.out_dir.display()
    );

    let scene = build_scene(args.scene.as_deref())?;
    let camera = Camera::new(DEFAULT_CAMERA_POSITION, width, height, args.fov);
    let renderer = Renderer::new(scene, camera);

    match args.command {
        Command::Image => render_image(renderer, args.workers, &args.out_dir),
        Command::Movie {
            radius,
            degrees,
            step,
        } => render_movie(&renderer, args.workers, &args.out_dir, radius, degrees, step),
    }
}
