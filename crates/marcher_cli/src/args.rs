//! Command-line parser.

use std::path::PathBuf;

/// Render signed distance field scenes by sphere tracing.
#[derive(Debug, clap::Parser)]
#[command(name = "marcher", version, about)]
pub(crate) struct MarcherArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Number of concurrent render workers.
    #[arg(short = 't', long = "threads", global = true, default_value_t = default_workers())]
    pub workers: usize,

    /// Image size as WxH, or a single number for a square image.
    #[arg(
        short = 'd',
        long = "dimensions",
        global = true,
        value_name = "WxH",
        default_value = "1920x1080",
        value_parser = parse_dimensions
    )]
    pub dimensions: (u32, u32),

    /// Vertical field of view in degrees.
    #[arg(long, global = true, default_value_t = 20.0)]
    pub fov: f64,

    /// Directory the numbered PNG frames are written to.
    #[arg(short = 'o', long = "output", global = true, default_value = "./rend_out_0")]
    pub out_dir: PathBuf,

    /// JSON scene description. A built-in Mandelbulb scene is used otherwise.
    #[arg(long, global = true, value_name = "FILE")]
    pub scene: Option<PathBuf>,

    /// Log per-pass statistics.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, clap::Subcommand)]
pub(crate) enum Command {
    /// Render a single frame.
    Image,

    /// Render an orbit around the origin, one PNG per step.
    Movie {
        /// Orbit radius.
        #[arg(long, default_value_t = 5.0)]
        radius: f64,

        /// Total sweep in degrees.
        #[arg(long, default_value_t = 360.0)]
        degrees: f64,

        /// Degrees between frames.
        #[arg(long, default_value_t = 0.5)]
        step: f64,
    },
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

/// Parse `WxH`, or `N` meaning `NxN`.
pub(crate) fn parse_dimensions(input: &str) -> Result<(u32, u32), String> {
    let parse = |s: &str| {
        s.trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("{s:?} is not a positive integer"))
    };

    let mut parts = input.split(['x', 'X', '×']);
    let width = parse(parts.next().unwrap_or_default())?;
    let height = match parts.next() {
        Some(h) => parse(h)?,
        None => width,
    };
    if parts.next().is_some() {
        return Err(format!("{input:?} has more than two dimensions"));
    }
    Ok((width, height))
}
