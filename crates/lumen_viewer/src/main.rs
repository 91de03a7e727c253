use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use lumen_core::Scene;
use lumen_renderer::{input, Frame, RenderLoop};

mod config;
mod window;

use config::ViewerConfig;

const USAGE: &str = "usage: lumen_viewer [scene] [--config FILE] [--output FILE.png] [--size WxH]";

/// Command line options.
#[derive(Debug, Clone, PartialEq)]
struct Args {
    scene: PathBuf,
    config: PathBuf,
    output: Option<PathBuf>,
    size: Option<(u32, u32)>,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut scene = None;
        let mut config = PathBuf::from("config.json");
        let mut output = None;
        let mut size = None;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("{} needs a value\n{}", flag, USAGE))
            };
            match arg.as_str() {
                "--config" => config = PathBuf::from(value("--config")?),
                "--output" => output = Some(PathBuf::from(value("--output")?)),
                "--size" => size = Some(parse_size(&value("--size")?)?),
                "-h" | "--help" => bail!(USAGE),
                flag if flag.starts_with("--") => bail!("unknown option {}\n{}", flag, USAGE),
                _ if scene.is_none() => scene = Some(PathBuf::from(&arg)),
                _ => bail!("unexpected argument {}\n{}", arg, USAGE),
            }
        }

        Ok(Self {
            scene: scene.unwrap_or_else(|| PathBuf::from("default_scene.txt")),
            config,
            output,
            size,
        })
    }
}

/// Parse `WIDTHxHEIGHT`.
fn parse_size(text: &str) -> Result<(u32, u32)> {
    let (width, height) = text
        .split_once('x')
        .ok_or_else(|| anyhow!("size must look like 800x600, got {}", text))?;
    let width: u32 = width.trim().parse().with_context(|| format!("bad width in {}", text))?;
    let height: u32 = height.trim().parse().with_context(|| format!("bad height in {}", text))?;
    if width == 0 || height == 0 {
        bail!("size must be non-zero, got {}", text);
    }
    Ok((width, height))
}

/// Render `scene` to completion without a window and save it as a PNG.
fn render_to_file(scene: Scene, config: &ViewerConfig, path: &Path) -> Result<()> {
    // No window: nothing ever sends input, so the cycle refines to the end.
    let (_, rx) = input::channel(config.input.clone());
    let mut render_loop = RenderLoop::new(
        scene,
        config.width,
        config.height,
        config.render.clone(),
        rx,
    );

    let start = Instant::now();
    let mut passes = 0;
    let complete = render_loop.render_progressively(|_| passes += 1)?;
    if !complete {
        bail!("Render stopped before every pixel was computed");
    }
    log::info!(
        "Rendered {}x{} in {} passes, {:.2}s",
        config.width,
        config.height,
        passes,
        start.elapsed().as_secs_f64()
    );

    save_png(&render_loop.renderer().frame(), path)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

fn save_png(frame: &Frame, path: &Path) -> Result<()> {
    let image = image::RgbImage::from_fn(frame.width, frame.height, |x, y| {
        let color = frame.pixels[(y * frame.width + x) as usize];
        image::Rgb([(color >> 16) as u8, (color >> 8) as u8, color as u8])
    });
    image
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse(std::env::args().skip(1))?;
    let mut config = ViewerConfig::load(&args.config);
    if let Some((width, height)) = args.size {
        config.width = width;
        config.height = height;
    }

    log::info!("Starting Lumen Viewer");
    let scene = lumen_core::load_scene(&args.scene)
        .with_context(|| format!("Failed to load scene {}", args.scene.display()))?;

    let result = match &args.output {
        Some(path) => render_to_file(scene, &config, path),
        None => window::run(scene, config),
    };
    if let Err(e) = &result {
        log::error!("{:#}", e);
    }
    result
}
