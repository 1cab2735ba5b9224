use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use noisewall::RenderSink as _;

#[derive(Parser, Debug)]
#[command(name = "noisewall", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single composited frame as a PNG.
    Frame(FrameArgs),
    /// Generate the whole loop and write every frame as a PNG.
    Loop(LoopArgs),
    /// Run the live engine for a while and report what it presented.
    Preview(PreviewArgs),
    /// Print the default configuration as JSON.
    Defaults,
}

#[derive(clap::Args, Debug)]
struct SurfaceArgs {
    /// Configuration JSON; missing keys take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Surface width in pixels.
    #[arg(long, default_value_t = 1080)]
    width: u32,

    /// Surface height in pixels.
    #[arg(long, default_value_t = 1920)]
    height: u32,

    /// Override the configured blend mode (e.g. `screen`, `src-over`).
    #[arg(long)]
    blend: Option<noisewall::BlendMode>,

    /// Seed for reproducible noise.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    surface: SurfaceArgs,

    /// Slot index (0-based) within the loop.
    #[arg(long, default_value_t = 0)]
    slot: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct LoopArgs {
    #[command(flatten)]
    surface: SurfaceArgs,

    /// Directory receiving `frame_XXXX.png` files.
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    surface: SurfaceArgs,

    /// How long to run the scheduler.
    #[arg(long, default_value_t = 2.0)]
    seconds: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Loop(args) => cmd_loop(args),
        Command::Preview(args) => cmd_preview(args),
        Command::Defaults => cmd_defaults(),
    }
}

fn read_config(args: &SurfaceArgs) -> anyhow::Result<noisewall::Configuration> {
    let mut config = match &args.config {
        Some(path) => noisewall::Configuration::from_path(path)
            .with_context(|| format!("load configuration '{}'", path.display()))?,
        None => noisewall::Configuration::default(),
    };
    if let Some(mode) = args.blend {
        config.blend_mode = mode;
    }
    Ok(config)
}

fn surface_extent(args: &SurfaceArgs) -> anyhow::Result<noisewall::Extent> {
    noisewall::Extent::new(args.width, args.height).context("invalid surface size")
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let config = read_config(&args.surface)?;
    let surface = surface_extent(&args.surface)?;

    let hub = Arc::new(noisewall::ProgressHub::new());
    let generator = noisewall::FrameGenerator::new(hub, None, args.surface.seed)?;
    let noise = generator
        .render_slot(&config, surface, args.slot)
        .with_context(|| format!("generate slot {}", args.slot))?;
    let background = noisewall::build_background(&config, surface)?;
    let frame = noisewall::composite(&noise, &background, config.blend_mode);

    ensure_parent(&args.out)?;
    noisewall::write_png(&args.out, &frame)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_loop(args: LoopArgs) -> anyhow::Result<()> {
    let config = read_config(&args.surface)?;
    let surface = surface_extent(&args.surface)?;

    let hub = Arc::new(noisewall::ProgressHub::new());
    let progress = hub.subscribe();
    let mut generator = noisewall::FrameGenerator::new(hub, None, args.surface.seed)?;
    let frames = generator.start(&config, surface)?;

    for event in progress.iter() {
        match event.fraction {
            Some(f) => eprint!("\rgenerating {:>5.1}%", f * 100.0),
            None => break,
        }
    }
    eprintln!();

    let state = generator.wait()?;
    if state != noisewall::JobState::Completed {
        anyhow::bail!("generation stopped early ({state:?})");
    }

    let background = Arc::new(noisewall::build_background(&config, surface)?);
    let mut sink = noisewall::PngSequenceSink::new(&args.out_dir)?;
    for slot in 0..frames.len() {
        let presented =
            noisewall::compose_slot(&frames, slot, &background, config.blend_mode)
                .with_context(|| format!("slot {slot} missing after completed generation"))?;
        sink.present(&presented)?;
    }

    eprintln!("wrote {} frames to {}", sink.written(), sink.dir().display());
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let config = read_config(&args.surface)?;
    let seconds = Duration::try_from_secs_f64(args.seconds)
        .with_context(|| format!("invalid duration {}", args.seconds))?;

    let slots = Arc::new(Mutex::new(Vec::new()));
    let mut engine = noisewall::NoiseEngine::new(
        config,
        SlotRecorder(Arc::clone(&slots)),
        noisewall::EngineOpts {
            seed: args.surface.seed,
            ..noisewall::EngineOpts::default()
        },
    )?;
    engine.surface_changed(args.surface.width, args.surface.height)?;
    std::thread::sleep(seconds);

    let frames = engine.frame_set();
    let state = engine.job_state();
    engine.shutdown();

    let presented = slots
        .lock()
        .map_err(|_| anyhow::anyhow!("slot recorder poisoned"))?
        .clone();
    let mut distinct = presented.clone();
    distinct.sort_unstable();
    distinct.dedup();
    println!(
        "presented {} frames ({} distinct slots), generated {}/{} ({state:?})",
        presented.len(),
        distinct.len(),
        frames.ready_count(),
        frames.len()
    );
    Ok(())
}

/// Records presented slot indices without keeping the pixels.
struct SlotRecorder(Arc<Mutex<Vec<usize>>>);

impl noisewall::RenderSink for SlotRecorder {
    fn present(&mut self, frame: &noisewall::PresentedFrame) -> noisewall::NoiseResult<()> {
        self.0
            .lock()
            .map_err(|_| noisewall::NoiseError::render("slot recorder poisoned"))?
            .push(frame.slot);
        Ok(())
    }
}

fn cmd_defaults() -> anyhow::Result<()> {
    let json = noisewall::Configuration::default().to_json_pretty()?;
    println!("{json}");
    Ok(())
}
