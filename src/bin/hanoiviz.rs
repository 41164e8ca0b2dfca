use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use hanoiviz::{
    Canvas, Fps, FrameIndex, FrameRange, PreparedAssetStore, RenderSettings, RenderThreading,
    RenderToMp4Opts, Storyboard, palette,
};

#[derive(Parser, Debug)]
#[command(name = "hanoiviz", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the full animation to an MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Write the built composition as JSON.
    Dump(DumpArgs),
}

#[derive(clap::Args, Debug)]
struct SceneArgs {
    /// Number of blocks on the source peg (1..=6).
    #[arg(long, default_value_t = 5)]
    blocks: u32,

    /// Output frame rate.
    #[arg(long, default_value_t = 12)]
    fps: u32,

    /// Canvas width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Font file for labels and the title, relative to the assets root.
    #[arg(long, default_value = "assets/DejaVuSans.ttf")]
    font: String,

    /// Directory asset paths are resolved against.
    #[arg(long, default_value = ".")]
    assets_root: PathBuf,
}

impl SceneArgs {
    fn storyboard(&self) -> anyhow::Result<Storyboard> {
        Ok(Storyboard {
            blocks: self.blocks,
            fps: Fps::new(self.fps, 1)?,
            canvas: Canvas {
                width: self.width,
                height: self.height,
            },
            font_source: self.font.clone(),
        })
    }
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Enable frame-level parallelism.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Render chunk size in frames.
    #[arg(long, default_value_t = 64)]
    chunk_size: usize,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct DumpArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Output JSON path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Dump(args) => cmd_dump(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let comp = args.scene.storyboard()?.build()?;
    let assets = PreparedAssetStore::prepare(&comp, &args.scene.assets_root)?;

    let settings = RenderSettings {
        clear_rgba: Some(palette::BACKGROUND),
    };
    let opts = RenderToMp4Opts {
        range: FrameRange::new(FrameIndex(0), comp.duration)?,
        bg_rgba: palette::BACKGROUND,
        overwrite: true,
        threading: RenderThreading {
            parallel: args.parallel,
            chunk_size: args.chunk_size,
            threads: args.threads,
        },
    };

    hanoiviz::render_to_mp4(&comp, &args.out, opts, &settings, &assets)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let comp = args.scene.storyboard()?.build()?;
    let assets = PreparedAssetStore::prepare(&comp, &args.scene.assets_root)?;

    let settings = RenderSettings {
        clear_rgba: Some(palette::BACKGROUND),
    };
    let mut renderer = hanoiviz::CpuRenderer::new(settings);
    let frame = hanoiviz::render_frame(&comp, FrameIndex(args.frame), &mut renderer, &assets)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_dump(args: DumpArgs) -> anyhow::Result<()> {
    let comp = args.scene.storyboard()?.build()?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let f = std::fs::File::create(&args.out)
        .with_context(|| format!("create '{}'", args.out.display()))?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(f), &comp)
        .context("serialize composition JSON")?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
