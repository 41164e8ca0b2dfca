use rayon::prelude::*;

use crate::{
    assets::PreparedAssetStore,
    compile::compile_frame,
    core::{FrameIndex, FrameRange},
    encode_ffmpeg::{EncodeConfig, FfmpegEncoder, is_ffmpeg_on_path},
    error::{HanoivizError, HanoivizResult},
    eval::Evaluator,
    model::Composition,
    render_cpu::{CpuRenderer, FrameRGBA, RenderSettings},
};

/// Evaluate + compile + rasterize a single frame.
///
/// Pipeline:
/// 1. [`Evaluator::eval_frame`]
/// 2. [`compile_frame`]
/// 3. [`CpuRenderer::render_plan`]
///
/// Returns a [`FrameRGBA`] containing **premultiplied** RGBA8 pixels.
pub fn render_frame(
    comp: &Composition,
    frame: FrameIndex,
    renderer: &mut CpuRenderer,
    assets: &PreparedAssetStore,
) -> HanoivizResult<FrameRGBA> {
    let eval = Evaluator::eval_frame(comp, frame)?;
    let plan = compile_frame(comp, &eval, assets)?;
    renderer.render_plan(&plan, assets)
}

/// Render a range of frames (inclusive start, exclusive end).
pub fn render_frames(
    comp: &Composition,
    range: FrameRange,
    renderer: &mut CpuRenderer,
    assets: &PreparedAssetStore,
) -> HanoivizResult<Vec<FrameRGBA>> {
    if range.is_empty() {
        return Err(HanoivizError::validation("render range must be non-empty"));
    }
    let mut out = Vec::with_capacity(range.len_frames() as usize);
    for f in range.start.0..range.end.0 {
        out.push(render_frame(comp, FrameIndex(f), renderer, assets)?);
    }
    Ok(out)
}

#[derive(Clone, Debug)]
pub struct RenderThreading {
    pub parallel: bool,
    pub chunk_size: usize,
    pub threads: Option<usize>,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
        }
    }
}

/// Options for [`render_to_mp4`].
///
/// `bg_rgba` is used when flattening alpha for the encoder.
#[derive(Clone, Debug)]
pub struct RenderToMp4Opts {
    /// Frame range to render (start inclusive, end exclusive).
    pub range: FrameRange,
    /// Background color to flatten alpha over (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
    /// Whether to overwrite the output file if it already exists.
    pub overwrite: bool,
    /// Render threading/chunking configuration.
    pub threading: RenderThreading,
}

/// Render a composition to an MP4 by invoking the system `ffmpeg` binary.
///
/// `ffmpeg` must be installed and on `PATH`; this is checked up front.
/// Integer FPS (`comp.fps.den == 1`) is required for MP4 output.
#[tracing::instrument(skip_all, fields(frames = opts.range.len_frames()))]
pub fn render_to_mp4(
    comp: &Composition,
    out_path: impl Into<std::path::PathBuf>,
    opts: RenderToMp4Opts,
    settings: &RenderSettings,
    assets: &PreparedAssetStore,
) -> HanoivizResult<()> {
    if opts.range.end.0 > comp.duration.0 {
        return Err(HanoivizError::validation(
            "render_to_mp4 range must be within composition duration",
        ));
    }
    if opts.range.is_empty() {
        return Err(HanoivizError::validation(
            "render_to_mp4 range must be non-empty",
        ));
    }

    let fps = if comp.fps.den == 1 {
        comp.fps.num
    } else {
        return Err(HanoivizError::validation(
            "render_to_mp4 requires integer fps (fps.den == 1)",
        ));
    };

    if !is_ffmpeg_on_path() {
        return Err(HanoivizError::encode(
            "ffmpeg is required for MP4 rendering, but was not found on PATH",
        ));
    }

    let cfg = EncodeConfig {
        width: comp.canvas.width,
        height: comp.canvas.height,
        fps,
        out_path: out_path.into(),
        overwrite: opts.overwrite,
    };
    let mut enc = FfmpegEncoder::new(cfg, opts.bg_rgba)?;

    let chunk_size = opts.threading.chunk_size.max(1) as u64;
    let mut renderer = CpuRenderer::new(settings.clone());
    let pool = if opts.threading.parallel {
        Some(build_thread_pool(opts.threading.threads)?)
    } else {
        None
    };

    let mut chunk_start = opts.range.start.0;
    while chunk_start < opts.range.end.0 {
        let chunk_end = (chunk_start + chunk_size).min(opts.range.end.0);
        let chunk = FrameRange::new(FrameIndex(chunk_start), FrameIndex(chunk_end))
            .map_err(|e| HanoivizError::evaluation(format!("invalid chunk range: {e}")))?;

        let frames = match &pool {
            Some(pool) => render_chunk_parallel(comp, chunk, settings, assets, pool)?,
            None => render_frames(comp, chunk, &mut renderer, assets)?,
        };

        for frame in &frames {
            enc.encode_frame(frame)?;
        }
        tracing::debug!(
            start = chunk_start,
            end = chunk_end,
            "encoded frame chunk"
        );
        chunk_start = chunk_end;
    }

    enc.finish()
}

fn render_chunk_parallel(
    comp: &Composition,
    range: FrameRange,
    settings: &RenderSettings,
    assets: &PreparedAssetStore,
    pool: &rayon::ThreadPool,
) -> HanoivizResult<Vec<FrameRGBA>> {
    let frames: Vec<u64> = (range.start.0..range.end.0).collect();
    let rendered = pool.install(|| {
        frames
            .par_iter()
            .map_init(
                || CpuRenderer::new(settings.clone()),
                |worker, f| -> HanoivizResult<FrameRGBA> {
                    render_frame(comp, FrameIndex(*f), worker, assets)
                },
            )
            .collect::<Vec<_>>()
    });

    rendered.into_iter().collect()
}

fn build_thread_pool(threads: Option<usize>) -> HanoivizResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(HanoivizError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| HanoivizError::evaluation(format!("failed to build rayon thread pool: {e}")))
}
