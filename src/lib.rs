#![forbid(unsafe_code)]

pub mod anim;
pub mod assets;
pub mod compile;
pub mod core;
pub mod dsl;
pub mod ease;
pub mod encode_ffmpeg;
pub mod error;
pub mod eval;
pub mod hanoi;
pub mod model;
pub mod palette;
pub mod pipeline;
pub mod render_cpu;
pub mod storyboard;

pub use anim::{Anim, InterpMode, Keyframe, Lerp, SampleCtx};
pub use assets::{AssetId, PreparedAsset, PreparedAssetStore};
pub use compile::{DrawOp, DrawPlan, compile_frame};
pub use core::{
    Affine, BezPath, Canvas, Fps, FrameIndex, FrameRange, Point, Rect, Rgba8, Transform2D, Vec2,
};
pub use dsl::{ClipBuilder, CompositionBuilder, TrackBuilder};
pub use ease::Ease;
pub use encode_ffmpeg::{EncodeConfig, FfmpegEncoder, is_ffmpeg_on_path};
pub use error::{HanoivizError, HanoivizResult};
pub use eval::{EvaluatedGraph, EvaluatedNode, Evaluator, NodePaint};
pub use hanoi::{Move, PegState, move_count, solve};
pub use model::{
    Asset, Camera, CameraPose, Clip, ClipProps, Composition, FadeSpec, Shape, ShapeAsset,
    TextAsset, Track,
};
pub use pipeline::{
    RenderThreading, RenderToMp4Opts, render_frame, render_frames, render_to_mp4,
};
pub use render_cpu::{CpuRenderer, FrameRGBA, RenderSettings};
pub use storyboard::Storyboard;
