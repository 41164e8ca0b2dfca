use std::collections::BTreeMap;

use kurbo::Shape as _;

use crate::{
    anim::{Anim, Lerp},
    core::{Affine, BezPath, Canvas, Fps, FrameIndex, FrameRange, Rgba8, Transform2D, Vec2},
    ease::Ease,
    error::{HanoivizError, HanoivizResult},
};

/// Vertical extent of the scene coordinate system in scene units at zoom 1.
/// Scene space is y-up with the origin at the canvas center.
pub const SCENE_HEIGHT_UNITS: f64 = 8.0;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Composition {
    pub fps: Fps,
    pub canvas: Canvas,
    pub camera: Camera,
    pub duration: FrameIndex, // total frames
    pub assets: BTreeMap<String, Asset>,
    pub tracks: Vec<Track>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Track {
    pub name: String,
    pub z_base: i32,
    pub clips: Vec<Clip>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Clip {
    pub id: String,
    pub asset: String,     // key into Composition.assets
    pub range: FrameRange, // timeline placement [start,end)
    pub props: ClipProps,
    pub z_offset: i32,
    pub fade_in: Option<FadeSpec>,
    pub fade_out: Option<FadeSpec>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ClipProps {
    pub transform: Anim<Transform2D>,
    pub opacity: Anim<f64>, // 0..1 clamped in eval
    pub fill: Anim<Rgba8>,  // shape assets only; text color lives on the asset
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum Asset {
    Shape(ShapeAsset),
    Text(TextAsset),
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ShapeAsset {
    pub shape: Shape,
}

/// Filled vector shapes, authored in scene units and centered at the local
/// origin.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub enum Shape {
    Rect { w: f64, h: f64 },
    RoundedRect { w: f64, h: f64, radius: f64 },
    Circle { r: f64 },
}

impl Shape {
    pub fn validate(&self) -> HanoivizResult<()> {
        let ok = match *self {
            Self::Rect { w, h } => w > 0.0 && h > 0.0,
            Self::RoundedRect { w, h, radius } => w > 0.0 && h > 0.0 && radius >= 0.0,
            Self::Circle { r } => r > 0.0,
        };
        if !ok {
            return Err(HanoivizError::validation(
                "shape dimensions must be positive",
            ));
        }
        Ok(())
    }

    pub fn to_bez_path(&self) -> HanoivizResult<BezPath> {
        self.validate()?;
        let path = match *self {
            Self::Rect { w, h } => {
                kurbo::Rect::new(-w / 2.0, -h / 2.0, w / 2.0, h / 2.0).to_path(0.1)
            }
            Self::RoundedRect { w, h, radius } => {
                kurbo::RoundedRect::new(-w / 2.0, -h / 2.0, w / 2.0, h / 2.0, radius).to_path(0.1)
            }
            Self::Circle { r } => kurbo::Circle::new((0.0, 0.0), r).to_path(0.1),
        };
        Ok(path)
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TextAsset {
    pub text: String,
    pub font_source: String, // path relative to the assets root
    pub size_px: f32,
    pub color_rgba8: [u8; 4],
}

/// Opacity ramp anchored at a clip edge (in at start, out at end).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct FadeSpec {
    pub duration_frames: u64,
    pub ease: Ease,
}

impl FadeSpec {
    pub fn new(duration_frames: u64, ease: Ease) -> Self {
        Self {
            duration_frames,
            ease,
        }
    }

    pub fn validate(&self) -> HanoivizResult<()> {
        if self.duration_frames == 0 {
            return Err(HanoivizError::validation("fade duration_frames must be > 0"));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CameraPose {
    pub center: Vec2,
    pub zoom: f64,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Lerp for CameraPose {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            center: <Vec2 as Lerp>::lerp(&a.center, &b.center, t),
            zoom: a.zoom + (b.zoom - a.zoom) * t,
        }
    }
}

impl CameraPose {
    /// Pixels per scene unit on the given canvas.
    pub fn pixels_per_unit(&self, canvas: Canvas) -> f64 {
        f64::from(canvas.height) / SCENE_HEIGHT_UNITS * self.zoom
    }

    /// World (scene units, y-up) to screen (pixels, y-down) transform.
    pub fn view_transform(&self, canvas: Canvas) -> Affine {
        let ppu = self.pixels_per_unit(canvas);
        Affine::translate(Vec2::new(
            f64::from(canvas.width) / 2.0,
            f64::from(canvas.height) / 2.0,
        )) * Affine::scale_non_uniform(ppu, -ppu)
            * Affine::translate(-self.center)
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Camera {
    pub pose: Anim<CameraPose>,
}

impl Camera {
    pub fn fixed(pose: CameraPose) -> Self {
        Self {
            pose: Anim::constant(pose),
        }
    }
}

impl Composition {
    pub fn validate(&self) -> HanoivizResult<()> {
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(HanoivizError::validation("fps must have num>0 and den>0"));
        }
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(HanoivizError::validation("canvas width/height must be > 0"));
        }
        if self.duration.0 == 0 {
            return Err(HanoivizError::validation("duration must be > 0 frames"));
        }
        self.camera.pose.validate()?;

        for (key, asset) in &self.assets {
            match asset {
                Asset::Shape(a) => a.shape.validate()?,
                Asset::Text(a) => {
                    if a.text.is_empty() {
                        return Err(HanoivizError::validation(format!(
                            "text asset '{key}' must have non-empty text"
                        )));
                    }
                    if !a.size_px.is_finite() || a.size_px <= 0.0 {
                        return Err(HanoivizError::validation(format!(
                            "text asset '{key}' size_px must be finite and > 0"
                        )));
                    }
                }
            }
        }

        for track in &self.tracks {
            for clip in &track.clips {
                if !self.assets.contains_key(&clip.asset) {
                    return Err(HanoivizError::validation(format!(
                        "clip '{}' references missing asset key '{}'",
                        clip.id, clip.asset
                    )));
                }
                if clip.range.start.0 > clip.range.end.0 {
                    return Err(HanoivizError::validation(format!(
                        "clip '{}' has invalid range (start > end)",
                        clip.id
                    )));
                }
                if clip.range.end.0 > self.duration.0 {
                    return Err(HanoivizError::validation(format!(
                        "clip '{}' range exceeds composition duration",
                        clip.id
                    )));
                }

                clip.props.opacity.validate()?;
                clip.props.transform.validate()?;
                clip.props.fill.validate()?;

                if let Some(fade) = &clip.fade_in {
                    fade.validate()?;
                }
                if let Some(fade) = &clip.fade_out {
                    fade.validate()?;
                }
            }
        }

        Ok(())
    }
}
