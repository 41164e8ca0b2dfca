use crate::{
    anim::SampleCtx,
    core::{Affine, FrameIndex, Point, Rgba8},
    error::{HanoivizError, HanoivizResult},
    model::{Asset, CameraPose, Clip, Composition, FadeSpec},
};

#[derive(Clone, Debug, serde::Serialize)]
pub struct EvaluatedGraph {
    pub frame: FrameIndex,
    pub camera: CameraPose,
    pub nodes: Vec<EvaluatedNode>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct EvaluatedNode {
    pub clip_id: String,
    pub asset: String,
    pub z: i32,
    pub opacity: f64,
    pub paint: NodePaint,
}

/// Resolved per-node draw parameters. Shapes carry a full world transform;
/// text carries a projected anchor plus a screen-space scale so glyphs are
/// never run through the view's y flip.
#[derive(Clone, Debug, serde::Serialize)]
pub enum NodePaint {
    Shape { transform: Affine, fill: Rgba8 },
    Text { anchor: Point, scale: f64 },
}

pub struct Evaluator;

impl Evaluator {
    #[tracing::instrument(skip(comp))]
    pub fn eval_frame(comp: &Composition, frame: FrameIndex) -> HanoivizResult<EvaluatedGraph> {
        comp.validate()?;
        if frame.0 >= comp.duration.0 {
            return Err(HanoivizError::evaluation("frame is out of bounds"));
        }

        let camera_ctx = SampleCtx {
            frame,
            fps: comp.fps,
            clip_local: frame,
        };
        let camera = comp.camera.pose.sample(camera_ctx)?;
        let view = camera.view_transform(comp.canvas);

        let mut nodes_with_key: Vec<((i32, usize, u64, String), EvaluatedNode)> = Vec::new();

        for (track_index, track) in comp.tracks.iter().enumerate() {
            for clip in &track.clips {
                if !clip.range.contains(frame) {
                    continue;
                }

                let Some(node) = eval_clip(comp, clip, frame, track.z_base, camera, view)? else {
                    continue;
                };
                let sort_key = (
                    node.z,
                    track_index,
                    clip.range.start.0,
                    node.clip_id.clone(),
                );
                nodes_with_key.push((sort_key, node));
            }
        }

        nodes_with_key.sort_by(|a, b| a.0.cmp(&b.0));
        let nodes = nodes_with_key.into_iter().map(|(_, n)| n).collect();

        Ok(EvaluatedGraph {
            frame,
            camera,
            nodes,
        })
    }
}

fn eval_clip(
    comp: &Composition,
    clip: &Clip,
    frame: FrameIndex,
    track_z_base: i32,
    camera: CameraPose,
    view: Affine,
) -> HanoivizResult<Option<EvaluatedNode>> {
    let clip_local = FrameIndex(frame.0 - clip.range.start.0);
    let ctx = SampleCtx {
        frame,
        fps: comp.fps,
        clip_local,
    };

    let mut opacity = clip.props.opacity.sample(ctx)?.clamp(0.0, 1.0);
    if let Some(fade) = &clip.fade_in {
        opacity *= fade_progress(fade, frame, clip, FadeEdge::In);
    }
    if let Some(fade) = &clip.fade_out {
        opacity *= 1.0 - fade_progress(fade, frame, clip, FadeEdge::Out);
    }
    if opacity <= 0.0 {
        return Ok(None);
    }

    let transform = clip.props.transform.sample(ctx)?;

    let Some(asset) = comp.assets.get(&clip.asset) else {
        return Err(HanoivizError::evaluation(format!(
            "clip '{}' references missing asset key '{}'",
            clip.id, clip.asset
        )));
    };

    let paint = match asset {
        Asset::Shape(_) => NodePaint::Shape {
            transform: view * transform.to_affine(),
            fill: clip.props.fill.sample(ctx)?,
        },
        Asset::Text(_) => NodePaint::Text {
            anchor: view * transform.to_affine() * Point::ORIGIN,
            scale: transform.scale.x * camera.zoom,
        },
    };

    Ok(Some(EvaluatedNode {
        clip_id: clip.id.clone(),
        asset: clip.asset.clone(),
        z: track_z_base + clip.z_offset,
        opacity,
        paint,
    }))
}

#[derive(Clone, Copy, Debug)]
enum FadeEdge {
    In,
    Out,
}

/// Eased progress of a fade window at `frame`, or the window's resting value
/// when the frame lies outside it (1.0 for in-fades already finished, 0.0 for
/// out-fades not yet started).
fn fade_progress(spec: &FadeSpec, frame: FrameIndex, clip: &Clip, edge: FadeEdge) -> f64 {
    let clip_len = clip.range.len_frames();
    if clip_len == 0 || spec.duration_frames == 0 {
        return match edge {
            FadeEdge::In => 1.0,
            FadeEdge::Out => 0.0,
        };
    }
    let dur = spec.duration_frames.min(clip_len);

    let (window_start, window_end_excl) = match edge {
        FadeEdge::In => {
            let start = clip.range.start.0;
            (start, start.saturating_add(dur))
        }
        FadeEdge::Out => {
            let end = clip.range.end.0;
            (end.saturating_sub(dur), end)
        }
    };

    if frame.0 < window_start {
        return 0.0;
    }
    if frame.0 >= window_end_excl {
        return match edge {
            FadeEdge::In => 1.0,
            FadeEdge::Out => 1.0, // fully faded out past the window (clip ends there anyway)
        };
    }

    let denom = dur.saturating_sub(1);
    let t = if denom == 0 {
        1.0
    } else {
        ((frame.0 - window_start) as f64) / (denom as f64)
    };
    spec.ease.apply(t).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::{
        anim::Anim,
        core::{Canvas, Fps, FrameRange, Transform2D, Vec2},
        ease::Ease,
        model::{Camera, ClipProps, Shape, ShapeAsset, Track},
        palette,
    };

    fn basic_comp(
        opacity: Anim<f64>,
        fade_in: Option<FadeSpec>,
        fade_out: Option<FadeSpec>,
    ) -> Composition {
        let mut assets = BTreeMap::new();
        assets.insert(
            "sq".to_string(),
            Asset::Shape(ShapeAsset {
                shape: Shape::Rect { w: 1.0, h: 1.0 },
            }),
        );
        Composition {
            fps: Fps::new(12, 1).unwrap(),
            canvas: Canvas {
                width: 640,
                height: 360,
            },
            camera: Camera::fixed(CameraPose::default()),
            duration: FrameIndex(20),
            assets,
            tracks: vec![Track {
                name: "main".to_string(),
                z_base: 0,
                clips: vec![Clip {
                    id: "c0".to_string(),
                    asset: "sq".to_string(),
                    range: FrameRange::new(FrameIndex(5), FrameIndex(15)).unwrap(),
                    props: ClipProps {
                        transform: Anim::constant(Transform2D::at(Vec2::new(1.0, 2.0))),
                        opacity,
                        fill: Anim::constant(palette::BLUE),
                    },
                    z_offset: 0,
                    fade_in,
                    fade_out,
                }],
            }],
        }
    }

    #[test]
    fn visibility_respects_frame_range() {
        let comp = basic_comp(Anim::constant(1.0), None, None);
        for (frame, expect) in [(4u64, 0usize), (5, 1), (14, 1), (15, 0)] {
            let g = Evaluator::eval_frame(&comp, FrameIndex(frame)).unwrap();
            assert_eq!(g.nodes.len(), expect, "frame {frame}");
        }
    }

    #[test]
    fn opacity_is_clamped() {
        let comp = basic_comp(Anim::constant(2.0), None, None);
        let g = Evaluator::eval_frame(&comp, FrameIndex(5)).unwrap();
        assert_eq!(g.nodes[0].opacity, 1.0);
    }

    #[test]
    fn zero_opacity_nodes_are_culled() {
        let comp = basic_comp(Anim::constant(0.0), None, None);
        let g = Evaluator::eval_frame(&comp, FrameIndex(5)).unwrap();
        assert!(g.nodes.is_empty());
    }

    #[test]
    fn fade_windows_hit_their_boundaries() {
        let fade = FadeSpec::new(3, Ease::Linear);
        let comp = basic_comp(Anim::constant(1.0), Some(fade.clone()), Some(fade));

        // In-fade starts at zero opacity (culled), reaches 1.0 on its last
        // window frame (dur=3 => denom=2).
        let g0 = Evaluator::eval_frame(&comp, FrameIndex(5)).unwrap();
        assert!(g0.nodes.is_empty());
        let g_mid = Evaluator::eval_frame(&comp, FrameIndex(6)).unwrap();
        assert!((g_mid.nodes[0].opacity - 0.5).abs() < 1e-9);
        let g_last_in = Evaluator::eval_frame(&comp, FrameIndex(7)).unwrap();
        assert_eq!(g_last_in.nodes[0].opacity, 1.0);

        // Out-fade starts at end-dur and fully fades by the last clip frame.
        let g_out0 = Evaluator::eval_frame(&comp, FrameIndex(12)).unwrap();
        assert_eq!(g_out0.nodes[0].opacity, 1.0);
        let g_out_last = Evaluator::eval_frame(&comp, FrameIndex(14)).unwrap();
        assert!(g_out_last.nodes.is_empty());
    }

    #[test]
    fn shape_transform_projects_through_the_camera() {
        let comp = basic_comp(Anim::constant(1.0), None, None);
        let g = Evaluator::eval_frame(&comp, FrameIndex(5)).unwrap();
        let NodePaint::Shape { transform, .. } = &g.nodes[0].paint else {
            panic!("expected shape paint");
        };
        // ppu = 360/8 = 45: world (1, 2) lands 45 px right and 90 px up of
        // canvas center.
        let p = *transform * Point::ORIGIN;
        assert!((p.x - (320.0 + 45.0)).abs() < 1e-9);
        assert!((p.y - (180.0 - 90.0)).abs() < 1e-9);
    }

    #[test]
    fn nodes_sort_by_z_then_track_order() {
        let mut comp = basic_comp(Anim::constant(1.0), None, None);
        let mut above = comp.tracks[0].clone();
        above.name = "above".to_string();
        above.z_base = 10;
        above.clips[0].id = "c1".to_string();
        comp.tracks.insert(0, above);

        let g = Evaluator::eval_frame(&comp, FrameIndex(5)).unwrap();
        assert_eq!(g.nodes.len(), 2);
        assert_eq!(g.nodes[0].clip_id, "c0");
        assert_eq!(g.nodes[1].clip_id, "c1");
    }
}
