use crate::{
    assets::{AssetId, PreparedAsset, PreparedAssetStore},
    core::{Affine, Canvas, Point, Rgba8, Vec2},
    error::{HanoivizError, HanoivizResult},
    eval::{EvaluatedGraph, NodePaint},
    model::Composition,
};

/// Flat, z-ordered draw list for one frame. There are no offscreen effect
/// surfaces in this project; every frame is a single scene pass.
#[derive(Clone, Debug)]
pub struct DrawPlan {
    pub canvas: Canvas,
    pub ops: Vec<DrawOp>,
}

#[derive(Clone, Debug)]
pub enum DrawOp {
    Fill {
        asset: AssetId,
        transform: Affine,
        color: Rgba8,
        opacity: f32,
    },
    Glyphs {
        asset: AssetId,
        /// Top-left of the laid-out text block, in pixels.
        origin: Point,
        scale: f64,
        opacity: f32,
    },
}

pub fn compile_frame(
    comp: &Composition,
    eval: &EvaluatedGraph,
    assets: &PreparedAssetStore,
) -> HanoivizResult<DrawPlan> {
    let mut ops = Vec::with_capacity(eval.nodes.len());

    for node in &eval.nodes {
        let id = assets.id_for_key(&node.asset)?;
        let opacity = node.opacity.clamp(0.0, 1.0) as f32;
        if opacity <= 0.0 {
            continue;
        }

        match &node.paint {
            NodePaint::Shape { transform, fill } => {
                ops.push(DrawOp::Fill {
                    asset: id,
                    transform: *transform,
                    color: *fill,
                    opacity,
                });
            }
            NodePaint::Text { anchor, scale } => {
                let PreparedAsset::Text(text) = assets.get(id)? else {
                    return Err(HanoivizError::evaluation(format!(
                        "node '{}' expects a text asset for key '{}'",
                        node.clip_id, node.asset
                    )));
                };
                // Anchor is the text block center; glyphs lay out from the
                // block's top-left.
                let origin = *anchor
                    - Vec2::new(
                        f64::from(text.width) * scale / 2.0,
                        f64::from(text.height) * scale / 2.0,
                    );
                ops.push(DrawOp::Glyphs {
                    asset: id,
                    origin,
                    scale: *scale,
                    opacity,
                });
            }
        }
    }

    Ok(DrawPlan {
        canvas: comp.canvas,
        ops,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::{
        anim::Anim,
        core::{FrameIndex, FrameRange, Fps, Transform2D},
        eval::Evaluator,
        model::{Asset, Camera, CameraPose, Clip, ClipProps, Shape, ShapeAsset, Track},
        palette,
    };

    fn shape_comp() -> Composition {
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
                width: 64,
                height: 64,
            },
            camera: Camera::fixed(CameraPose::default()),
            duration: FrameIndex(10),
            assets,
            tracks: vec![Track {
                name: "main".to_string(),
                z_base: 0,
                clips: vec![Clip {
                    id: "c0".to_string(),
                    asset: "sq".to_string(),
                    range: FrameRange::new(FrameIndex(0), FrameIndex(10)).unwrap(),
                    props: ClipProps {
                        transform: Anim::constant(Transform2D::default()),
                        opacity: Anim::constant(0.5),
                        fill: Anim::constant(palette::GREEN),
                    },
                    z_offset: 0,
                    fade_in: None,
                    fade_out: None,
                }],
            }],
        }
    }

    #[test]
    fn compile_emits_fill_with_sampled_color_and_opacity() {
        let comp = shape_comp();
        let store = PreparedAssetStore::prepare(&comp, ".").unwrap();
        let eval = Evaluator::eval_frame(&comp, FrameIndex(1)).unwrap();
        let plan = compile_frame(&comp, &eval, &store).unwrap();

        assert_eq!(plan.ops.len(), 1);
        match &plan.ops[0] {
            DrawOp::Fill { color, opacity, .. } => {
                assert_eq!(*color, palette::GREEN);
                assert_eq!(*opacity, 0.5);
            }
            _ => panic!("expected Fill"),
        }
    }
}
