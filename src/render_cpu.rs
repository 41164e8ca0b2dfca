use crate::{
    assets::{PreparedAsset, PreparedAssetStore},
    compile::{DrawOp, DrawPlan},
    core::{Affine, BezPath},
    error::{HanoivizError, HanoivizResult},
};

#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, Default)]
pub struct RenderSettings {
    /// Opaque background painted before any ops; `None` leaves the frame
    /// transparent.
    pub clear_rgba: Option<[u8; 4]>,
}

/// CPU rasterizer powered by `vello_cpu`. The render context is reused
/// between frames of the same size.
pub struct CpuRenderer {
    settings: RenderSettings,
    ctx: Option<vello_cpu::RenderContext>,
}

impl CpuRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            ctx: None,
        }
    }

    pub fn render_plan(
        &mut self,
        plan: &DrawPlan,
        assets: &PreparedAssetStore,
    ) -> HanoivizResult<FrameRGBA> {
        let width: u16 = plan
            .canvas
            .width
            .try_into()
            .map_err(|_| HanoivizError::evaluation("canvas width exceeds u16"))?;
        let height: u16 = plan
            .canvas
            .height
            .try_into()
            .map_err(|_| HanoivizError::evaluation("canvas height exceeds u16"))?;

        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();

        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        if let Some([r, g, b, a]) = self.settings.clear_rgba {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(plan.canvas.width),
                f64::from(plan.canvas.height),
            ));
        }

        for op in &plan.ops {
            draw_op(&mut ctx, op, assets)?;
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        ctx.render_to_pixmap(&mut pixmap);

        let out = FrameRGBA {
            width: plan.canvas.width,
            height: plan.canvas.height,
            data: pixmap.data_as_u8_slice().to_vec(),
        };
        self.ctx = Some(ctx);
        Ok(out)
    }
}

fn draw_op(
    ctx: &mut vello_cpu::RenderContext,
    op: &DrawOp,
    assets: &PreparedAssetStore,
) -> HanoivizResult<()> {
    match op {
        DrawOp::Fill {
            asset,
            transform,
            color,
            opacity,
        } => {
            let PreparedAsset::Shape(shape) = assets.get(*asset)? else {
                return Err(HanoivizError::evaluation(
                    "Fill op references a non-shape asset",
                ));
            };
            ctx.set_transform(affine_to_cpu(*transform));
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                color.r, color.g, color.b, color.a,
            ));
            let path = bezpath_to_cpu(&shape.path);
            if *opacity < 1.0 {
                ctx.push_opacity_layer(*opacity);
                ctx.fill_path(&path);
                ctx.pop_layer();
            } else {
                ctx.fill_path(&path);
            }
            Ok(())
        }
        DrawOp::Glyphs {
            asset,
            origin,
            scale,
            opacity,
        } => {
            let PreparedAsset::Text(text) = assets.get(*asset)? else {
                return Err(HanoivizError::evaluation(
                    "Glyphs op references a non-text asset",
                ));
            };
            let tr = Affine::translate(origin.to_vec2()) * Affine::scale(*scale);
            ctx.set_transform(affine_to_cpu(tr));
            if *opacity < 1.0 {
                ctx.push_opacity_layer(*opacity);
            }
            for line in text.layout.lines() {
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };
                    let brush = run.style().brush;
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                        brush.r, brush.g, brush.b, brush.a,
                    ));
                    let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    ctx.glyph_run(&text.font)
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
            if *opacity < 1.0 {
                ctx.pop_layer();
            }
            Ok(())
        }
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
