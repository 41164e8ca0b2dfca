use std::collections::BTreeMap;

use hanoiviz::{
    Anim, Asset, Camera, CameraPose, Canvas, Clip, ClipProps, Composition, CpuRenderer, FadeSpec,
    Fps, FrameIndex, FrameRange, PreparedAssetStore, RenderSettings, Shape, ShapeAsset, Track,
    Transform2D, palette, render_frame, render_frames,
};

fn square_comp() -> Composition {
    let mut assets = BTreeMap::new();
    assets.insert(
        "sq".to_string(),
        Asset::Shape(ShapeAsset {
            shape: Shape::Rect { w: 2.0, h: 2.0 },
        }),
    );
    Composition {
        fps: Fps::new(12, 1).unwrap(),
        canvas: Canvas {
            width: 64,
            height: 64,
        },
        camera: Camera::fixed(CameraPose::default()),
        duration: FrameIndex(4),
        assets,
        tracks: vec![Track {
            name: "main".to_string(),
            z_base: 0,
            clips: vec![Clip {
                id: "c0".to_string(),
                asset: "sq".to_string(),
                range: FrameRange::new(FrameIndex(0), FrameIndex(4)).unwrap(),
                props: ClipProps {
                    transform: Anim::constant(Transform2D::default()),
                    opacity: Anim::constant(1.0),
                    fill: Anim::constant(palette::GREEN),
                },
                z_offset: 0,
                fade_in: None,
                fade_out: None,
            }],
        }],
    }
}

fn pixel(frame: &hanoiviz::FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [
        frame.data[i],
        frame.data[i + 1],
        frame.data[i + 2],
        frame.data[i + 3],
    ]
}

#[test]
fn square_covers_the_canvas_center() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let comp = square_comp();
    let assets = PreparedAssetStore::prepare(&comp, ".").unwrap();
    let mut renderer = CpuRenderer::new(RenderSettings {
        clear_rgba: Some([0, 0, 0, 255]),
    });

    let frame = render_frame(&comp, FrameIndex(0), &mut renderer, &assets).unwrap();
    assert_eq!(frame.data.len(), 64 * 64 * 4);

    // 8 px per unit at zoom 1 on a 64 px canvas: the 2x2-unit square spans
    // 16 px around the center.
    let center = pixel(&frame, 32, 32);
    assert!(center[1] > 150, "center={center:?}");
    assert_eq!(center[3], 255);

    // Far corner is untouched background.
    let corner = pixel(&frame, 2, 2);
    assert_eq!(corner, [0, 0, 0, 255]);
}

#[test]
fn rendering_is_deterministic_across_renderers() {
    let comp = square_comp();
    let assets = PreparedAssetStore::prepare(&comp, ".").unwrap();
    let settings = RenderSettings {
        clear_rgba: Some([0, 0, 0, 255]),
    };

    let mut a = CpuRenderer::new(settings.clone());
    let mut b = CpuRenderer::new(settings);
    let fa = render_frame(&comp, FrameIndex(1), &mut a, &assets).unwrap();
    let fb = render_frame(&comp, FrameIndex(1), &mut b, &assets).unwrap();
    assert_eq!(fa.data, fb.data);
}

#[test]
fn render_frames_returns_the_full_range() {
    let comp = square_comp();
    let assets = PreparedAssetStore::prepare(&comp, ".").unwrap();
    let mut renderer = CpuRenderer::new(RenderSettings::default());

    let range = FrameRange::new(FrameIndex(0), FrameIndex(4)).unwrap();
    let frames = render_frames(&comp, range, &mut renderer, &assets).unwrap();
    assert_eq!(frames.len(), 4);

    let empty = FrameRange::new(FrameIndex(0), FrameIndex(0)).unwrap();
    assert!(render_frames(&comp, empty, &mut renderer, &assets).is_err());
}

#[test]
fn faded_clip_renders_dimmer_than_opaque() {
    let mut comp = square_comp();
    comp.tracks[0].clips[0].fade_in = Some(FadeSpec::new(4, hanoiviz::Ease::Linear));
    let assets = PreparedAssetStore::prepare(&comp, ".").unwrap();
    let mut renderer = CpuRenderer::new(RenderSettings {
        clear_rgba: Some([0, 0, 0, 255]),
    });

    // Fade-in progress is 1/3 on frame 1 of a 4-frame window.
    let dim = render_frame(&comp, FrameIndex(1), &mut renderer, &assets).unwrap();
    let full = render_frame(&comp, FrameIndex(3), &mut renderer, &assets).unwrap();
    let dim_g = pixel(&dim, 32, 32)[1];
    let full_g = pixel(&full, 32, 32)[1];
    assert!(dim_g < full_g, "dim={dim_g} full={full_g}");
}
