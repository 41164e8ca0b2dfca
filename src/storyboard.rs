//! The scripted Tower of Hanoi choreography.
//!
//! `Storyboard::build` lays the whole video out as one composition: base
//! platform and rods, block introductions with orbiting particle trails, the
//! title card, and the solve phase driven by [`crate::hanoi::solve`] in
//! lockstep with a [`crate::hanoi::PegState`].

use std::f64::consts::{PI, TAU};

use crate::{
    anim::{Anim, Keyframe, key},
    core::{Canvas, Fps, FrameIndex, FrameRange, Rgba8, Transform2D, Vec2},
    dsl::{ClipBuilder, CompositionBuilder, TrackBuilder},
    ease::Ease,
    error::{HanoivizError, HanoivizResult},
    hanoi::{self, PegState},
    model::{
        Asset, Camera, CameraPose, Composition, FadeSpec, Shape, ShapeAsset, TextAsset, Track,
    },
    palette,
};

// Scene geometry, in scene units (y-up, origin at canvas center).
const ROD_XS: [f64; 3] = [-3.0, 0.0, 3.0];
const BASE_WIDTH: f64 = 8.0;
const BASE_HEIGHT: f64 = 0.5;
const BASE_CENTER_Y: f64 = -2.3;
const ROD_WIDTH: f64 = 0.2;
const ROD_HEIGHT: f64 = 3.0;
const ROD_CENTER_Y: f64 = -1.5;
/// Resting stacks sit with their bottom on this line.
const FLOOR_Y: f64 = -2.0;
/// Height a block is lifted to before traversing to its target rod.
const LIFT_HEIGHT: f64 = 2.5;
const CAMERA_ZOOM: f64 = 0.7;

const TRAIL_POINTS: u32 = 30;
const TRAIL_DOT_RADIUS: f64 = 0.03;
const TRAIL_ANGLE_FACTOR: f64 = PI / 3.0;

const LABEL_SIZE_PX: f32 = 38.0;
const TITLE_SIZE_PX: f32 = 48.0;
const TITLE_Y: f64 = 3.4;
const TITLE_RULE_Y: f64 = 2.9;

// Phase durations, in seconds.
const BASE_CREATE_SECS: f64 = 1.0;
const BASE_PULSE_SECS: f64 = 1.0;
const BASE_WAIT_SECS: f64 = 1.0;
const ROD_SPIRAL_SECS: f64 = 1.0;
const BLOCK_APPEAR_SECS: f64 = 1.0;
const BLOCK_SPIN_SECS: f64 = 3.5;
const BLOCK_PULSE_SECS: f64 = 1.0;
const BLOCK_RESTORE_SECS: f64 = 1.0;
const BLOCK_WAIT_SECS: f64 = 0.7;
const TITLE_WAIT_SECS: f64 = 1.0;
const TITLE_CREATE_SECS: f64 = 1.0;
const TITLE_SETTLE_SECS: f64 = 1.0;
const MOVE_SECS: f64 = 1.5;
const MOVE_DWELL_SECS: f64 = 0.4;
const FINAL_HOLD_SECS: f64 = 2.0;

/// Per-trail orbit: (radius, start angle, spin seconds, spin direction).
const TRAIL_ORBITS: [(f64, f64, f64, f64); 3] = [
    (1.2, PI / 2.0, 3.5, 1.0),
    (1.1, PI, 2.0, -1.0),
    (1.3, 3.0 * PI / 2.0, 3.0, 1.0),
];
const TRAIL_COLORS: [Rgba8; 3] = [palette::YELLOW, palette::PURE_RED, palette::PURE_GREEN];

#[derive(Clone, Debug)]
pub struct Storyboard {
    /// Number of blocks on the source peg (1..=6).
    pub blocks: u32,
    pub fps: Fps,
    pub canvas: Canvas,
    /// Font file for labels and the title, relative to the assets root.
    pub font_source: String,
}

impl Default for Storyboard {
    fn default() -> Self {
        Self {
            blocks: 5,
            fps: Fps { num: 12, den: 1 },
            canvas: Canvas {
                width: 1280,
                height: 720,
            },
            font_source: "assets/DejaVuSans.ttf".to_string(),
        }
    }
}

impl Storyboard {
    pub fn validate(&self) -> HanoivizResult<()> {
        if self.blocks == 0 || self.blocks as usize > palette::BLOCK_CYCLE.len() {
            return Err(HanoivizError::validation(format!(
                "block count must be 1..={}",
                palette::BLOCK_CYCLE.len()
            )));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(HanoivizError::validation("canvas width/height must be > 0"));
        }
        Ok(())
    }

    pub fn build(&self) -> HanoivizResult<Composition> {
        self.validate()?;

        let n = self.blocks;
        let sched = Schedule::plan(self);
        let end = FrameIndex(sched.end);
        let full = FrameRange::new(FrameIndex(0), end)?;

        let mut builder = CompositionBuilder::new(self.fps, self.canvas, end)
            .camera(Camera::fixed(CameraPose {
                center: Vec2::ZERO,
                zoom: CAMERA_ZOOM,
            }))
            .asset(
                "base",
                Asset::Shape(ShapeAsset {
                    shape: Shape::Rect {
                        w: BASE_WIDTH,
                        h: BASE_HEIGHT,
                    },
                }),
            )?
            .asset(
                "rod",
                Asset::Shape(ShapeAsset {
                    shape: Shape::RoundedRect {
                        w: ROD_WIDTH,
                        h: ROD_HEIGHT,
                        radius: ROD_WIDTH / 2.0,
                    },
                }),
            )?
            .asset(
                "dot",
                Asset::Shape(ShapeAsset {
                    shape: Shape::Circle {
                        r: TRAIL_DOT_RADIUS,
                    },
                }),
            )?
            .asset(
                "title",
                Asset::Text(TextAsset {
                    text: "Tower of Hanoi".to_string(),
                    font_source: self.font_source.clone(),
                    size_px: TITLE_SIZE_PX,
                    color_rgba8: [255, 255, 255, 255],
                }),
            )?
            .asset(
                "title_rule",
                Asset::Shape(ShapeAsset {
                    shape: Shape::Rect { w: 7.0, h: 0.08 },
                }),
            )?;

        for rank in 1..=n {
            builder = builder.asset(
                format!("block{rank}"),
                Asset::Shape(ShapeAsset {
                    shape: Shape::Rect {
                        w: block_size(rank),
                        h: block_size(rank),
                    },
                }),
            )?;
        }
        for i in 0..sched.intros.len() {
            builder = builder.asset(
                format!("label{}", i + 1),
                Asset::Text(TextAsset {
                    text: (i + 1).to_string(),
                    font_source: self.font_source.clone(),
                    size_px: LABEL_SIZE_PX,
                    color_rgba8: [0, 0, 0, 255],
                }),
            )?;
        }

        builder = builder
            .track(self.base_track(&sched, full)?)
            .track(self.rod_track(&sched, full)?)
            .track(self.block_track(&sched, full)?)
            .track(self.label_track(&sched)?)
            .track(self.trail_track(&sched)?)
            .track(self.title_track(&sched, full)?);

        builder.build()
    }

    fn secs(&self, s: f64) -> u64 {
        self.fps.secs_to_frames_round(s)
    }

    fn base_track(&self, sched: &Schedule, full: FrameRange) -> HanoivizResult<Track> {
        let rest = Transform2D::at(Vec2::new(0.0, BASE_CENTER_Y));
        let pulse_up = sched.base_pulse_up;
        let pulse_down = sched.base_pulse_down;
        let settled = sched.base_settled;

        let transform = Anim::linear(vec![
            key(0, rest, Ease::Linear),
            key(pulse_up, rest, Ease::Smooth),
            key(pulse_down, scaled(rest, 1.2), Ease::Smooth),
            key(settled, rest, Ease::Linear),
        ]);
        let fill = Anim::linear(vec![
            key(0, palette::BLUE.with_alpha(128), Ease::Linear),
            key(pulse_up, palette::BLUE.with_alpha(128), Ease::Smooth),
            key(pulse_down, palette::YELLOW.with_alpha(204), Ease::Smooth),
            key(settled, palette::BLUE.with_alpha(179), Ease::Linear),
        ]);

        let clip = ClipBuilder::new("base", "base", full)
            .transform(transform)
            .fill(fill)
            .fade_in(FadeSpec::new(
                self.secs(BASE_CREATE_SECS).max(1),
                Ease::Smooth,
            ))
            .build()?;

        TrackBuilder::new("base").z_base(0).clip(clip).build()
    }

    fn rod_track(&self, sched: &Schedule, full: FrameRange) -> HanoivizResult<Track> {
        let mut track = TrackBuilder::new("rods").z_base(10);
        let range = FrameRange::new(FrameIndex(sched.rods_start), full.end)?;
        let spiral = self.secs(ROD_SPIRAL_SECS).max(1);

        for (i, x) in ROD_XS.iter().enumerate() {
            let rest = Transform2D::at(Vec2::new(*x, ROD_CENTER_Y));
            let spun = Transform2D {
                rotation_rad: -TAU,
                scale: Vec2::new(0.2, 0.2),
                ..rest
            };
            let transform = Anim::linear(vec![
                key(0, spun, Ease::OutCubic),
                key(spiral, rest, Ease::Linear),
            ]);

            track = track.clip(
                ClipBuilder::new(format!("rod{i}"), "rod", range)
                    .transform(transform)
                    .fill(Anim::constant(palette::RED_DARK))
                    .fade_in(FadeSpec::new(spiral, Ease::Smooth))
                    .build()?,
            );
        }

        track.build()
    }

    fn block_track(&self, sched: &Schedule, full: FrameRange) -> HanoivizResult<Track> {
        let n = self.blocks;
        let move_frames = self.secs(MOVE_SECS).max(1);

        // Per-rank keyframe accumulators, indexed by rank-1.
        let mut transform_keys: Vec<Vec<Keyframe<Transform2D>>> = vec![Vec::new(); n as usize];
        let mut fill_keys: Vec<Vec<Keyframe<Rgba8>>> = vec![Vec::new(); n as usize];
        let mut positions: Vec<Vec2> = vec![Vec2::ZERO; n as usize];
        let mut clip_starts: Vec<u64> = vec![0; n as usize];

        // Introductions: stack builds on the source peg, largest first.
        let mut stacked = 0.0;
        for (i, intro) in sched.intros.iter().enumerate() {
            let rank = n - i as u32;
            let size = block_size(rank);
            let pos = Vec2::new(ROD_XS[0], FLOOR_Y + stacked + size / 2.0);
            stacked += size;

            let idx = (rank - 1) as usize;
            positions[idx] = pos;
            clip_starts[idx] = intro.start;

            let rest = Transform2D::at(pos);
            let color = palette::BLOCK_CYCLE[i % palette::BLOCK_CYCLE.len()].with_alpha(230);
            let pulse_color = palette::RED.with_alpha(230);
            let rel = |frame: u64| frame - intro.start;

            transform_keys[idx].extend([
                key(0, rest, Ease::Linear),
                key(rel(intro.spin_start), rest, Ease::Smooth),
                key(rel(intro.pulse_end), scaled(rest, 1.3), Ease::Linear),
                key(rel(intro.restore_start), scaled(rest, 1.3), Ease::Smooth),
                key(rel(intro.restore_end), rest, Ease::Linear),
            ]);
            fill_keys[idx].extend([
                key(0, color, Ease::Linear),
                key(rel(intro.spin_start), color, Ease::Smooth),
                key(rel(intro.pulse_end), pulse_color, Ease::Linear),
                key(rel(intro.restore_start), pulse_color, Ease::Smooth),
                key(rel(intro.restore_end), color, Ease::Linear),
            ]);
        }

        // Solve phase: mirror the move generator against the peg state and
        // bake each lift-over-descend path into per-frame translate keys.
        let mut state = PegState::new(n, 0)?;
        let moves = hanoi::solve(n, 0, 1, 2);

        for (mv, &start) in moves.iter().zip(&sched.move_starts) {
            let target_height: f64 = state.peg(mv.to).iter().map(|&r| block_size(r)).sum();
            let rank = state.apply(*mv)?;
            let idx = (rank - 1) as usize;
            let size = block_size(rank);

            let from = positions[idx];
            let to = Vec2::new(ROD_XS[mv.to], FLOOR_Y + target_height + size / 2.0);
            let corners = [
                from,
                from + Vec2::new(0.0, LIFT_HEIGHT),
                Vec2::new(ROD_XS[mv.to], LIFT_HEIGHT),
                to,
            ];

            let clip_start = clip_starts[idx];
            for f in 0..=move_frames {
                let t = (f as f64) / (move_frames as f64);
                let pos = polyline_point(&corners, Ease::Smooth.apply(t));
                transform_keys[idx].push(key(
                    start - clip_start + f,
                    Transform2D::at(pos),
                    Ease::Linear,
                ));
            }
            positions[idx] = to;
        }

        let mut track = TrackBuilder::new("blocks").z_base(20);
        for rank in 1..=n {
            let idx = (rank - 1) as usize;
            let range = FrameRange::new(FrameIndex(clip_starts[idx]), full.end)?;
            track = track.clip(
                ClipBuilder::new(format!("block{rank}"), format!("block{rank}"), range)
                    .transform(Anim::linear(std::mem::take(&mut transform_keys[idx])))
                    .fill(Anim::linear(std::mem::take(&mut fill_keys[idx])))
                    .fade_in(FadeSpec::new(
                        self.secs(BLOCK_APPEAR_SECS).max(1),
                        Ease::Smooth,
                    ))
                    .build()?,
            );
        }

        track.build()
    }

    fn label_track(&self, sched: &Schedule) -> HanoivizResult<Track> {
        let n = self.blocks;
        let mut track = TrackBuilder::new("labels").z_base(30);

        let mut stacked = 0.0;
        for (i, intro) in sched.intros.iter().enumerate() {
            let rank = n - i as u32;
            let size = block_size(rank);
            let pos = Vec2::new(ROD_XS[0], FLOOR_Y + stacked + size / 2.0);
            stacked += size;

            let range = FrameRange::new(FrameIndex(intro.start), FrameIndex(intro.restore_end))?;
            track = track.clip(
                ClipBuilder::new(format!("label{}", i + 1), format!("label{}", i + 1), range)
                    .transform(Anim::constant(Transform2D::at(pos)))
                    .fade_in(FadeSpec::new(
                        self.secs(BLOCK_APPEAR_SECS).max(1),
                        Ease::Smooth,
                    ))
                    .fade_out(FadeSpec::new(
                        self.secs(BLOCK_RESTORE_SECS).max(1),
                        Ease::Smooth,
                    ))
                    .build()?,
            );
        }

        track.build()
    }

    fn trail_track(&self, sched: &Schedule) -> HanoivizResult<Track> {
        let n = self.blocks;
        let mut track = TrackBuilder::new("trails").z_base(40);

        let mut stacked = 0.0;
        for (i, intro) in sched.intros.iter().enumerate() {
            let rank = n - i as u32;
            let size = block_size(rank);
            let center = Vec2::new(ROD_XS[0], FLOOR_Y + stacked + size / 2.0);
            stacked += size;
            let rel = |frame: u64| frame - intro.start;

            for (t_idx, &(radius, start_angle, spin_secs, dir)) in TRAIL_ORBITS.iter().enumerate() {
                let spin_end = intro.spin_start + self.secs(spin_secs).max(1);
                for j in 0..TRAIL_POINTS {
                    // linspace(start_angle, 0, TRAIL_POINTS)
                    let angle = start_angle
                        * ((TRAIL_POINTS - 1 - j) as f64 / (TRAIL_POINTS - 1) as f64);
                    let offset = Vec2::new(
                        radius * (TRAIL_ANGLE_FACTOR * angle).cos(),
                        radius * angle.sin(),
                    );
                    let rest = Transform2D {
                        translate: center + offset,
                        anchor: -offset,
                        ..Transform2D::default()
                    };
                    let spun = Transform2D {
                        rotation_rad: dir * TAU,
                        ..rest
                    };

                    let transform = Anim::linear(vec![
                        key(0, rest, Ease::Linear),
                        key(rel(intro.spin_start), rest, Ease::Smooth),
                        key(rel(spin_end), spun, Ease::Linear),
                    ]);

                    let range = FrameRange::new(
                        FrameIndex(intro.start),
                        FrameIndex(intro.restore_end),
                    )?;
                    track = track.clip(
                        ClipBuilder::new(format!("trail{i}_{t_idx}_dot{j}"), "dot", range)
                            .transform(transform)
                            .fill(Anim::constant(TRAIL_COLORS[t_idx]))
                            .opacity(Anim::constant(
                                1.0 - f64::from(j) / f64::from(TRAIL_POINTS),
                            ))
                            .fade_in(FadeSpec::new(
                                self.secs(BLOCK_APPEAR_SECS).max(1),
                                Ease::Smooth,
                            ))
                            .fade_out(FadeSpec::new(
                                self.secs(BLOCK_RESTORE_SECS).max(1),
                                Ease::Smooth,
                            ))
                            .build()?,
                    );
                }
            }
        }

        track.build()
    }

    fn title_track(&self, sched: &Schedule, full: FrameRange) -> HanoivizResult<Track> {
        let create = self.secs(TITLE_CREATE_SECS).max(1);
        let settle = self.secs(TITLE_SETTLE_SECS).max(1);
        let title_range = FrameRange::new(FrameIndex(sched.title_start), full.end)?;
        let rule_start = sched.title_start + create;
        let rule_range = FrameRange::new(FrameIndex(rule_start), full.end)?;

        let title = ClipBuilder::new("title", "title", title_range)
            .transform(Anim::constant(Transform2D::at(Vec2::new(0.0, TITLE_Y))))
            .fade_in(FadeSpec::new(create, Ease::Smooth))
            .build()?;

        let rule_rest = Transform2D::at(Vec2::new(0.0, TITLE_RULE_Y));
        let rule = ClipBuilder::new("title_rule", "title_rule", rule_range)
            .transform(Anim::linear(vec![
                key(
                    0,
                    Transform2D {
                        scale: Vec2::new(0.01, 1.0),
                        ..rule_rest
                    },
                    Ease::OutCubic,
                ),
                key(settle, rule_rest, Ease::Linear),
            ]))
            .fade_in(FadeSpec::new(settle, Ease::Smooth))
            .build()?;

        TrackBuilder::new("title")
            .z_base(50)
            .clip(title)
            .clip(rule)
            .build()
    }
}

fn block_size(rank: u32) -> f64 {
    0.6 + 0.2 * f64::from(rank)
}

fn scaled(t: Transform2D, s: f64) -> Transform2D {
    Transform2D {
        scale: Vec2::new(s, s),
        ..t
    }
}

/// Point at arc-length fraction `s` (0..=1) along a polyline.
fn polyline_point(points: &[Vec2], s: f64) -> Vec2 {
    let total: f64 = points.windows(2).map(|w| (w[1] - w[0]).hypot()).sum();
    if total <= 0.0 {
        return points[0];
    }
    let mut remaining = s.clamp(0.0, 1.0) * total;
    for w in points.windows(2) {
        let len = (w[1] - w[0]).hypot();
        if remaining <= len {
            if len <= 0.0 {
                return w[0];
            }
            let t = remaining / len;
            return Vec2::new(
                w[0].x + (w[1].x - w[0].x) * t,
                w[0].y + (w[1].y - w[0].y) * t,
            );
        }
        remaining -= len;
    }
    points[points.len() - 1]
}

/// All phase boundaries of the choreography, in global frames.
#[derive(Clone, Debug)]
struct Schedule {
    base_pulse_up: u64,
    base_pulse_down: u64,
    base_settled: u64,
    rods_start: u64,
    intros: Vec<IntroTiming>,
    title_start: u64,
    move_starts: Vec<u64>,
    end: u64,
}

#[derive(Clone, Copy, Debug)]
struct IntroTiming {
    start: u64,
    spin_start: u64,
    pulse_end: u64,
    restore_start: u64,
    restore_end: u64,
}

impl Schedule {
    fn plan(sb: &Storyboard) -> Self {
        let s = |secs: f64| sb.fps.secs_to_frames_round(secs);
        let mut cursor = 0u64;

        cursor += s(BASE_CREATE_SECS);
        let base_pulse_up = cursor;
        cursor += s(BASE_PULSE_SECS);
        let base_pulse_down = cursor;
        cursor += s(BASE_PULSE_SECS);
        let base_settled = cursor;
        cursor += s(BASE_WAIT_SECS);
        let rods_start = cursor;
        cursor += s(ROD_SPIRAL_SECS);

        let mut intros = Vec::with_capacity(sb.blocks as usize);
        for _ in 0..sb.blocks {
            let start = cursor;
            let spin_start = start + s(BLOCK_APPEAR_SECS);
            let pulse_end = spin_start + s(BLOCK_PULSE_SECS);
            let restore_start = spin_start + s(BLOCK_SPIN_SECS);
            let restore_end = restore_start + s(BLOCK_RESTORE_SECS);
            intros.push(IntroTiming {
                start,
                spin_start,
                pulse_end,
                restore_start,
                restore_end,
            });
            cursor = restore_end + s(BLOCK_WAIT_SECS);
        }

        cursor += s(TITLE_WAIT_SECS);
        let title_start = cursor;
        cursor += s(TITLE_CREATE_SECS) + s(TITLE_SETTLE_SECS);

        let move_total = hanoi::move_count(sb.blocks);
        let mut move_starts = Vec::with_capacity(move_total as usize);
        for _ in 0..move_total {
            move_starts.push(cursor);
            cursor += s(MOVE_SECS) + s(MOVE_DWELL_SECS);
        }

        cursor += s(FINAL_HOLD_SECS);
        Self {
            base_pulse_up,
            base_pulse_down,
            base_settled,
            rods_start,
            intros,
            title_start,
            move_starts,
            end: cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polyline_point_hits_corners_and_midpoints() {
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(2.0, 0.0),
        ];
        let p0 = polyline_point(&pts, 0.0);
        assert!((p0.x).abs() < 1e-12 && (p0.y).abs() < 1e-12);
        let p_end = polyline_point(&pts, 1.0);
        assert!((p_end.x - 2.0).abs() < 1e-12 && (p_end.y).abs() < 1e-12);
        // Total length 4; fraction 0.5 is 2 units in: one unit along the
        // middle segment.
        let mid = polyline_point(&pts, 0.5);
        assert!((mid.x - 1.0).abs() < 1e-12 && (mid.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn block_sizes_descend_with_intro_order() {
        // Rank n is introduced first and is the largest.
        assert!(block_size(5) > block_size(1));
        assert!((block_size(1) - 0.8).abs() < 1e-12);
        assert!((block_size(5) - 1.6).abs() < 1e-12);
    }

    #[test]
    fn schedule_phases_are_ordered() {
        let sb = Storyboard::default();
        let sched = Schedule::plan(&sb);
        assert!(sched.base_pulse_up < sched.base_pulse_down);
        assert!(sched.base_settled < sched.rods_start);
        assert!(sched.rods_start < sched.intros[0].start);
        let last_intro = sched.intros.last().unwrap();
        assert!(last_intro.restore_end < sched.title_start);
        assert!(sched.title_start < sched.move_starts[0]);
        assert_eq!(sched.move_starts.len(), 31);
        assert!(*sched.move_starts.last().unwrap() < sched.end);
    }

    #[test]
    fn small_storyboards_build_and_validate() {
        for blocks in [1u32, 2, 3] {
            let sb = Storyboard {
                blocks,
                ..Storyboard::default()
            };
            let comp = sb.build().unwrap();
            comp.validate().unwrap();
            // base + rod + dot + title + title_rule + n blocks + n labels
            assert_eq!(comp.assets.len(), 5 + 2 * blocks as usize);
        }
    }

    #[test]
    fn block_count_out_of_range_is_rejected() {
        let sb = Storyboard {
            blocks: 0,
            ..Storyboard::default()
        };
        assert!(sb.build().is_err());
        let sb = Storyboard {
            blocks: 7,
            ..Storyboard::default()
        };
        assert!(sb.build().is_err());
    }
}
