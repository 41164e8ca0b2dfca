//! Fill colors used by the choreography.

use crate::core::Rgba8;

pub const WHITE: Rgba8 = Rgba8::rgb(0xFF, 0xFF, 0xFF);
pub const BLACK: Rgba8 = Rgba8::rgb(0x00, 0x00, 0x00);

pub const BLUE: Rgba8 = Rgba8::rgb(0x58, 0xC4, 0xDD);
pub const GREEN: Rgba8 = Rgba8::rgb(0x83, 0xC1, 0x67);
pub const YELLOW: Rgba8 = Rgba8::rgb(0xFF, 0xFF, 0x00);
pub const ORANGE: Rgba8 = Rgba8::rgb(0xFF, 0x86, 0x2F);
pub const PURPLE: Rgba8 = Rgba8::rgb(0x9A, 0x72, 0xAC);
pub const RED: Rgba8 = Rgba8::rgb(0xFC, 0x62, 0x55);
pub const RED_DARK: Rgba8 = Rgba8::rgb(0xE6, 0x5A, 0x4C);

pub const PURE_RED: Rgba8 = Rgba8::rgb(0xFF, 0x00, 0x00);
pub const PURE_GREEN: Rgba8 = Rgba8::rgb(0x00, 0xFF, 0x00);

/// Block fill colors, cycled by block index (largest block first).
pub const BLOCK_CYCLE: [Rgba8; 6] = [WHITE, BLUE, GREEN, YELLOW, ORANGE, PURPLE];

/// Canvas clear color behind the scene.
pub const BACKGROUND: [u8; 4] = [17, 17, 17, 255];
