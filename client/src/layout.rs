//! Window geometry shared by input mapping and rendering

use shared::{CANVAS_HEIGHT, CANVAS_WIDTH};

pub const WINDOW_WIDTH: i32 = 1400;
pub const WINDOW_HEIGHT: i32 = 640;

pub const PALETTE: [&str; 10] = [
    "#000000", "#ffffff", "#ff4444", "#ff9900", "#ffdd00", "#33cc33", "#00aaff", "#3344ff",
    "#aa44ff", "#8b4513",
];
pub const BRUSH_SIZES: [f32; 4] = [2.0, 4.0, 8.0, 12.0];

const MARGIN: f32 = 10.0;
const SIDEBAR_WIDTH: f32 = 220.0;
const TOOLBAR_HEIGHT: f32 = 50.0;
const SWATCH_SIZE: f32 = 28.0;
const SWATCH_GAP: f32 = 6.0;
const GUESS_BOX_HEIGHT: f32 = 32.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolbarHit {
    Color(&'static str),
    Size(f32),
}

#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub sidebar: Rect,
    pub toolbar: Rect,
    pub canvas: Rect,
    pub chat: Rect,
    pub guess_box: Rect,
}

impl Layout {
    pub fn new() -> Self {
        let canvas_x = MARGIN * 2.0 + SIDEBAR_WIDTH;
        let canvas_y = MARGIN * 2.0 + TOOLBAR_HEIGHT;
        let chat_x = canvas_x + CANVAS_WIDTH as f32 + MARGIN;
        let chat_w = WINDOW_WIDTH as f32 - chat_x - MARGIN;
        let full_h = WINDOW_HEIGHT as f32 - MARGIN * 2.0;

        Self {
            sidebar: Rect {
                x: MARGIN,
                y: MARGIN,
                w: SIDEBAR_WIDTH,
                h: full_h,
            },
            toolbar: Rect {
                x: canvas_x,
                y: MARGIN,
                w: CANVAS_WIDTH as f32,
                h: TOOLBAR_HEIGHT,
            },
            canvas: Rect {
                x: canvas_x,
                y: canvas_y,
                w: CANVAS_WIDTH as f32,
                h: CANVAS_HEIGHT as f32,
            },
            chat: Rect {
                x: chat_x,
                y: MARGIN,
                w: chat_w,
                h: full_h - GUESS_BOX_HEIGHT - MARGIN,
            },
            guess_box: Rect {
                x: chat_x,
                y: WINDOW_HEIGHT as f32 - MARGIN - GUESS_BOX_HEIGHT,
                w: chat_w,
                h: GUESS_BOX_HEIGHT,
            },
        }
    }

    /// Converts window coordinates to drawing-surface coordinates.
    pub fn to_surface(&self, x: f32, y: f32) -> (f32, f32) {
        (x - self.canvas.x, y - self.canvas.y)
    }

    pub fn swatch_rect(&self, index: usize) -> Rect {
        Rect {
            x: self.toolbar.x + MARGIN + index as f32 * (SWATCH_SIZE + SWATCH_GAP),
            y: self.toolbar.y + (TOOLBAR_HEIGHT - SWATCH_SIZE) / 2.0,
            w: SWATCH_SIZE,
            h: SWATCH_SIZE,
        }
    }

    /// Brush size buttons sit right-aligned in the toolbar.
    pub fn size_rect(&self, index: usize) -> Rect {
        let count = BRUSH_SIZES.len() as f32;
        let start = self.toolbar.x + self.toolbar.w - MARGIN - count * (SWATCH_SIZE + SWATCH_GAP);
        Rect {
            x: start + index as f32 * (SWATCH_SIZE + SWATCH_GAP),
            y: self.toolbar.y + (TOOLBAR_HEIGHT - SWATCH_SIZE) / 2.0,
            w: SWATCH_SIZE,
            h: SWATCH_SIZE,
        }
    }

    pub fn toolbar_hit(&self, x: f32, y: f32) -> Option<ToolbarHit> {
        if !self.toolbar.contains(x, y) {
            return None;
        }
        if let Some(i) = (0..PALETTE.len()).find(|&i| self.swatch_rect(i).contains(x, y)) {
            return Some(ToolbarHit::Color(PALETTE[i]));
        }
        (0..BRUSH_SIZES.len())
            .find(|&i| self.size_rect(i).contains(x, y))
            .map(|i| ToolbarHit::Size(BRUSH_SIZES[i]))
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new()
    }
}
