//! Stroke replication: local pointer gestures in, segments out
//!
//! Local strokes are painted before they are published, so the drawer never waits
//! on the round trip. Remote segments go through the same paint routine but are
//! never published again.

use crate::canvas::Surface;
use log::{debug, warn};
use shared::{
    Intent, Rgb, StrokeSegment, DEFAULT_BRUSH_SIZE, DEFAULT_STROKE_COLOR, MAX_BRUSH_SIZE,
    MIN_BRUSH_SIZE,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    pub color: String,
    pub size: f32,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: DEFAULT_STROKE_COLOR.to_string(),
            size: DEFAULT_BRUSH_SIZE,
        }
    }
}

#[derive(Debug, Default)]
pub struct StrokeEngine {
    brush: Brush,
    last_point: Option<(f32, f32)>,
}

impl StrokeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn is_stroking(&self) -> bool {
        self.last_point.is_some()
    }

    /// Starts a stroke if the local participant may draw. Returns whether it started.
    pub fn pointer_down(&mut self, can_draw: bool, x: f32, y: f32) -> bool {
        if !can_draw {
            return false;
        }
        self.last_point = Some((x, y));
        true
    }

    /// Extends the active stroke by one segment, paints it, and returns the intent
    /// publishing it.
    pub fn pointer_move(
        &mut self,
        can_draw: bool,
        x: f32,
        y: f32,
        room: &str,
        surface: &mut Surface,
    ) -> Option<Intent> {
        let last = self.last_point?;
        if !can_draw {
            debug!("Drawing permission revoked mid-stroke");
            self.last_point = None;
            return None;
        }

        let segment = StrokeSegment::new(last, (x, y), &self.brush.color, self.brush.size);
        self.last_point = Some((x, y));

        if let Err(e) = surface.paint_segment(&segment) {
            warn!("Local segment not painted: {}", e);
            return None;
        }

        Some(Intent::Draw {
            room: room.to_string(),
            segment,
        })
    }

    pub fn pointer_up(&mut self) {
        self.last_point = None;
    }

    /// Paints a segment from another participant, whatever the current phase.
    pub fn apply_remote(&self, segment: &StrokeSegment, surface: &mut Surface) {
        if let Err(e) = surface.paint_segment(segment) {
            warn!("Remote segment not painted: {}", e);
        }
    }

    /// Changes the color for subsequent segments. Unparseable colors are ignored.
    pub fn set_color(&mut self, color: &str) -> bool {
        match color.parse::<Rgb>() {
            Ok(_) => {
                self.brush.color = color.to_string();
                true
            }
            Err(e) => {
                warn!("Rejected brush color: {}", e);
                false
            }
        }
    }

    pub fn set_size(&mut self, size: f32) {
        if size.is_finite() {
            self.brush.size = size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE);
        }
    }

    /// Wipes the surface and drops any stroke in flight.
    pub fn reset(&mut self, surface: &mut Surface) {
        self.last_point = None;
        surface.clear();
    }
}
