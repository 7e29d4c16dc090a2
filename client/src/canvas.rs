//! Pure raster drawing surface
//!
//! The surface is the only durable representation of strokes: segments are
//! rasterized into it and then discarded. Painting is deterministic, so a segment
//! painted locally and the same segment received from a peer produce identical
//! pixels. Uploading the raster to the GPU is the renderer's job; the surface only
//! records that a repaint is due.

use shared::{ProtocolError, Rgb, StrokeSegment, CANVAS_HEIGHT, CANVAS_WIDTH};

const BYTES_PER_PIXEL: usize = 4;

pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    dirty: bool,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        let mut surface = Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
            dirty: true,
        };
        surface.clear();
        surface
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Rasterizes a round-capped line of `segment.size` width.
    ///
    /// Every pixel whose center lies within half the width of the segment takes the
    /// segment color. Parts of the segment outside the surface are clipped.
    pub fn paint_segment(&mut self, segment: &StrokeSegment) -> Result<(), ProtocolError> {
        segment.validate()?;
        let rgb = segment.rgb()?;
        let radius = (segment.size / 2.0).max(0.5);

        let min_x = (segment.x0.min(segment.x1) - radius).floor().max(0.0);
        let min_y = (segment.y0.min(segment.y1) - radius).floor().max(0.0);
        let max_x = (segment.x0.max(segment.x1) + radius)
            .ceil()
            .min(self.width as f32 - 1.0);
        let max_y = (segment.y0.max(segment.y1) + radius)
            .ceil()
            .min(self.height as f32 - 1.0);

        if min_x > max_x || min_y > max_y {
            self.dirty = true;
            return Ok(());
        }

        for py in min_y as u32..=max_y as u32 {
            for px in min_x as u32..=max_x as u32 {
                let center = (px as f32 + 0.5, py as f32 + 0.5);
                if distance_to_segment(center, segment) <= radius {
                    self.put_pixel(px, py, rgb);
                }
            }
        }

        self.dirty = true;
        Ok(())
    }

    /// Resets every pixel to the background. There is no undo history.
    pub fn clear(&mut self) {
        for pixel in self.pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            pixel.copy_from_slice(&[Rgb::WHITE.r, Rgb::WHITE.g, Rgb::WHITE.b, 255]);
        }
        self.dirty = true;
    }

    pub fn is_blank(&self) -> bool {
        self.pixels
            .chunks_exact(BYTES_PER_PIXEL)
            .all(|pixel| pixel == [255, 255, 255, 255])
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = self.offset(x, y);
        Some(Rgb {
            r: self.pixels[offset],
            g: self.pixels[offset + 1],
            b: self.pixels[offset + 2],
        })
    }

    /// Raw RGBA bytes, row-major.
    pub fn rgba(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns whether the raster changed since the last call, resetting the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    fn put_pixel(&mut self, x: u32, y: u32, rgb: Rgb) {
        let offset = self.offset(x, y);
        self.pixels[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&[rgb.r, rgb.g, rgb.b, 255]);
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(CANVAS_WIDTH, CANVAS_HEIGHT)
    }
}

impl PartialEq for Surface {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.pixels == other.pixels
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("dirty", &self.dirty)
            .finish()
    }
}

fn distance_to_segment(point: (f32, f32), segment: &StrokeSegment) -> f32 {
    let dx = segment.x1 - segment.x0;
    let dy = segment.y1 - segment.y0;
    let length_sq = dx * dx + dy * dy;

    let t = if length_sq <= f32::EPSILON {
        0.0
    } else {
        (((point.0 - segment.x0) * dx + (point.1 - segment.y0) * dy) / length_sq).clamp(0.0, 1.0)
    };

    let nearest_x = segment.x0 + t * dx;
    let nearest_y = segment.y0 + t * dy;
    ((point.0 - nearest_x).powi(2) + (point.1 - nearest_y).powi(2)).sqrt()
}
