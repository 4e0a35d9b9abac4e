use std::time::Instant;

use crate::draw;

/// A single RGBA8 video frame, row-major, 4 bytes per pixel.
#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: Instant,
}

impl Frame {
    pub fn new(rgba: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(rgba.len(), width as usize * height as usize * 4);
        Self {
            rgba,
            width,
            height,
            timestamp: Instant::now(),
        }
    }

    /// A frame filled with a single color.
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut rgba = vec![0u8; width as usize * height as usize * 4];
        for px in rgba.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
        Self::new(rgba, width, height)
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        let idx = ((y as u32 * self.width + x as u32) as usize) * 4;
        Some([
            self.rgba[idx],
            self.rgba[idx + 1],
            self.rgba[idx + 2],
            self.rgba[idx + 3],
        ])
    }

    /// Copy of the region covered by `bbox`, clamped to the frame bounds.
    /// Returns `None` when the clamped region is empty.
    pub fn crop(&self, bbox: BoundingBox) -> Option<Frame> {
        let x0 = bbox.x.max(0) as u32;
        let y0 = bbox.y.max(0) as u32;
        let x1 = (bbox.right().max(0) as u32).min(self.width);
        let y1 = (bbox.bottom().max(0) as u32).min(self.height);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        let (w, h) = (x1 - x0, y1 - y0);
        let mut rgba = Vec::with_capacity((w * h) as usize * 4);
        for row in y0..y1 {
            let start = ((row * self.width + x0) as usize) * 4;
            let end = start + (w as usize) * 4;
            rgba.extend_from_slice(&self.rgba[start..end]);
        }
        Some(Frame {
            rgba,
            width: w,
            height: h,
            timestamp: self.timestamp,
        })
    }

    /// Mirror the frame around its vertical axis in place.
    pub fn mirror_horizontal(&mut self) {
        let w = self.width as usize;
        for row in self.rgba.chunks_exact_mut(w * 4) {
            for x in 0..w / 2 {
                let a = x * 4;
                let b = (w - 1 - x) * 4;
                for c in 0..4 {
                    row.swap(a + c, b + c);
                }
            }
        }
    }
}

/// Integer pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned detection rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn area(&self) -> i64 {
        self.w as i64 * self.h as i64
    }

    /// Draw the rectangle outline onto a frame.
    pub fn outline(&self, frame: &mut Frame, color: [u8; 4], thickness: i32) {
        draw::rect_outline(frame, *self, color, thickness);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_is_clamped_to_frame() {
        let frame = Frame::filled(10, 10, [1, 2, 3, 255]);
        let crop = frame.crop(BoundingBox::new(6, 6, 8, 8)).unwrap();
        assert_eq!((crop.width, crop.height), (4, 4));
        assert_eq!(crop.rgba.len(), 4 * 4 * 4);
    }

    #[test]
    fn crop_outside_frame_is_none() {
        let frame = Frame::filled(10, 10, [0, 0, 0, 255]);
        assert!(frame.crop(BoundingBox::new(20, 20, 4, 4)).is_none());
        assert!(frame.crop(BoundingBox::new(-8, 0, 4, 4)).is_none());
    }

    #[test]
    fn mirror_swaps_columns() {
        let mut frame = Frame::filled(4, 1, [0, 0, 0, 255]);
        frame.rgba[0..4].copy_from_slice(&[9, 9, 9, 255]);
        frame.mirror_horizontal();
        assert_eq!(frame.pixel(3, 0), Some([9, 9, 9, 255]));
        assert_eq!(frame.pixel(0, 0), Some([0, 0, 0, 255]));
    }
}
