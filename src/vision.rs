use rayon::prelude::*;
use serde::Deserialize;

use crate::types::{BoundingBox, Frame, Point};

/// Square structuring element side used by every morphology pass.
const KERNEL_SIDE: i32 = 5;
const KERNEL_RADIUS: i32 = KERNEL_SIDE / 2;

/// Inclusive HSV band in OpenCV 8-bit scale (H 0..=179, S/V 0..=255), so the
/// tuning constants from common tracking recipes carry over unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct HsvBand {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvBand {
    /// Band matching a blue bottle cap or marker under indoor light.
    pub const BLUE: HsvBand = HsvBand {
        lower: [100, 60, 60],
        upper: [140, 255, 255],
    };

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| self.lower[i] <= hsv[i] && hsv[i] <= self.upper[i])
    }
}

/// Binary image, one byte per pixel, 0 or 255.
#[derive(Clone, Debug)]
pub struct Mask {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Mask {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            data: vec![0; width as usize * height as usize],
            width,
            height,
        }
    }

    fn get(&self, x: i32, y: i32) -> Option<bool> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(self.data[(y as u32 * self.width + x as u32) as usize] != 0)
    }
}

/// RGB to HSV, matching OpenCV's 8-bit convention (H halved into 0..=179).
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };
    let h_deg = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / delta
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    let h_deg = if h_deg < 0.0 { h_deg + 360.0 } else { h_deg };

    let mut h = (h_deg / 2.0).round() as i32;
    if h >= 180 {
        h -= 180;
    }
    [h as u8, s.round() as u8, v.round() as u8]
}

/// Threshold a frame against an HSV band.
pub fn hue_mask(frame: &Frame, band: &HsvBand) -> Mask {
    let data: Vec<u8> = frame
        .rgba
        .par_chunks_exact(4)
        .map(|px| {
            if band.contains(rgb_to_hsv(px[0], px[1], px[2])) {
                255
            } else {
                0
            }
        })
        .collect();
    Mask {
        data,
        width: frame.width,
        height: frame.height,
    }
}

/// One erosion pass: a pixel survives only if every in-bounds pixel under
/// the 5x5 kernel is set.
fn erode_once(mask: &Mask) -> Mask {
    morph(mask, |src, x, y| {
        for oy in -KERNEL_RADIUS..=KERNEL_RADIUS {
            for ox in -KERNEL_RADIUS..=KERNEL_RADIUS {
                if src.get(x + ox, y + oy) == Some(false) {
                    return false;
                }
            }
        }
        true
    })
}

/// One dilation pass: a pixel is set if any pixel under the kernel is set.
fn dilate_once(mask: &Mask) -> Mask {
    morph(mask, |src, x, y| {
        for oy in -KERNEL_RADIUS..=KERNEL_RADIUS {
            for ox in -KERNEL_RADIUS..=KERNEL_RADIUS {
                if src.get(x + ox, y + oy) == Some(true) {
                    return true;
                }
            }
        }
        false
    })
}

fn morph(mask: &Mask, keep: impl Fn(&Mask, i32, i32) -> bool + Sync) -> Mask {
    let keep = &keep;
    let w = mask.width as usize;
    let data: Vec<u8> = (0..w * mask.height as usize)
        .into_par_iter()
        .map(|idx| {
            let (x, y) = ((idx % w) as i32, (idx / w) as i32);
            if keep(mask, x, y) { 255 } else { 0 }
        })
        .collect();
    Mask {
        data,
        width: mask.width,
        height: mask.height,
    }
}

pub fn erode(mask: &Mask, iterations: u32) -> Mask {
    let mut out = mask.clone();
    for _ in 0..iterations {
        out = erode_once(&out);
    }
    out
}

pub fn dilate(mask: &Mask, iterations: u32) -> Mask {
    let mut out = mask.clone();
    for _ in 0..iterations {
        out = dilate_once(&out);
    }
    out
}

/// Morphological opening (erode then dilate, one pass each).
pub fn open(mask: &Mask) -> Mask {
    dilate_once(&erode_once(mask))
}

/// The full cleanup chain applied to the pen-tracking mask. The parameters
/// (5x5 kernel, erode x2, open, dilate x1) are load-bearing: changing them
/// shifts when the pen is considered lifted.
pub fn pen_mask(frame: &Frame, band: &HsvBand) -> Mask {
    dilate(&open(&erode(&hue_mask(frame, band), 2)), 1)
}

/// A 4-connected component of a binary mask.
#[derive(Clone, Debug)]
pub struct Blob {
    pub area: usize,
    pub centroid: Point,
    /// Radius of the marker circle drawn around the blob, from the bounding
    /// box diagonal.
    pub radius: i32,
    pub bbox: BoundingBox,
}

/// All connected components, unordered.
pub fn blobs(mask: &Mask) -> Vec<Blob> {
    let w = mask.width as usize;
    let h = mask.height as usize;
    let mut visited = vec![false; w * h];
    let mut out = Vec::new();
    let mut stack = Vec::new();

    for start in 0..w * h {
        if mask.data[start] == 0 || visited[start] {
            continue;
        }
        visited[start] = true;
        stack.push(start);

        let (mut sum_x, mut sum_y, mut area) = (0i64, 0i64, 0usize);
        let (mut min_x, mut min_y) = (w - 1, h - 1);
        let (mut max_x, mut max_y) = (0usize, 0usize);

        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % w, idx / w);
            sum_x += x as i64;
            sum_y += y as i64;
            area += 1;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);

            let mut push = |nx: usize, ny: usize| {
                let nidx = ny * w + nx;
                if mask.data[nidx] != 0 && !visited[nidx] {
                    visited[nidx] = true;
                    stack.push(nidx);
                }
            };
            if x > 0 {
                push(x - 1, y);
            }
            if x + 1 < w {
                push(x + 1, y);
            }
            if y > 0 {
                push(x, y - 1);
            }
            if y + 1 < h {
                push(x, y + 1);
            }
        }

        let bw = (max_x - min_x + 1) as i32;
        let bh = (max_y - min_y + 1) as i32;
        let radius = (((bw * bw + bh * bh) as f32).sqrt() / 2.0).ceil() as i32;
        out.push(Blob {
            area,
            centroid: Point::new((sum_x / area as i64) as i32, (sum_y / area as i64) as i32),
            radius,
            bbox: BoundingBox::new(min_x as i32, min_y as i32, bw, bh),
        });
    }

    out
}

/// The component with the largest pixel area, if any pixel is set.
pub fn largest_blob(mask: &Mask) -> Option<Blob> {
    blobs(mask).into_iter().max_by_key(|b| b.area)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw;

    fn mask_from(rows: &[&str]) -> Mask {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let data = rows
            .iter()
            .flat_map(|r| r.bytes().map(|b| if b == b'#' { 255 } else { 0 }))
            .collect();
        Mask {
            data,
            width,
            height,
        }
    }

    #[test]
    fn hsv_of_primary_colors() {
        assert_eq!(rgb_to_hsv(255, 0, 0), [0, 255, 255]);
        assert_eq!(rgb_to_hsv(0, 255, 0), [60, 255, 255]);
        assert_eq!(rgb_to_hsv(0, 0, 255), [120, 255, 255]);
        assert_eq!(rgb_to_hsv(128, 128, 128), [0, 0, 128]);
    }

    #[test]
    fn blue_band_matches_pure_blue_only() {
        assert!(HsvBand::BLUE.contains(rgb_to_hsv(0, 0, 255)));
        assert!(!HsvBand::BLUE.contains(rgb_to_hsv(255, 0, 0)));
        assert!(!HsvBand::BLUE.contains(rgb_to_hsv(40, 40, 45))); // too dark
    }

    #[test]
    fn hue_mask_selects_colored_region() {
        let mut frame = Frame::filled(20, 20, [0, 0, 0, 255]);
        draw::fill_rect(&mut frame, 5, 5, 14, 14, [0, 0, 255, 255]);
        let mask = hue_mask(&frame, &HsvBand::BLUE);
        assert_eq!(mask.data.iter().filter(|&&p| p != 0).count(), 100);
    }

    #[test]
    fn erode_removes_specks_dilate_restores_bulk() {
        let mask = mask_from(&[
            "..........",
            ".########.",
            ".########.",
            ".########.",
            ".########.",
            ".########.",
            ".########.",
            "..........",
            "#.........",
            "..........",
        ]);
        let eroded = erode(&mask, 1);
        // lone pixel at (0, 8) is gone
        assert_eq!(eroded.get(0, 8), Some(false));
        // the 8x6 block survives erosion at its center
        assert_eq!(eroded.get(4, 3), Some(true));
        let reopened = dilate(&eroded, 1);
        assert_eq!(reopened.get(2, 2), Some(true));
        assert_eq!(reopened.get(0, 8), Some(false));
    }

    #[test]
    fn pen_mask_drops_small_noise() {
        let mut frame = Frame::filled(40, 40, [0, 0, 0, 255]);
        // 2x2 speck: eliminated by the double erosion
        draw::fill_rect(&mut frame, 1, 1, 2, 2, [0, 0, 255, 255]);
        // 20x20 block: survives the whole chain
        draw::fill_rect(&mut frame, 10, 10, 29, 29, [0, 0, 255, 255]);
        let mask = pen_mask(&frame, &HsvBand::BLUE);
        let blob = largest_blob(&mask).unwrap();
        assert!(blob.area > 0);
        assert_eq!(blob.centroid, Point::new(19, 19));
        assert_eq!(blobs(&mask).len(), 1);
    }

    #[test]
    fn largest_blob_picks_bigger_component() {
        let mask = mask_from(&[
            "##....####",
            "##....####",
            "......####",
            "..........",
        ]);
        let blob = largest_blob(&mask).unwrap();
        assert_eq!(blob.area, 12);
        assert_eq!(blob.bbox, BoundingBox::new(6, 0, 4, 3));
        assert_eq!(blob.centroid, Point::new(7, 1));
    }

    #[test]
    fn empty_mask_has_no_blob() {
        assert!(largest_blob(&Mask::empty(8, 8)).is_none());
    }
}
