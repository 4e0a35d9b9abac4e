use crate::types::{BoundingBox, Frame, Point};

pub fn put_pixel(frame: &mut Frame, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 {
        return;
    }
    let (ux, uy) = (x as u32, y as u32);
    if ux >= frame.width || uy >= frame.height {
        return;
    }
    let idx = ((uy * frame.width + ux) as usize) * 4;
    frame.rgba[idx..idx + 4].copy_from_slice(&color);
}

/// Bresenham line with a diamond-shaped brush of the given thickness.
pub fn line(frame: &mut Frame, a: Point, b: Point, color: [u8; 4], thickness: i32) {
    let (mut x0, mut y0) = (a.x, a.y);
    let (x1, y1) = (b.x, b.y);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let radius = (thickness.max(1) - 1) / 2;

    loop {
        put_pixel(frame, x0, y0, color);
        if radius > 0 {
            for ox in -radius..=radius {
                for oy in -radius..=radius {
                    if (ox != 0 || oy != 0) && ox.abs() + oy.abs() <= radius {
                        put_pixel(frame, x0 + ox, y0 + oy, color);
                    }
                }
            }
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Connected segments between consecutive points. A single point draws
/// nothing; n points draw n-1 segments.
pub fn polyline<'a, I>(frame: &mut Frame, points: I, color: [u8; 4], thickness: i32)
where
    I: IntoIterator<Item = &'a Point>,
{
    let mut prev: Option<Point> = None;
    for &p in points {
        if let Some(q) = prev {
            line(frame, q, p, color, thickness);
        }
        prev = Some(p);
    }
}

pub fn rect_outline(frame: &mut Frame, bbox: BoundingBox, color: [u8; 4], thickness: i32) {
    let tl = Point::new(bbox.x, bbox.y);
    let tr = Point::new(bbox.right(), bbox.y);
    let br = Point::new(bbox.right(), bbox.bottom());
    let bl = Point::new(bbox.x, bbox.bottom());
    line(frame, tl, tr, color, thickness);
    line(frame, tr, br, color, thickness);
    line(frame, br, bl, color, thickness);
    line(frame, bl, tl, color, thickness);
}

/// Fill the inclusive pixel range [x0, x1] x [y0, y1].
pub fn fill_rect(frame: &mut Frame, x0: i32, y0: i32, x1: i32, y1: i32, color: [u8; 4]) {
    for y in y0..=y1 {
        for x in x0..=x1 {
            put_pixel(frame, x, y, color);
        }
    }
}

/// Circle outline of the given stroke width (a ring, not a disc).
pub fn circle_outline(frame: &mut Frame, center: Point, radius: i32, color: [u8; 4], thickness: i32) {
    let r_out = radius;
    let r_in = (radius - thickness.max(1)).max(0);
    let (out2, in2) = (r_out * r_out, r_in * r_in);
    for oy in -r_out..=r_out {
        for ox in -r_out..=r_out {
            let d2 = ox * ox + oy * oy;
            if d2 <= out2 && d2 > in2 {
                put_pixel(frame, center.x + ox, center.y + oy, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_covers_endpoints() {
        let mut frame = Frame::filled(10, 10, [0, 0, 0, 255]);
        line(
            &mut frame,
            Point::new(1, 1),
            Point::new(8, 6),
            [9, 9, 9, 255],
            1,
        );
        assert_eq!(frame.pixel(1, 1), Some([9, 9, 9, 255]));
        assert_eq!(frame.pixel(8, 6), Some([9, 9, 9, 255]));
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut frame = Frame::filled(4, 4, [0, 0, 0, 255]);
        line(
            &mut frame,
            Point::new(-3, -3),
            Point::new(7, 7),
            [1, 1, 1, 255],
            3,
        );
        assert_eq!(frame.pixel(2, 2), Some([1, 1, 1, 255]));
    }

    #[test]
    fn polyline_needs_two_points() {
        let blank = Frame::filled(8, 8, [0, 0, 0, 255]);

        let mut one = blank.clone();
        polyline(&mut one, [Point::new(4, 4)].iter(), [7, 7, 7, 255], 2);
        assert_eq!(one.rgba, blank.rgba);

        let mut two = blank.clone();
        polyline(
            &mut two,
            [Point::new(2, 4), Point::new(6, 4)].iter(),
            [7, 7, 7, 255],
            1,
        );
        assert_eq!(two.pixel(4, 4), Some([7, 7, 7, 255]));
    }

    #[test]
    fn fill_rect_is_inclusive() {
        let mut frame = Frame::filled(6, 6, [0, 0, 0, 255]);
        fill_rect(&mut frame, 1, 1, 3, 2, [5, 5, 5, 255]);
        let filled = frame
            .rgba
            .chunks_exact(4)
            .filter(|px| px[0] == 5)
            .count();
        assert_eq!(filled, 6);
    }
}
