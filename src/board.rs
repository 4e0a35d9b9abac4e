use std::collections::VecDeque;

use crate::draw;
use crate::types::{BoundingBox, Frame, Point};
use crate::vision::{self, HsvBand};

pub const CANVAS_WIDTH: u32 = 636;
pub const CANVAS_HEIGHT: u32 = 471;

/// Bottom row of the toolbar band; centroids at or above it act on the
/// toolbar instead of drawing.
pub const TOOLBAR_MAX_Y: i32 = 65;
/// First canvas row wiped by clear-all (the toolbar above it survives).
const CANVAS_DRAWING_TOP: i32 = 67;

/// Oldest points of a stroke are dropped beyond this many.
pub const STROKE_CAPACITY: usize = 512;

const PEN_THICKNESS: i32 = 2;
const MARKER_OUTLINE: [u8; 4] = [255, 255, 0, 255];
const CLEAR_BOX_OUTLINE: [u8; 4] = [0, 0, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

/// Toolbar geometry: (x_min, x_max) per region, inclusive on both ends.
const CLEAR_REGION: (i32, i32) = (40, 140);
const COLOR_REGIONS: [(i32, i32); 4] = [(160, 255), (275, 370), (390, 485), (505, 600)];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PenColor {
    Blue,
    Green,
    Red,
    Yellow,
}

impl PenColor {
    pub const ALL: [PenColor; 4] = [
        PenColor::Blue,
        PenColor::Green,
        PenColor::Red,
        PenColor::Yellow,
    ];

    pub fn rgba(&self) -> [u8; 4] {
        match self {
            PenColor::Blue => [0, 0, 255, 255],
            PenColor::Green => [0, 255, 0, 255],
            PenColor::Red => [255, 0, 0, 255],
            PenColor::Yellow => [255, 255, 0, 255],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PenColor::Blue => "blue",
            PenColor::Green => "green",
            PenColor::Red => "red",
            PenColor::Yellow => "yellow",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolbarAction {
    ClearAll,
    Select(PenColor),
}

/// One continuous pen-down segment, newest point first.
#[derive(Clone, Debug, Default)]
struct Stroke {
    points: VecDeque<Point>,
}

impl Stroke {
    fn push(&mut self, p: Point) {
        if self.points.len() == STROKE_CAPACITY {
            self.points.pop_back();
        }
        self.points.push_front(p);
    }
}

/// All strokes drawn with one pen color.
#[derive(Clone, Debug)]
struct StrokeSet {
    strokes: Vec<Stroke>,
}

impl StrokeSet {
    fn new() -> Self {
        Self {
            strokes: vec![Stroke::default()],
        }
    }

    fn head(&mut self) -> &mut Stroke {
        // Invariant: never empty, a fresh set starts with one empty stroke.
        self.strokes.last_mut().expect("stroke set never empty")
    }

    fn lift(&mut self) {
        self.strokes.push(Stroke::default());
    }
}

/// Per-frame state machine behind the virtual whiteboard.
///
/// Tracks the largest blob of the target hue band; its centroid either hits
/// the toolbar or extends the active color's current stroke. Losing the blob
/// for a single frame counts as a pen lift.
pub struct StrokeBoardController {
    band: HsvBand,
    sets: [StrokeSet; 4],
    active: PenColor,
    canvas: Frame,
}

impl StrokeBoardController {
    pub fn new(band: HsvBand) -> Self {
        let mut canvas = Frame::filled(CANVAS_WIDTH, CANVAS_HEIGHT, WHITE);
        draw_toolbar(&mut canvas);
        Self {
            band,
            sets: [
                StrokeSet::new(),
                StrokeSet::new(),
                StrokeSet::new(),
                StrokeSet::new(),
            ],
            active: PenColor::Blue,
            canvas,
        }
    }

    pub fn canvas(&self) -> &Frame {
        &self.canvas
    }

    pub fn active_color(&self) -> PenColor {
        self.active
    }

    /// Advance the board by one frame. Draws the toolbar, tracking marker
    /// and all strokes onto the live frame; strokes also land on the
    /// persistent canvas.
    pub fn process_frame(&mut self, frame: &mut Frame) -> Option<ToolbarAction> {
        // Segment before overlays go on, otherwise the blue toolbar swatch
        // would be tracked as a pen.
        let mask = vision::pen_mask(frame, &self.band);
        draw_toolbar(frame);

        let mut action = None;
        match vision::largest_blob(&mask) {
            Some(blob) => {
                draw::circle_outline(frame, blob.centroid, blob.radius, MARKER_OUTLINE, 2);
                if blob.centroid.y <= TOOLBAR_MAX_Y {
                    action = toolbar_hit(blob.centroid.x);
                    match action {
                        Some(ToolbarAction::ClearAll) => self.clear_all(),
                        Some(ToolbarAction::Select(color)) => self.active = color,
                        None => {}
                    }
                } else {
                    self.sets[self.active.index()].head().push(blob.centroid);
                }
            }
            // Pen lifted: every channel starts a new stroke, not only the
            // active one. The extra empty strokes stay invisible until
            // drawn into.
            None => {
                for set in &mut self.sets {
                    set.lift();
                }
            }
        }

        for color in PenColor::ALL {
            for stroke in &self.sets[color.index()].strokes {
                draw::polyline(frame, &stroke.points, color.rgba(), PEN_THICKNESS);
                draw::polyline(&mut self.canvas, &stroke.points, color.rgba(), PEN_THICKNESS);
            }
        }

        action
    }

    fn clear_all(&mut self) {
        for set in &mut self.sets {
            *set = StrokeSet::new();
        }
        let right = self.canvas.width as i32 - 1;
        let bottom = self.canvas.height as i32 - 1;
        draw::fill_rect(&mut self.canvas, 0, CANVAS_DRAWING_TOP, right, bottom, WHITE);
    }
}

fn toolbar_hit(x: i32) -> Option<ToolbarAction> {
    if CLEAR_REGION.0 <= x && x <= CLEAR_REGION.1 {
        return Some(ToolbarAction::ClearAll);
    }
    for (color, (lo, hi)) in PenColor::ALL.iter().zip(COLOR_REGIONS) {
        if lo <= x && x <= hi {
            return Some(ToolbarAction::Select(*color));
        }
    }
    None
}

fn draw_toolbar(frame: &mut Frame) {
    draw::rect_outline(
        frame,
        BoundingBox::new(CLEAR_REGION.0, 1, CLEAR_REGION.1 - CLEAR_REGION.0, TOOLBAR_MAX_Y - 1),
        CLEAR_BOX_OUTLINE,
        2,
    );
    for (color, (lo, hi)) in PenColor::ALL.iter().zip(COLOR_REGIONS) {
        draw::fill_rect(frame, lo, 1, hi, TOOLBAR_MAX_Y, color.rgba());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = 640;
    const H: u32 = 480;

    fn blank() -> Frame {
        Frame::filled(W, H, [0, 0, 0, 255])
    }

    /// Frame with a 29x29 pen marker centered exactly at (cx, cy).
    fn with_marker(cx: i32, cy: i32) -> Frame {
        let mut frame = blank();
        draw::fill_rect(&mut frame, cx - 14, cy - 14, cx + 14, cy + 14, [0, 0, 255, 255]);
        frame
    }

    fn board() -> StrokeBoardController {
        StrokeBoardController::new(HsvBand::BLUE)
    }

    #[test]
    fn point_below_toolbar_extends_active_stroke_only() {
        let mut b = board();
        let action = b.process_frame(&mut with_marker(300, 200));
        assert_eq!(action, None);
        assert_eq!(b.sets[0].strokes.len(), 1);
        assert_eq!(b.sets[0].strokes[0].points.len(), 1);
        assert_eq!(b.sets[0].strokes[0].points[0], Point::new(300, 200));
        for idx in 1..4 {
            assert_eq!(b.sets[idx].strokes[0].points.len(), 0);
        }
    }

    #[test]
    fn pen_lift_opens_a_stroke_in_every_channel() {
        let mut b = board();
        b.process_frame(&mut with_marker(300, 200));
        b.process_frame(&mut blank());
        for set in &b.sets {
            assert_eq!(set.strokes.len(), 2);
        }
        // next point lands in the fresh stroke
        b.process_frame(&mut with_marker(320, 220));
        assert_eq!(b.sets[0].strokes[1].points.len(), 1);
        assert_eq!(b.sets[0].strokes[0].points.len(), 1);
    }

    #[test]
    fn newest_point_sits_at_the_head() {
        let mut b = board();
        b.process_frame(&mut with_marker(300, 200));
        b.process_frame(&mut with_marker(330, 200));
        let points = &b.sets[0].strokes[0].points;
        assert_eq!(points[0], Point::new(330, 200));
        assert_eq!(points[1], Point::new(300, 200));
    }

    #[test]
    fn two_points_draw_a_segment_one_point_does_not() {
        let mut b = board();
        b.process_frame(&mut with_marker(300, 200));
        assert_eq!(b.canvas().pixel(300, 200), Some(WHITE));
        b.process_frame(&mut with_marker(330, 200));
        assert_eq!(b.canvas().pixel(315, 200), Some(PenColor::Blue.rgba()));
    }

    #[test]
    fn toolbar_selection_is_inclusive_at_both_ends() {
        assert_eq!(toolbar_hit(160), Some(ToolbarAction::Select(PenColor::Blue)));
        assert_eq!(toolbar_hit(255), Some(ToolbarAction::Select(PenColor::Blue)));
        assert_eq!(toolbar_hit(256), None);
        assert_eq!(toolbar_hit(40), Some(ToolbarAction::ClearAll));
        assert_eq!(toolbar_hit(140), Some(ToolbarAction::ClearAll));
        assert_eq!(toolbar_hit(505), Some(ToolbarAction::Select(PenColor::Yellow)));
        assert_eq!(toolbar_hit(600), Some(ToolbarAction::Select(PenColor::Yellow)));
        assert_eq!(toolbar_hit(10), None);
    }

    #[test]
    fn marker_in_toolbar_band_selects_a_color() {
        let mut b = board();
        let action = b.process_frame(&mut with_marker(300, 30));
        assert_eq!(action, Some(ToolbarAction::Select(PenColor::Green)));
        assert_eq!(b.active_color(), PenColor::Green);
        // selection does not add any points
        assert_eq!(b.sets[1].strokes[0].points.len(), 0);
    }

    #[test]
    fn clear_all_resets_strokes_and_canvas_but_keeps_color() {
        let mut b = board();
        b.process_frame(&mut with_marker(430, 30)); // select red
        b.process_frame(&mut with_marker(300, 200));
        b.process_frame(&mut with_marker(330, 200));
        assert_eq!(b.canvas().pixel(315, 200), Some(PenColor::Red.rgba()));

        let action = b.process_frame(&mut with_marker(90, 30));
        assert_eq!(action, Some(ToolbarAction::ClearAll));
        for set in &b.sets {
            assert_eq!(set.strokes.len(), 1);
            assert!(set.strokes[0].points.is_empty());
        }
        assert_eq!(b.canvas().pixel(315, 200), Some(WHITE));
        assert_eq!(b.active_color(), PenColor::Red);

        // subsequent points go into the fresh stroke
        b.process_frame(&mut with_marker(100, 300));
        assert_eq!(b.sets[2].strokes[0].points.len(), 1);
    }

    #[test]
    fn toolbar_band_miss_neither_draws_nor_acts() {
        let mut b = board();
        // x = 10 is inside no region
        let mut frame = blank();
        draw::fill_rect(&mut frame, 0, 16, 28, 44, [0, 0, 255, 255]);
        let action = b.process_frame(&mut frame);
        assert_eq!(action, None);
        for set in &b.sets {
            assert_eq!(set.strokes.len(), 1);
            assert!(set.strokes[0].points.is_empty());
        }
    }

    #[test]
    fn stroke_drops_oldest_point_beyond_capacity() {
        let mut stroke = Stroke::default();
        for i in 0..(STROKE_CAPACITY as i32 + 8) {
            stroke.push(Point::new(i, 0));
        }
        assert_eq!(stroke.points.len(), STROKE_CAPACITY);
        assert_eq!(stroke.points[0].x, STROKE_CAPACITY as i32 + 7);
        assert_eq!(stroke.points.back().unwrap().x, 8);
    }
}
