use crate::types::{BoundingBox, Frame};
use crate::vision::{self, HsvBand};

/// Seam for per-frame object detection. The production detector (a cascade
/// classifier) lives outside this crate; anything that can turn a frame into
/// bounding boxes plugs in here. An empty result is a normal outcome, not an
/// error — it feeds the negative branch of the debounce logic.
pub trait GestureDetector {
    fn detect(&mut self, frame: &Frame) -> Vec<BoundingBox>;
}

impl<F> GestureDetector for F
where
    F: FnMut(&Frame) -> Vec<BoundingBox>,
{
    fn detect(&mut self, frame: &Frame) -> Vec<BoundingBox> {
        self(frame)
    }
}

/// Stand-in detector that reports hue-band blobs as bounding boxes, largest
/// first. Lets the avatar run against colored markers when no cascade
/// collaborator is wired up (demo binary, tests).
pub struct HueBlobDetector {
    band: HsvBand,
    min_area: usize,
}

impl HueBlobDetector {
    pub fn new(band: HsvBand, min_area: usize) -> Self {
        Self { band, min_area }
    }
}

impl GestureDetector for HueBlobDetector {
    fn detect(&mut self, frame: &Frame) -> Vec<BoundingBox> {
        let mask = vision::open(&vision::hue_mask(frame, &self.band));
        let mut found = vision::blobs(&mask);
        found.retain(|b| b.area >= self.min_area);
        found.sort_by(|a, b| b.area.cmp(&a.area));
        found.into_iter().map(|b| b.bbox).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw;

    #[test]
    fn hue_blob_detector_boxes_the_marker() {
        let mut frame = Frame::filled(40, 40, [0, 0, 0, 255]);
        draw::fill_rect(&mut frame, 8, 8, 23, 23, [0, 0, 255, 255]);
        let mut detector = HueBlobDetector::new(HsvBand::BLUE, 20);
        let boxes = detector.detect(&frame);
        assert_eq!(boxes.len(), 1);
        let b = boxes[0];
        assert!(b.x >= 6 && b.right() <= 26, "box {b:?} should hug the marker");
    }

    #[test]
    fn empty_frame_detects_nothing() {
        let frame = Frame::filled(32, 32, [0, 0, 0, 255]);
        let mut detector = HueBlobDetector::new(HsvBand::BLUE, 1);
        assert!(detector.detect(&frame).is_empty());
    }

    #[test]
    fn closures_are_detectors() {
        let frame = Frame::filled(8, 8, [0, 0, 0, 255]);
        let mut fixed = |_: &Frame| vec![BoundingBox::new(1, 1, 2, 2)];
        let boxes = GestureDetector::detect(&mut fixed, &frame);
        assert_eq!(boxes[0], BoundingBox::new(1, 1, 2, 2));
    }
}
