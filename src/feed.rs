use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::avatar::GestureAvatarController;
use crate::board::{StrokeBoardController, ToolbarAction};
use crate::types::Frame;
use crate::Result;

/// Encode a frame as JPEG, dropping the alpha channel first.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>> {
    let rgb: Vec<u8> = frame
        .rgba
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder.encode(&rgb, frame.width, frame.height, ExtendedColorType::Rgb8)?;
    Ok(buf)
}

/// One frame's worth of streamable output: the annotated live view plus the
/// side panel (avatar icon or whiteboard canvas).
pub struct FeedOutput {
    pub live_jpeg: Vec<u8>,
    pub panel_jpeg: Vec<u8>,
}

/// Streams the gesture avatar: annotated camera view next to the current
/// icon.
pub struct AvatarFeed {
    controller: GestureAvatarController,
    quality: u8,
}

impl AvatarFeed {
    pub fn new(controller: GestureAvatarController, quality: u8) -> Self {
        Self { controller, quality }
    }

    pub fn controller(&self) -> &GestureAvatarController {
        &self.controller
    }

    pub fn next(&mut self, frame: &mut Frame) -> Result<FeedOutput> {
        let outcome = self.controller.process_frame(frame);
        if outcome.changed {
            log::info!("avatar icon -> {}", outcome.icon.label());
        }
        Ok(FeedOutput {
            live_jpeg: encode_jpeg(frame, self.quality)?,
            panel_jpeg: encode_jpeg(self.controller.icon_image(), self.quality)?,
        })
    }
}

/// Streams the whiteboard: live view with overlays next to the persistent
/// canvas.
pub struct BoardFeed {
    controller: StrokeBoardController,
    quality: u8,
}

impl BoardFeed {
    pub fn new(controller: StrokeBoardController, quality: u8) -> Self {
        Self { controller, quality }
    }

    pub fn controller(&self) -> &StrokeBoardController {
        &self.controller
    }

    pub fn next(&mut self, frame: &mut Frame) -> Result<FeedOutput> {
        match self.controller.process_frame(frame) {
            Some(ToolbarAction::ClearAll) => log::info!("board cleared"),
            Some(ToolbarAction::Select(color)) => log::info!("pen color -> {}", color.label()),
            None => {}
        }
        Ok(FeedOutput {
            live_jpeg: encode_jpeg(frame, self.quality)?,
            panel_jpeg: encode_jpeg(self.controller.canvas(), self.quality)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::HsvBand;

    #[test]
    fn encode_jpeg_emits_jpeg_magic() {
        let frame = Frame::filled(16, 16, [30, 120, 200, 255]);
        let bytes = encode_jpeg(&frame, 80).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn board_feed_produces_both_views() {
        let mut feed = BoardFeed::new(StrokeBoardController::new(HsvBand::BLUE), 75);
        let mut frame = Frame::filled(640, 480, [0, 0, 0, 255]);
        let out = feed.next(&mut frame).unwrap();
        assert!(!out.live_jpeg.is_empty());
        assert!(!out.panel_jpeg.is_empty());
    }
}
