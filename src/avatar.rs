use std::path::PathBuf;

use crate::debounce::Debouncer;
use crate::detect::GestureDetector;
use crate::error::{Result, VidgetsError};
use crate::types::{BoundingBox, Frame};

pub const ICON_WIDTH: u32 = 85;
pub const ICON_HEIGHT: u32 = 75;

/// Frames a gesture must persist before the icon swaps.
pub const GESTURE_FRAMES: u32 = 15;
/// Faceless frames before the avatar falls asleep.
pub const SLEEP_FRAMES: u32 = 150;

const FACE_OUTLINE: [u8; 4] = [0, 255, 0, 255];
const SMILE_OUTLINE: [u8; 4] = [255, 0, 0, 255];
const PALM_OUTLINE: [u8; 4] = [0, 0, 0, 255];
const FIST_OUTLINE: [u8; 4] = [255, 255, 255, 255];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IconKind {
    Default,
    Sleep,
    Hand,
    ThumbUp,
    ThumbDown,
}

impl IconKind {
    pub fn label(&self) -> &'static str {
        match self {
            IconKind::Default => "default",
            IconKind::Sleep => "sleep",
            IconKind::Hand => "hand",
            IconKind::ThumbUp => "thumb-up",
            IconKind::ThumbDown => "thumb-down",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AvatarState {
    Active,
    Sleeping,
}

#[derive(Clone, Debug)]
pub struct IconPaths {
    pub avatar: PathBuf,
    pub sleep: PathBuf,
    pub hand: PathBuf,
    pub thumb_up: PathBuf,
    pub thumb_down: PathBuf,
}

/// The five avatar panels, pre-rendered at construction. Every gesture icon
/// is composited over the avatar's own background color so the panel keeps a
/// uniform look (70% icon, 30% background).
pub struct IconSet {
    default_icon: Frame,
    sleep: Frame,
    hand: Frame,
    thumb_up: Frame,
    thumb_down: Frame,
}

impl IconSet {
    pub fn load(paths: &IconPaths) -> Result<Self> {
        let default_icon = load_panel(&paths.avatar)?;
        // Background color sampled from the avatar's top-left corner.
        let bg = default_icon
            .pixel(0, 0)
            .unwrap_or([0, 0, 0, 255]);
        Ok(Self {
            sleep: compose(load_panel(&paths.sleep)?, bg),
            hand: compose(load_panel(&paths.hand)?, bg),
            thumb_up: compose(load_panel(&paths.thumb_up)?, bg),
            thumb_down: compose(load_panel(&paths.thumb_down)?, bg),
            default_icon,
        })
    }

    /// Flat-colored placeholder panels, for demos without icon assets and
    /// for tests.
    pub fn solid() -> Self {
        let panel = |color| Frame::filled(ICON_WIDTH, ICON_HEIGHT, color);
        Self {
            default_icon: panel([70, 70, 70, 255]),
            sleep: panel([20, 20, 90, 255]),
            hand: panel([200, 160, 20, 255]),
            thumb_up: panel([30, 160, 30, 255]),
            thumb_down: panel([160, 30, 30, 255]),
        }
    }

    pub fn image(&self, kind: IconKind) -> &Frame {
        match kind {
            IconKind::Default => &self.default_icon,
            IconKind::Sleep => &self.sleep,
            IconKind::Hand => &self.hand,
            IconKind::ThumbUp => &self.thumb_up,
            IconKind::ThumbDown => &self.thumb_down,
        }
    }
}

fn load_panel(path: &PathBuf) -> Result<Frame> {
    let img = image::open(path).map_err(|err| VidgetsError::IconLoad {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    let resized = img.resize_exact(
        ICON_WIDTH,
        ICON_HEIGHT,
        image::imageops::FilterType::Triangle,
    );
    Ok(Frame::new(
        resized.to_rgba8().into_raw(),
        ICON_WIDTH,
        ICON_HEIGHT,
    ))
}

fn compose(icon: Frame, bg: [u8; 4]) -> Frame {
    let mut out = icon;
    for px in out.rgba.chunks_exact_mut(4) {
        for c in 0..3 {
            px[c] = (px[c] as f32 * 0.7 + bg[c] as f32 * 0.3).round() as u8;
        }
        px[3] = 255;
    }
    out
}

/// Detectors for the four gesture channels, injected at construction.
pub struct Detectors {
    pub face: Box<dyn GestureDetector>,
    pub smile: Box<dyn GestureDetector>,
    pub palm: Box<dyn GestureDetector>,
    pub fist: Box<dyn GestureDetector>,
}

#[derive(Clone, Copy, Debug)]
pub struct AvatarOutcome {
    /// Icon currently shown on the avatar panel.
    pub icon: IconKind,
    /// Whether this frame swapped the icon.
    pub changed: bool,
    pub state: AvatarState,
}

/// Per-frame state machine behind the gesture avatar.
///
/// Smile, palm and fist each run through their own [`Debouncer`]; the sleep
/// transition uses a plain counter because it has no negative branch (any
/// face wakes the avatar immediately).
pub struct GestureAvatarController {
    detectors: Detectors,
    icons: IconSet,
    smile_gate: Debouncer,
    palm_gate: Debouncer,
    fist_gate: Debouncer,
    faceless_frames: u32,
    sleep_after: u32,
    state: AvatarState,
    current: IconKind,
}

impl GestureAvatarController {
    pub fn new(detectors: Detectors, icons: IconSet) -> Self {
        Self::with_thresholds(detectors, icons, GESTURE_FRAMES, SLEEP_FRAMES)
    }

    pub fn with_thresholds(
        detectors: Detectors,
        icons: IconSet,
        gesture_frames: u32,
        sleep_frames: u32,
    ) -> Self {
        Self {
            detectors,
            icons,
            smile_gate: Debouncer::new(gesture_frames),
            palm_gate: Debouncer::new(gesture_frames),
            fist_gate: Debouncer::new(gesture_frames),
            faceless_frames: 0,
            sleep_after: sleep_frames,
            state: AvatarState::Active,
            current: IconKind::Default,
        }
    }

    pub fn state(&self) -> AvatarState {
        self.state
    }

    pub fn icon_image(&self) -> &Frame {
        self.icons.image(self.current)
    }

    /// Advance all gesture channels by one frame. Draws detection overlays
    /// onto the live frame; the avatar panel is available via
    /// [`icon_image`](Self::icon_image).
    pub fn process_frame(&mut self, frame: &mut Frame) -> AvatarOutcome {
        let mut swap: Option<IconKind> = None;

        let faces = self.detectors.face.detect(frame);
        if let Some(&face) = faces.first() {
            // Only the first face participates; extra detections are noise.
            self.faceless_frames = 0;
            if self.state == AvatarState::Sleeping {
                self.state = AvatarState::Active;
                swap = Some(IconKind::Default);
            }

            let smile = frame
                .crop(face)
                .and_then(|roi| self.detectors.smile.detect(&roi).first().copied());

            face.outline(frame, FACE_OUTLINE, 2);
            if let Some(s) = smile {
                // Smile boxes come back in ROI coordinates.
                BoundingBox::new(face.x + s.x, face.y + s.y, s.w, s.h)
                    .outline(frame, SMILE_OUTLINE, 3);
            }
            if self.smile_gate.observe(smile.is_some()) {
                swap = Some(IconKind::ThumbUp);
            }
        } else {
            self.faceless_frames = self.faceless_frames.saturating_add(1);
            if self.faceless_frames == self.sleep_after {
                self.state = AvatarState::Sleeping;
                swap = Some(IconKind::Sleep);
            }
        }

        // Palm and fist channels run whether or not a face is visible.
        let palm = self.detectors.palm.detect(frame).first().copied();
        if let Some(b) = palm {
            b.outline(frame, PALM_OUTLINE, 3);
        }
        if self.palm_gate.observe(palm.is_some()) {
            swap = Some(IconKind::Hand);
        }

        let fist = self.detectors.fist.detect(frame).first().copied();
        if let Some(b) = fist {
            b.outline(frame, FIST_OUTLINE, 3);
        }
        if self.fist_gate.observe(fist.is_some()) {
            swap = Some(IconKind::ThumbDown);
        }

        let changed = swap.is_some();
        if let Some(kind) = swap {
            self.current = kind;
        }
        AvatarOutcome {
            icon: self.current,
            changed,
            state: self.state,
        }
    }
}
