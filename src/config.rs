use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::avatar::{self, IconPaths};
use crate::vision::HsvBand;
use crate::Result;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub avatar: AvatarConfig,
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CameraConfig {
    /// Device index passed to the capture backend.
    #[serde(default)]
    pub index: u32,
    /// Mirror the frame for the whiteboard so drawing feels like a mirror.
    #[serde(default = "default_mirror_board")]
    pub mirror_board: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AvatarConfig {
    /// Frames a gesture must persist before the icon swaps.
    #[serde(default = "default_gesture_frames")]
    pub gesture_frames: u32,
    /// Faceless frames before the avatar falls asleep.
    #[serde(default = "default_sleep_frames")]
    pub sleep_frames: u32,
    /// Directory holding the five icon images.
    #[serde(default = "default_icon_dir")]
    pub icon_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BoardConfig {
    /// HSV band of the tracked pen marker.
    #[serde(default = "default_pen_band")]
    pub pen_band: HsvBand,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_mirror_board() -> bool { true }
fn default_gesture_frames() -> u32 { avatar::GESTURE_FRAMES }
fn default_sleep_frames() -> u32 { avatar::SLEEP_FRAMES }
fn default_icon_dir() -> String { "icons".to_string() }
fn default_pen_band() -> HsvBand { HsvBand::BLUE }
fn default_jpeg_quality() -> u8 { 80 }
fn default_store_path() -> String { "db.sqlite".to_string() }

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            mirror_board: default_mirror_board(),
        }
    }
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            gesture_frames: default_gesture_frames(),
            sleep_frames: default_sleep_frames(),
            icon_dir: default_icon_dir(),
        }
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            pen_band: default_pen_band(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl AvatarConfig {
    pub fn icon_paths(&self) -> IconPaths {
        let dir = Path::new(&self.icon_dir);
        IconPaths {
            avatar: dir.join("avatar.png"),
            sleep: dir.join("sleep.png"),
            hand: dir.join("hand.png"),
            thumb_up: dir.join("thumbup.png"),
            thumb_down: dir.join("thumbdown.png"),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!(
                    "config {} not loaded ({err}), using defaults",
                    path.as_ref().display()
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.camera.index, 0);
        assert!(config.camera.mirror_board);
        assert_eq!(config.avatar.gesture_frames, 15);
        assert_eq!(config.avatar.sleep_frames, 150);
        assert_eq!(config.board.pen_band, HsvBand::BLUE);
        assert_eq!(config.output.jpeg_quality, 80);
        assert_eq!(config.store.path, "db.sqlite");
    }

    #[test]
    fn partial_toml_overrides_selected_fields() {
        let config: Config = toml::from_str(
            r#"
            [camera]
            index = 2

            [board]
            pen_band = { lower = [40, 60, 60], upper = [80, 255, 255] }

            [output]
            jpeg_quality = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.camera.index, 2);
        assert!(config.camera.mirror_board);
        assert_eq!(config.board.pen_band.lower, [40, 60, 60]);
        assert_eq!(config.output.jpeg_quality, 60);
        assert_eq!(config.avatar.gesture_frames, 15);
    }

    #[test]
    fn icon_paths_live_under_the_icon_dir() {
        let avatar = AvatarConfig::default();
        assert_eq!(avatar.icon_paths().sleep, Path::new("icons").join("sleep.png"));
    }
}
