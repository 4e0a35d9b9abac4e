pub mod avatar;
pub mod board;
#[cfg(feature = "camera-nokhwa")]
pub mod camera;
pub mod config;
pub mod debounce;
pub mod detect;
pub mod draw;
pub mod error;
pub mod feed;
pub mod store;
pub mod types;
pub mod vision;

pub use error::{Result, VidgetsError};
