use thiserror::Error;

#[derive(Debug, Error)]
pub enum VidgetsError {
    #[error("camera initialization failed: {0}")]
    CameraInit(String),

    #[error("icon load failed for {path}: {reason}")]
    IconLoad { path: String, reason: String },

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VidgetsError>;

#[cfg(feature = "camera-nokhwa")]
impl From<nokhwa::NokhwaError> for VidgetsError {
    fn from(err: nokhwa::NokhwaError) -> Self {
        VidgetsError::CameraInit(err.to_string())
    }
}
