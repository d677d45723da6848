use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractError>;

/// Problems with what the caller handed in. Reported before any OCR runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("no image selected")]
    NoImage,
    #[error("no crop region selected")]
    NoCropRegion,
    #[error("displayed image size must be positive")]
    InvalidDisplaySize,
    #[error("crop region coordinates must be finite")]
    InvalidCrop,
    #[error("crop region resolves to an empty area ({width}x{height})")]
    EmptyRegion { width: u32, height: u32 },
    #[error("failed to decode image: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Input(#[from] InputError),
    /// The OCR engine failed to start, load language data or recognize.
    /// No partial output survives this.
    #[error("ocr engine failed: {0:#}")]
    Adapter(anyhow::Error),
}
