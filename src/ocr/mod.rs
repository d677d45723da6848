mod engine;

use anyhow::Result;
use image::RgbaImage;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub use engine::{
    TesseractEngine, list_tesseract_languages, normalize, normalize_buffer, normalized,
};
pub(crate) use engine::{DEFAULT_COMMAND, DEFAULT_THRESHOLD};

/// Axis-aligned box in source pixel coordinates, `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BBox {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl BBox {
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn is_valid(&self) -> bool {
        self.x0 <= self.x1 && self.y0 <= self.y1
    }

    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }
}

/// One recognized unit of text, usually a line as reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextFragment {
    pub text: String,
    pub bbox: BBox,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, bbox: BBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// What the engine hands back: its own transcript plus unordered fragments.
#[derive(Debug, Clone, Default)]
pub struct OcrOutput {
    pub transcript: String,
    pub fragments: Vec<TextFragment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSegMode {
    /// Automatic column/paragraph detection.
    Auto,
    /// Treat the region as one uniform block of text.
    SingleBlock,
    Custom(u32),
}

impl PageSegMode {
    pub fn as_psm(&self) -> u32 {
        match self {
            PageSegMode::Auto => 3,
            PageSegMode::SingleBlock => 6,
            PageSegMode::Custom(value) => *value,
        }
    }

    pub fn from_psm(value: u32) -> Self {
        match value {
            3 => PageSegMode::Auto,
            6 => PageSegMode::SingleBlock,
            other => PageSegMode::Custom(other),
        }
    }
}

/// Per-request recognition configuration. Built fresh for every call so two
/// recognitions never share mutable engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizeParams {
    pub languages: String,
    pub psm: PageSegMode,
    pub whitelist: Option<String>,
    pub preserve_interword_spaces: bool,
}

/// Progress side channel, called with a value in `[0, 1]`.
pub type ProgressFn = Arc<dyn Fn(f32) + Send + Sync>;

pub fn no_progress() -> ProgressFn {
    Arc::new(|_| {})
}

pub type OcrFuture = Pin<Box<dyn Future<Output = Result<OcrOutput>> + Send>>;

pub trait OcrEngine: Send + Sync {
    fn recognize(
        &self,
        image: RgbaImage,
        params: RecognizeParams,
        progress: ProgressFn,
    ) -> OcrFuture;
}
