use image::RgbaImage;
use tracing::debug;

use crate::error::InputError;

/// Width and height of the image as the user sees it on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_positive(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Crop rectangle in displayed (possibly scaled) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn full(display: Size) -> Self {
        Self::new(0.0, 0.0, display.width, display.height)
    }

    /// Half the displayed width at the given aspect ratio, centred.
    pub fn centered(display: Size, aspect: f64) -> Self {
        let mut width = display.width * 0.5;
        let mut height = if aspect > 0.0 { width / aspect } else { width };
        if height > display.height {
            height = display.height;
            if aspect > 0.0 {
                width = height * aspect;
            }
        }
        Self::new(
            (display.width - width) / 2.0,
            (display.height - height) / 2.0,
            width,
            height,
        )
    }

    /// Parses `x,y,width,height`. Every value must be finite.
    pub fn parse(value: &str) -> Option<Self> {
        let nums = value
            .split(',')
            .map(|part| part.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
            .collect::<Option<Vec<_>>>()?;
        match nums.as_slice() {
            [x, y, w, h] => Some(Self::new(*x, *y, *w, *h)),
            _ => None,
        }
    }

    fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|value| value.is_finite())
    }
}

/// Source-pixel rectangle after scaling, already clipped to the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Maps a displayed-coordinate crop onto native pixels.
pub fn scale_crop(
    native: (u32, u32),
    displayed: Size,
    crop: Option<CropRect>,
) -> Result<PixelRect, InputError> {
    let crop = crop.ok_or(InputError::NoCropRegion)?;
    if !crop.is_finite() {
        return Err(InputError::InvalidCrop);
    }
    if !displayed.is_positive() {
        return Err(InputError::InvalidDisplaySize);
    }
    let (native_w, native_h) = native;
    let scale_x = native_w as f64 / displayed.width;
    let scale_y = native_h as f64 / displayed.height;

    let x0 = (crop.x * scale_x).floor().max(0.0);
    let y0 = (crop.y * scale_y).floor().max(0.0);
    let x1 = (crop.x * scale_x + (crop.width * scale_x).trunc()).min(native_w as f64);
    let y1 = (crop.y * scale_y + (crop.height * scale_y).trunc()).min(native_h as f64);

    let width = (x1 - x0).max(0.0) as u32;
    let height = (y1 - y0).max(0.0) as u32;
    if width == 0 || height == 0 {
        return Err(InputError::EmptyRegion { width, height });
    }
    Ok(PixelRect {
        x: x0 as u32,
        y: y0 as u32,
        width,
        height,
    })
}

pub fn extract_region(
    source: &RgbaImage,
    displayed: Size,
    crop: Option<CropRect>,
) -> Result<RgbaImage, InputError> {
    let rect = scale_crop(source.dimensions(), displayed, crop)?;
    debug!(
        "region: {}x{} at ({}, {})",
        rect.width, rect.height, rect.x, rect.y
    );
    Ok(image::imageops::crop_imm(source, rect.x, rect.y, rect.width, rect.height).to_image())
}
