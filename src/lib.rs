use anyhow::{Result, anyhow};
use std::path::Path;
use tracing::debug;

pub mod error;
pub mod export;
pub mod extract;
pub mod logging;
pub mod ocr;
pub mod region;
pub mod settings;
pub mod table;
mod test_util;

pub use error::{ExtractError, InputError};
pub use export::Format;
pub use extract::{ExtractRequest, Extractor};
pub use ocr::{
    BBox, OcrEngine, OcrOutput, PageSegMode, RecognizeParams, TesseractEngine, TextFragment,
};
pub use region::{CropRect, Size};
pub use table::{Extraction, Mode, RowOrder, Table, TableOptions};

/// How the crop region is chosen when running from the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropChoice {
    None,
    Explicit(CropRect),
    /// Half-width 16:9 rectangle in the middle of the image.
    Centered,
    Full,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub image_path: Option<String>,
    pub mode: Mode,
    pub crop: CropChoice,
    pub displayed: Option<Size>,
    pub format: Format,
    pub languages: Option<String>,
    pub tolerance: Option<u32>,
    pub sort_rows: bool,
    pub no_binarize: bool,
    pub settings_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub extraction: Extraction,
    pub rendered: String,
}

const CENTER_CROP_ASPECT: f64 = 16.0 / 9.0;

pub async fn run(config: Config) -> Result<RunOutput> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let mut settings = settings::load_settings(settings_path)?;
    if let Some(languages) = config.languages.as_deref() {
        if languages.trim().is_empty() {
            return Err(anyhow!("ocr languages is empty"));
        }
        settings.ocr_languages = languages.trim().to_string();
    }
    if let Some(tolerance) = config.tolerance {
        settings.row_tolerance = tolerance;
    }
    if config.sort_rows {
        settings.row_order = RowOrder::TopEdge;
    }
    if config.no_binarize {
        settings.binarize = false;
    }

    let image = match config.image_path.as_deref() {
        Some(path) => Some(extract::load_image_file(Path::new(path)).map_err(ExtractError::from)?),
        None => None,
    };
    let displayed = config.displayed.or_else(|| {
        image
            .as_ref()
            .map(|image| Size::new(image.width() as f64, image.height() as f64))
    });
    let crop = match (config.crop, displayed) {
        (CropChoice::Explicit(rect), _) => Some(rect),
        (CropChoice::Centered, Some(display)) => {
            Some(CropRect::centered(display, CENTER_CROP_ASPECT))
        }
        (CropChoice::Full, Some(display)) => Some(CropRect::full(display)),
        _ => None,
    };
    debug!("run: crop={:?} displayed={:?}", crop, displayed);

    let engine = TesseractEngine::new(settings.ocr_command.clone());
    let extractor = Extractor::new(engine, settings);
    let progress: ocr::ProgressFn = std::sync::Arc::new(|value: f32| {
        debug!("ocr progress: {}%", (value * 100.0).round() as u32);
    });
    let extraction = extractor
        .extract(
            ExtractRequest {
                image,
                displayed,
                crop,
                mode: config.mode,
            },
            progress,
        )
        .await?;
    let rendered = export::render(&extraction, config.format)?;
    Ok(RunOutput {
        extraction,
        rendered,
    })
}
