use image::RgbaImage;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ExtractError, InputError, Result};
use crate::ocr::{OcrEngine, ProgressFn, RecognizeParams, normalize};
use crate::region::{CropRect, Size, extract_region};
use crate::settings::Settings;
use crate::table::{Extraction, Mode, reconstruct};

/// Everything one user-initiated extraction needs. Owned per request.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub image: Option<RgbaImage>,
    /// Size the image is displayed at; `None` means native size.
    pub displayed: Option<Size>,
    pub crop: Option<CropRect>,
    pub mode: Mode,
}

pub struct Extractor<E: OcrEngine> {
    engine: E,
    settings: Settings,
}

impl<E: OcrEngine> Extractor<E> {
    pub fn new(engine: E, settings: Settings) -> Self {
        Self { engine, settings }
    }

    pub fn recognize_params(&self, mode: Mode) -> RecognizeParams {
        let psm = match mode {
            Mode::Text => self.settings.text_psm,
            Mode::Table => self.settings.table_psm,
        };
        RecognizeParams {
            languages: self.settings.ocr_languages.clone(),
            psm,
            whitelist: self.settings.ocr_whitelist.clone(),
            preserve_interword_spaces: self.settings.preserve_interword_spaces,
        }
    }

    /// Crops, binarizes, recognizes and reconstructs. Dropping the returned
    /// future abandons the request without touching later ones.
    pub async fn extract(
        &self,
        request: ExtractRequest,
        progress: ProgressFn,
    ) -> Result<Extraction> {
        let image = request.image.ok_or(InputError::NoImage)?;
        let (native_w, native_h) = image.dimensions();
        let displayed = request
            .displayed
            .unwrap_or_else(|| Size::new(native_w as f64, native_h as f64));
        let mut region = extract_region(&image, displayed, request.crop)?;
        drop(image);

        if self.settings.binarize {
            normalize(&mut region, self.settings.threshold);
        }
        info!(
            "extract: mode={} region={}x{}",
            request.mode.as_str(),
            region.width(),
            region.height()
        );

        let params = self.recognize_params(request.mode);
        debug!("extract: psm={} languages={}", params.psm.as_psm(), params.languages);
        let output = self
            .engine
            .recognize(region, params, progress)
            .await
            .map_err(ExtractError::Adapter)?;
        info!("extract: {} fragments", output.fragments.len());

        Ok(reconstruct(
            output,
            request.mode,
            &self.settings.table_options(),
        ))
    }
}

pub fn load_image(bytes: &[u8]) -> std::result::Result<RgbaImage, InputError> {
    if bytes.is_empty() {
        return Err(InputError::NoImage);
    }
    let image =
        image::load_from_memory(bytes).map_err(|err| InputError::Decode(err.to_string()))?;
    Ok(image.to_rgba8())
}

pub fn load_image_file(path: &Path) -> std::result::Result<RgbaImage, InputError> {
    let bytes = std::fs::read(path).map_err(|_| InputError::NoImage)?;
    load_image(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{BBox, OcrFuture, OcrOutput, PageSegMode, TextFragment, no_progress};
    use crate::table::Table;
    use anyhow::anyhow;
    use image::Rgba;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct FakeEngine {
        output: OcrOutput,
        fail: bool,
        hang_once: Arc<AtomicBool>,
        seen: Arc<Mutex<Vec<(RecognizeParams, RgbaImage)>>>,
    }

    impl OcrEngine for FakeEngine {
        fn recognize(
            &self,
            image: RgbaImage,
            params: RecognizeParams,
            progress: ProgressFn,
        ) -> OcrFuture {
            self.seen.lock().unwrap().push((params, image));
            if self.hang_once.swap(false, Ordering::SeqCst) {
                return Box::pin(std::future::pending::<anyhow::Result<OcrOutput>>());
            }
            let output = self.output.clone();
            let fail = self.fail;
            Box::pin(async move {
                progress(0.0);
                if fail {
                    return Err(anyhow!("failed loading language 'eng'"));
                }
                progress(1.0);
                Ok(output)
            })
        }
    }

    fn fragments() -> Vec<TextFragment> {
        vec![
            TextFragment::new("B", BBox::new(20, 0, 30, 10)),
            TextFragment::new("A", BBox::new(0, 1, 10, 11)),
            TextFragment::new("C", BBox::new(0, 50, 10, 60)),
        ]
    }

    fn engine_with(fragments: Vec<TextFragment>) -> FakeEngine {
        FakeEngine {
            output: OcrOutput {
                transcript: "A B\nC\n".to_string(),
                fragments,
            },
            ..FakeEngine::default()
        }
    }

    fn request(mode: Mode) -> ExtractRequest {
        let mut image = RgbaImage::new(8, 8);
        for pixel in image.pixels_mut() {
            *pixel = Rgba([200, 190, 180, 255]);
        }
        ExtractRequest {
            image: Some(image),
            displayed: Some(Size::new(4.0, 4.0)),
            crop: Some(CropRect::new(1.0, 1.0, 2.0, 2.0)),
            mode,
        }
    }

    fn expect_table(extraction: Extraction) -> Table {
        match extraction {
            Extraction::Table(table) => table,
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn table_mode_reconstructs_rows() {
        let extractor = Extractor::new(engine_with(fragments()), Settings::default());
        let result = extractor
            .extract(request(Mode::Table), no_progress())
            .await
            .unwrap();
        let table = expect_table(result);
        assert_eq!(
            table.into_rows(),
            vec![
                vec!["A".to_string(), "B".to_string()],
                vec!["C".to_string()]
            ]
        );
    }

    #[tokio::test]
    async fn text_mode_returns_transcript() {
        let extractor = Extractor::new(engine_with(fragments()), Settings::default());
        let result = extractor
            .extract(request(Mode::Text), no_progress())
            .await
            .unwrap();
        assert_eq!(result, Extraction::Text("A B\nC\n".to_string()));
    }

    #[tokio::test]
    async fn passes_scaled_binarized_region_and_mode_params() {
        let engine = engine_with(fragments());
        let seen = engine.seen.clone();
        let extractor = Extractor::new(engine, Settings::default());
        extractor
            .extract(request(Mode::Table), no_progress())
            .await
            .unwrap();
        extractor
            .extract(request(Mode::Text), no_progress())
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        let (table_params, table_image) = &seen[0];
        assert_eq!(table_params.psm, PageSegMode::SingleBlock);
        assert!(table_params.preserve_interword_spaces);
        assert!(table_params.whitelist.is_some());
        assert_eq!(table_image.dimensions(), (4, 4));
        assert_eq!(table_image.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(seen[1].0.psm, PageSegMode::Auto);
    }

    #[tokio::test]
    async fn binarization_can_be_disabled() {
        let engine = engine_with(fragments());
        let seen = engine.seen.clone();
        let settings = Settings {
            binarize: false,
            ..Settings::default()
        };
        let extractor = Extractor::new(engine, settings);
        extractor
            .extract(request(Mode::Table), no_progress())
            .await
            .unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].1.get_pixel(0, 0).0, [200, 190, 180, 255]);
    }

    #[tokio::test]
    async fn empty_fragments_yield_no_table() {
        let extractor = Extractor::new(engine_with(Vec::new()), Settings::default());
        let result = extractor
            .extract(request(Mode::Table), no_progress())
            .await
            .unwrap();
        assert_eq!(result, Extraction::NoTable);
    }

    #[tokio::test]
    async fn missing_inputs_fail_before_recognition() {
        let engine = engine_with(fragments());
        let seen = engine.seen.clone();
        let extractor = Extractor::new(engine, Settings::default());

        let mut no_image = request(Mode::Table);
        no_image.image = None;
        let err = extractor.extract(no_image, no_progress()).await.unwrap_err();
        assert!(matches!(err, ExtractError::Input(InputError::NoImage)));

        let mut no_crop = request(Mode::Table);
        no_crop.crop = None;
        let err = extractor.extract(no_crop, no_progress()).await.unwrap_err();
        assert!(matches!(err, ExtractError::Input(InputError::NoCropRegion)));

        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn engine_failure_is_terminal() {
        let engine = FakeEngine {
            fail: true,
            ..engine_with(fragments())
        };
        let extractor = Extractor::new(engine, Settings::default());
        let err = extractor
            .extract(request(Mode::Table), no_progress())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Adapter(_)));
        assert!(err.to_string().contains("failed loading language"));
    }

    #[tokio::test]
    async fn reports_progress_through_observer() {
        let extractor = Extractor::new(engine_with(fragments()), Settings::default());
        let values = Arc::new(Mutex::new(Vec::new()));
        let sink = values.clone();
        let progress: ProgressFn = Arc::new(move |value| sink.lock().unwrap().push(value));
        extractor
            .extract(request(Mode::Table), progress)
            .await
            .unwrap();
        assert_eq!(*values.lock().unwrap(), vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn abandoned_request_does_not_affect_next_one() {
        let engine = engine_with(fragments());
        engine.hang_once.store(true, Ordering::SeqCst);
        let extractor = Extractor::new(engine, Settings::default());

        let abandoned = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            extractor.extract(request(Mode::Table), no_progress()),
        )
        .await;
        assert!(abandoned.is_err());

        let result = extractor
            .extract(request(Mode::Table), no_progress())
            .await
            .unwrap();
        assert_eq!(expect_table(result).row_count(), 2);
    }

    #[test]
    fn empty_bytes_mean_no_image() {
        assert_eq!(load_image(&[]).unwrap_err(), InputError::NoImage);
        assert!(matches!(
            load_image(b"not an image").unwrap_err(),
            InputError::Decode(_)
        ));
    }

    #[test]
    fn decodes_png_bytes() {
        let mut image = RgbaImage::new(3, 2);
        image.put_pixel(1, 1, Rgba([1, 2, 3, 4]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, image::ImageFormat::Png)
            .expect("encode");
        let decoded = load_image(bytes.get_ref()).unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(1, 1).0, [1, 2, 3, 4]);
    }
}
