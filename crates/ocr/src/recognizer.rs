use thiserror::Error;

use crate::types::TextFragment;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Tesseract not available, build with the `tesseract` feature")]
    NotAvailable,
}

/// Characters a backend is allowed to emit. Monitor displays only show
/// numbers; restricting the alphabet this far materially changes what the
/// engine reads off a blurry seven-segment panel.
pub const NUMERIC_ALLOWLIST: &str = "0123456789. ";

/// Abstraction over a text-recognition backend.
///
/// Implementations accept encoded PNG/JPEG bytes and return every text
/// region they detected, each with its bounding box and a confidence in
/// 0.0..=1.0. Fragment order is whatever the engine emits; callers must not
/// assume a spatial ordering.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<Vec<TextFragment>, OcrError>;
}

impl Recognizer for Box<dyn Recognizer> {
    fn recognize(&self, image_bytes: &[u8]) -> Result<Vec<TextFragment>, OcrError> {
        (**self).recognize(image_bytes)
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set fragment list, useful for exercising the extraction
/// pipeline without an OCR engine installed.
pub struct MockRecognizer {
    pub fragments: Vec<TextFragment>,
}

impl MockRecognizer {
    pub fn new(fragments: Vec<TextFragment>) -> Self {
        Self { fragments }
    }

    /// A recognizer that never finds any text.
    pub fn empty() -> Self {
        Self { fragments: Vec::new() }
    }
}

impl Recognizer for MockRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<Vec<TextFragment>, OcrError> {
        Ok(self.fragments.clone())
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrError, Recognizer, NUMERIC_ALLOWLIST};
    use crate::types::{BoundingBox, TextFragment};
    use leptess::{LepTess, Variable};

    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self { data_path, lang: lang.to_string() }
        }
    }

    impl Recognizer for TesseractRecognizer {
        fn recognize(&self, image_bytes: &[u8]) -> Result<Vec<TextFragment>, OcrError> {
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_variable(Variable::TesseditCharWhitelist, NUMERIC_ALLOWLIST)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(image_bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            let tsv = lt
                .get_tsv_text(0)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            Ok(parse_tsv(&tsv))
        }
    }

    /// Parse Tesseract TSV output into word-level fragments.
    ///
    /// Columns: level page block par line word left top width height conf text.
    /// Word rows carry level 5 and a confidence in 0..100.
    fn parse_tsv(tsv: &str) -> Vec<TextFragment> {
        tsv.lines()
            .filter_map(|line| {
                let cols: Vec<&str> = line.split('\t').collect();
                if cols.len() < 12 || cols[0] != "5" {
                    return None;
                }
                let left: u32 = cols[6].parse().ok()?;
                let top: u32 = cols[7].parse().ok()?;
                let width: u32 = cols[8].parse().ok()?;
                let height: u32 = cols[9].parse().ok()?;
                let conf: f32 = cols[10].parse().ok()?;
                Some(TextFragment::new(
                    BoundingBox::new(left, top, width, height),
                    cols[11],
                    conf / 100.0,
                ))
            })
            .collect()
    }

}
