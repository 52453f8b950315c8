use thiserror::Error;

use crate::extract::Extractor;
use crate::preprocess::{self, PreprocessError};
use crate::recognizer::{OcrError, Recognizer};
use crate::types::{Reading, TextFragment};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
}

/// The result of processing one monitor photo.
#[derive(Debug)]
pub struct PipelineOutput {
    /// Field values mapped from the recognizer output.
    pub reading: Reading,
    /// The binarized image, PNG-encoded for diagnostic display.
    pub processed_png: Vec<u8>,
    /// Raw recognizer output, kept for logging and debugging.
    pub fragments: Vec<TextFragment>,
}

/// Orchestrates: binarize -> PNG-encode -> recognize -> map fields.
///
/// Holds no per-request state; one pipeline is constructed at startup and
/// shared read-only across requests. Processing is CPU-bound and blocking,
/// so async callers should run it on a blocking thread.
pub struct MonitorPipeline<R: Recognizer> {
    recognizer: R,
}

impl<R: Recognizer> MonitorPipeline<R> {
    pub fn new(recognizer: R) -> Self {
        Self { recognizer }
    }

    /// Process raw uploaded bytes (from camera capture or file read).
    pub fn process_bytes(&self, data: &[u8]) -> Result<PipelineOutput, PipelineError> {
        let processed = preprocess::binarize_for_ocr(data)?;
        let processed_png = preprocess::encode_png(&processed)?;
        let fragments = self.recognizer.recognize(&processed_png)?;
        let reading = Extractor::extract(&fragments);

        Ok(PipelineOutput { reading, processed_png, fragments })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
