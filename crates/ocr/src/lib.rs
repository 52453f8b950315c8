pub mod extract;
pub mod pipeline;
pub mod preprocess;
pub mod recognizer;
pub mod types;

pub use extract::{Extractor, CONFIDENCE_FLOOR};
pub use pipeline::{MonitorPipeline, PipelineError, PipelineOutput};
pub use preprocess::{binarize_for_ocr, encode_png, PreprocessError};
pub use recognizer::{MockRecognizer, OcrError, Recognizer, NUMERIC_ALLOWLIST};
pub use types::{BoundingBox, Reading, TextFragment};
