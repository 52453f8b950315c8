use crate::types::{Reading, TextFragment};

/// Fragments at or below this confidence are discarded as noise. The bar is
/// deliberately low: monitor-display photos are poor OCR input, and a missed
/// digit costs more than an occasional stray one.
pub const CONFIDENCE_FLOOR: f32 = 0.1;

pub struct Extractor;

impl Extractor {
    /// Map recognized fragments onto the six monitor fields.
    ///
    /// Assignment is positional: the first surviving fragment becomes the
    /// AQI, the second PM2.5, and so on; slots past the end default to "0".
    /// There is no semantic matching of text to field, so a display that
    /// emits its values in a different order lands them in the wrong slots.
    /// Known limitation, kept for compatibility with existing clients.
    pub fn extract(fragments: &[TextFragment]) -> Reading {
        let mut values = fragments
            .iter()
            .filter(|f| f.confidence > CONFIDENCE_FLOOR)
            .map(|f| f.text.trim())
            .filter(|t| !t.is_empty());

        Reading {
            aqi: next_or_zero(&mut values),
            pm25: next_or_zero(&mut values),
            pm10: next_or_zero(&mut values),
            co2: next_or_zero(&mut values),
            temp: next_or_zero(&mut values),
            humidity: next_or_zero(&mut values),
        }
    }
}

fn next_or_zero<'a>(values: &mut impl Iterator<Item = &'a str>) -> String {
    values.next().map_or_else(|| "0".to_string(), str::to_string)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
