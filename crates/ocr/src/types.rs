use serde::{Deserialize, Serialize};

/// Axis-aligned region of the image a piece of text was read from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// A single piece of text located by the recognizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextFragment {
    pub bbox: BoundingBox,
    pub text: String,
    /// Recognizer confidence (0.0 = guessed, 1.0 = certain).
    pub confidence: f32,
}

impl TextFragment {
    pub fn new(bbox: BoundingBox, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            bbox,
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// The six values shown on an air-quality monitor display.
///
/// Every field is the raw recognized string; slots with no surviving
/// fragment hold `"0"`. No numeric validation is applied downstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reading {
    pub aqi: String,
    pub pm25: String,
    pub pm10: String,
    pub co2: String,
    pub temp: String,
    pub humidity: String,
}

impl Default for Reading {
    fn default() -> Self {
        Self {
            aqi: "0".into(),
            pm25: "0".into(),
            pm10: "0".into(),
            co2: "0".into(),
            temp: "0".into(),
            humidity: "0".into(),
        }
    }
}
