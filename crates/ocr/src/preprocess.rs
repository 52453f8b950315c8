use image::{DynamicImage, GrayImage, Luma};
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Denoising filter strength.
const NLM_STRENGTH: f32 = 10.0;
/// Edge length of the patch compared during denoising.
const NLM_TEMPLATE: u32 = 7;
/// Edge length of the window candidate patches are drawn from.
const NLM_SEARCH: u32 = 21;
/// Neighbourhood edge length for adaptive thresholding.
const THRESH_BLOCK: u32 = 11;
/// Constant subtracted from the local mean before comparison.
const THRESH_C: f32 = 2.0;

/// Process raw image bytes (JPEG / PNG / WEBP / ...) into a binary (0/255)
/// single-channel image tuned for digit recognition on monitor displays.
///
/// The pipeline is fixed: grayscale, non-local-means denoising, adaptive
/// Gaussian thresholding, then a 2x2 morphological closing to heal small
/// gaps inside character strokes. Output dimensions always match the
/// decoded input.
pub fn binarize_for_ocr(data: &[u8]) -> Result<GrayImage, PreprocessError> {
    let img = image::load_from_memory(data)?;
    Ok(binarize(img))
}

fn binarize(img: DynamicImage) -> GrayImage {
    let gray = img.to_luma8();
    let denoised = nl_means_denoise(&gray);
    let thresholded = adaptive_gaussian_threshold(&denoised);
    close_2x2(&thresholded)
}

/// Encode a processed image as PNG bytes.
pub fn encode_png(img: &GrayImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}

// ── Non-local means ───────────────────────────────────────────────────────────

/// Non-local-means denoising over a grayscale image.
///
/// Each output pixel is a weighted average of every pixel in the surrounding
/// search window, weighted by how similar their template patches are. The
/// per-offset patch distances are computed with an integral image of squared
/// differences, which keeps the cost at one image pass per search offset.
fn nl_means_denoise(src: &GrayImage) -> GrayImage {
    let (w, h) = src.dimensions();
    let (wi, hi) = (w as i64, h as i64);
    let tr = (NLM_TEMPLATE / 2) as i64;
    let sr = (NLM_SEARCH / 2) as i64;
    let norm = (NLM_TEMPLATE * NLM_TEMPLATE) as f32 * NLM_STRENGTH * NLM_STRENGTH;

    // Border handling is clamp-to-edge throughout.
    let px = |x: i64, y: i64| -> f32 {
        let cx = x.clamp(0, wi - 1) as u32;
        let cy = y.clamp(0, hi - 1) as u32;
        src.get_pixel(cx, cy)[0] as f32
    };

    let stride = (wi + 1) as usize;
    let mut sat = vec![0.0f64; stride * (hi + 1) as usize];
    let mut num = vec![0.0f32; (w * h) as usize];
    let mut den = vec![0.0f32; (w * h) as usize];

    for dy in -sr..=sr {
        for dx in -sr..=sr {
            // Summed-area table of squared differences against the shifted image.
            for y in 0..hi {
                for x in 0..wi {
                    let d = px(x, y) - px(x + dx, y + dy);
                    let i = (y as usize + 1) * stride + x as usize + 1;
                    sat[i] = (d * d) as f64 + sat[i - 1] + sat[i - stride] - sat[i - stride - 1];
                }
            }
            let patch_ssd = |x: i64, y: i64| -> f64 {
                let x0 = (x - tr).clamp(0, wi - 1) as usize;
                let y0 = (y - tr).clamp(0, hi - 1) as usize;
                let x1 = (x + tr).clamp(0, wi - 1) as usize;
                let y1 = (y + tr).clamp(0, hi - 1) as usize;
                sat[(y1 + 1) * stride + x1 + 1]
                    - sat[y0 * stride + x1 + 1]
                    - sat[(y1 + 1) * stride + x0]
                    + sat[y0 * stride + x0]
            };
            for y in 0..hi {
                for x in 0..wi {
                    let weight = (-(patch_ssd(x, y) as f32) / norm).exp();
                    let i = (y * wi + x) as usize;
                    num[i] += weight * px(x + dx, y + dy);
                    den[i] += weight;
                }
            }
        }
    }

    GrayImage::from_fn(w, h, |x, y| {
        let i = (y as u64 * w as u64 + x as u64) as usize;
        Luma([(num[i] / den[i]).round().clamp(0.0, 255.0) as u8])
    })
}

// ── Adaptive threshold ────────────────────────────────────────────────────────

/// Binarize against a Gaussian-weighted local mean: a pixel becomes white
/// when it sits above the mean of its 11x11 neighbourhood minus a small
/// constant. Robust to the uneven backlight of LCD monitor photos, where a
/// single global threshold washes out half the display.
fn adaptive_gaussian_threshold(src: &GrayImage) -> GrayImage {
    // Sigma for an 11-pixel kernel, same derivation OpenCV applies when
    // building Gaussian kernels from a window size.
    let sigma = 0.3 * ((THRESH_BLOCK as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let local_mean = imageproc::filter::gaussian_blur_f32(src, sigma);

    GrayImage::from_fn(src.width(), src.height(), |x, y| {
        let v = src.get_pixel(x, y)[0] as f32;
        let mean = local_mean.get_pixel(x, y)[0] as f32;
        Luma([if v > mean - THRESH_C { 255 } else { 0 }])
    })
}

// ── Morphological closing ─────────────────────────────────────────────────────

/// Closing (dilate then erode) with a 2x2 structuring element.
///
/// `imageproc::morphology` only offers odd-sized square kernels, and the
/// 2x2 element matters: a 3x3 close visibly thickens thin seven-segment
/// strokes, while 2x2 only bridges single-pixel breaks.
fn close_2x2(src: &GrayImage) -> GrayImage {
    erode_2x2(&dilate_2x2(src))
}

fn dilate_2x2(src: &GrayImage) -> GrayImage {
    window_2x2(src, u8::max)
}

fn erode_2x2(src: &GrayImage) -> GrayImage {
    window_2x2(src, u8::min)
}

fn window_2x2(src: &GrayImage, reduce: fn(u8, u8) -> u8) -> GrayImage {
    let (w, h) = src.dimensions();
    let px = |x: i64, y: i64| -> u8 {
        let cx = x.clamp(0, w as i64 - 1) as u32;
        let cy = y.clamp(0, h as i64 - 1) as u32;
        src.get_pixel(cx, cy)[0]
    };
    // 2x2 element anchored at its bottom-right cell, so the neighbourhood
    // of (x, y) is {x-1, x} x {y-1, y}.
    GrayImage::from_fn(w, h, |x, y| {
        let (x, y) = (x as i64, y as i64);
        let a = reduce(px(x - 1, y - 1), px(x, y - 1));
        let b = reduce(px(x - 1, y), px(x, y));
        Luma([reduce(a, b)])
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, Luma};

    fn solid_gray(width: u32, height: u32, value: u8) -> GrayImage {
        ImageBuffer::from_fn(width, height, |_, _| Luma([value]))
    }

    fn png_bytes(img: &GrayImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn binarize_preserves_dimensions_and_is_two_level() {
        let img: GrayImage =
            ImageBuffer::from_fn(24, 16, |x, y| Luma([((x * 7 + y * 11) % 256) as u8]));
        let result = binarize_for_ocr(&png_bytes(&img)).unwrap();
        assert_eq!(result.dimensions(), (24, 16));
        assert!(result.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn binarize_rejects_garbage_bytes() {
        let err = binarize_for_ocr(b"definitely not an image").unwrap_err();
        assert!(matches!(err, PreprocessError::Load(_)));
    }

    #[test]
    fn encode_png_produces_png_header() {
        let img = solid_gray(4, 4, 100);
        let bytes = encode_png(&img).unwrap();
        // PNG magic bytes: 0x89 0x50 0x4E 0x47
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[test]
    fn denoise_leaves_uniform_image_unchanged() {
        // Every patch distance is zero, so the weighted average is the
        // original value everywhere.
        let img = solid_gray(12, 12, 137);
        let result = nl_means_denoise(&img);
        assert!(result.pixels().all(|p| p[0] == 137));
    }

    #[test]
    fn denoise_preserves_dimensions() {
        let img = solid_gray(9, 5, 40);
        assert_eq!(nl_means_denoise(&img).dimensions(), (9, 5));
    }

    #[test]
    fn threshold_marks_uniform_image_white() {
        // A flat image sits above its own local mean minus the offset.
        let img = solid_gray(16, 16, 90);
        let result = adaptive_gaussian_threshold(&img);
        assert!(result.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn threshold_darkens_pixels_below_local_mean() {
        let mut img = solid_gray(16, 16, 200);
        img.put_pixel(8, 8, Luma([10]));
        let result = adaptive_gaussian_threshold(&img);
        assert_eq!(result.get_pixel(8, 8)[0], 0);
        assert_eq!(result.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn closing_fills_single_pixel_hole() {
        let mut img = solid_gray(8, 8, 255);
        img.put_pixel(4, 4, Luma([0]));
        let result = close_2x2(&img);
        assert_eq!(result.get_pixel(4, 4)[0], 255);
    }

    #[test]
    fn closing_keeps_large_dark_regions() {
        // A 4x4 dark block is far bigger than the structuring element and
        // must survive closing.
        let mut img = solid_gray(12, 12, 255);
        for y in 4..8 {
            for x in 4..8 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        let result = close_2x2(&img);
        assert_eq!(result.get_pixel(5, 5)[0], 0);
    }
}
