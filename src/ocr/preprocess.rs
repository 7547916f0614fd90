use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};

use crate::config::OcrConfig;
use crate::error::Result;

/// Decodes a screenshot and prepares it for text recognition.
///
/// Steps run in a fixed order: upscale, grayscale, contrast stretch, sharpen.
/// Upscaling first gives the later filters more pixels to work with, and
/// stretching before sharpening keeps already-saturated highlights from
/// being pushed further.
///
/// The input is assumed to already be cropped to a single meter panel.
pub fn normalize_for_ocr(bytes: &[u8], config: &OcrConfig) -> Result<GrayImage> {
    let img = image::load_from_memory(bytes)?;

    let upscaled = upscale_to_width(img, config.target_width);
    let gray = upscaled.to_luma8();
    let stretched = stretch_contrast(&gray);
    let sharpened =
        image::imageops::unsharpen(&stretched, config.sharpen_sigma, config.sharpen_threshold);

    Ok(sharpened)
}

/// Upscaled images are never taller than this.
pub const MAX_UPSCALED_HEIGHT: u32 = 8_000;

/// Scales the image up to `target_width`, preserving aspect ratio.
///
/// Images already at or above the target width are returned untouched. For
/// narrow, tall crops the scale is reduced so the result stays within
/// `MAX_UPSCALED_HEIGHT`.
pub fn upscale_to_width(img: DynamicImage, target_width: u32) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 || width >= target_width {
        return img;
    }

    let scale = (target_width as f64 / width as f64)
        .min(MAX_UPSCALED_HEIGHT as f64 / height as f64);
    if scale <= 1.0 {
        return img;
    }

    let new_width = ((width as f64 * scale).round() as u32).clamp(1, target_width);
    let new_height = ((height as f64 * scale).round() as u32).clamp(1, MAX_UPSCALED_HEIGHT);
    img.resize_exact(new_width, new_height, FilterType::Lanczos3)
}

/// Linearly maps the darkest pixel to 0 and the brightest to 255.
///
/// Meter overlays are light text on a dark, low-contrast background, so this
/// spreads the few used intensity levels across the full range. A flat image
/// has nothing to stretch and is returned as-is.
pub fn stretch_contrast(img: &GrayImage) -> GrayImage {
    let (min, max) = img
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));

    if max <= min {
        return img.clone();
    }

    let range = (max - min) as f32;
    let mut output = GrayImage::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        let value = ((pixel[0] - min) as f32 * 255.0 / range).round() as u8;
        output.put_pixel(x, y, Luma([value]));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use image::{ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(img: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_upscale_preserves_aspect_ratio() {
        let img = DynamicImage::new_rgba8(400, 100);
        let scaled = upscale_to_width(img, 2000);
        assert_eq!((scaled.width(), scaled.height()), (2000, 500));
    }

    #[test]
    fn test_upscale_never_shrinks() {
        let img = DynamicImage::new_rgba8(2400, 300);
        let scaled = upscale_to_width(img, 2000);
        assert_eq!((scaled.width(), scaled.height()), (2400, 300));
    }

    #[test]
    fn test_upscale_height_is_capped_for_tall_crops() {
        let img = DynamicImage::new_luma8(10, 5000);
        let scaled = upscale_to_width(img, 2000);
        assert_eq!((scaled.width(), scaled.height()), (16, MAX_UPSCALED_HEIGHT));
    }

    #[test]
    fn test_upscale_skips_crops_already_at_height_cap() {
        let img = DynamicImage::new_luma8(10, 9000);
        let scaled = upscale_to_width(img, 2000);
        assert_eq!((scaled.width(), scaled.height()), (10, 9000));
    }

    #[test]
    fn test_stretch_contrast_full_range() {
        let mut img = GrayImage::new(3, 1);
        img.put_pixel(0, 0, Luma([40]));
        img.put_pixel(1, 0, Luma([60]));
        img.put_pixel(2, 0, Luma([80]));

        let result = stretch_contrast(&img);

        assert_eq!(result.get_pixel(0, 0)[0], 0);
        assert_eq!(result.get_pixel(1, 0)[0], 128);
        assert_eq!(result.get_pixel(2, 0)[0], 255);
    }

    #[test]
    fn test_stretch_contrast_flat_image_unchanged() {
        let img = GrayImage::from_pixel(4, 4, Luma([90]));
        let result = stretch_contrast(&img);
        assert!(result.pixels().all(|p| p[0] == 90));
    }

    #[test]
    fn test_normalize_outputs_grayscale_at_target_width() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_fn(200, 50, |x, _| {
            if x % 20 < 10 {
                Rgba([230, 230, 230, 255])
            } else {
                Rgba([20, 20, 30, 255])
            }
        });
        let config = OcrConfig {
            target_width: 800,
            ..OcrConfig::default()
        };

        let result = normalize_for_ocr(&png_bytes(&img), &config).unwrap();

        assert_eq!(result.dimensions(), (800, 200));
    }

    #[test]
    fn test_normalize_rejects_garbage_bytes() {
        let err = normalize_for_ocr(b"definitely not an image", &OcrConfig::default());
        assert!(matches!(err, Err(PipelineError::Preprocess(_))));
    }
}
