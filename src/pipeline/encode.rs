//! Image normalisation and PNG encoding.
//!
//! Gray and RGB images (with or without alpha) are written exactly as
//! stored. CMYK and CMYK+alpha are converted to plain RGB first. PNG output
//! is deterministic: re-running an extraction produces byte-identical files.

use crate::pipeline::backend::{ExtractedImage, InvalidSamples, PixelLayout};
use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use std::io::Cursor;
use tracing::debug;

/// Naive CMYK → RGB: `r = (255 - c)(255 - k) / 255`, likewise for g and b.
pub fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let ink = |v: u8| ((255 - v as u16) * (255 - k as u16) / 255) as u8;
    [ink(c), ink(m), ink(y)]
}

/// Turn an [`ExtractedImage`] into a `DynamicImage` ready for saving,
/// converting subtractive layouts to RGB.
pub fn normalize(image: ExtractedImage) -> Result<DynamicImage, InvalidSamples> {
    let (width, height, layout) = (image.width(), image.height(), image.layout());
    let invalid = |actual: usize| InvalidSamples {
        width,
        height,
        layout,
        expected: width as usize * height as usize * layout.channels(),
        actual,
    };

    let samples = if layout.needs_rgb_conversion() {
        debug!("Converting {}x{} {:?} image to RGB", width, height, layout);
        image
            .samples()
            .chunks_exact(layout.channels())
            .flat_map(|px| cmyk_to_rgb(px[0], px[1], px[2], px[3]))
            .collect()
    } else {
        image.into_samples()
    };
    let actual = samples.len();

    let img = match layout {
        PixelLayout::Luma => {
            GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8)
        }
        PixelLayout::LumaAlpha => {
            GrayAlphaImage::from_raw(width, height, samples).map(DynamicImage::ImageLumaA8)
        }
        PixelLayout::Rgba => {
            RgbaImage::from_raw(width, height, samples).map(DynamicImage::ImageRgba8)
        }
        PixelLayout::Rgb | PixelLayout::Cmyk | PixelLayout::CmykAlpha => {
            RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8)
        }
    };

    img.ok_or_else(|| invalid(actual))
}

/// Encode an image as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!(
        "Encoded {}x{} image → {} bytes PNG",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ColorType;

    #[test]
    fn cmyk_primaries() {
        assert_eq!(cmyk_to_rgb(0, 0, 0, 0), [255, 255, 255]);
        assert_eq!(cmyk_to_rgb(0, 0, 0, 255), [0, 0, 0]);
        assert_eq!(cmyk_to_rgb(255, 0, 0, 0), [0, 255, 255]);
        assert_eq!(cmyk_to_rgb(0, 255, 255, 0), [255, 0, 0]);
    }

    #[test]
    fn cmyk_becomes_rgb() {
        let img = ExtractedImage::new(2, 1, PixelLayout::Cmyk, vec![0, 0, 0, 0, 0, 0, 0, 255]).unwrap();
        let out = normalize(img).unwrap();
        assert_eq!(out.color(), ColorType::Rgb8);
        assert_eq!(out.to_rgb8().into_raw(), vec![255, 255, 255, 0, 0, 0]);
    }

    #[test]
    fn cmyk_alpha_drops_alpha() {
        let img = ExtractedImage::new(1, 1, PixelLayout::CmykAlpha, vec![0, 255, 255, 0, 128]).unwrap();
        let out = normalize(img).unwrap();
        assert_eq!(out.color(), ColorType::Rgb8);
        assert_eq!(out.to_rgb8().into_raw(), vec![255, 0, 0]);
    }

    #[test]
    fn simple_layouts_kept() {
        let gray = ExtractedImage::new(1, 1, PixelLayout::Luma, vec![9]).unwrap();
        assert_eq!(normalize(gray).unwrap().color(), ColorType::L8);

        let la = ExtractedImage::new(1, 1, PixelLayout::LumaAlpha, vec![9, 200]).unwrap();
        assert_eq!(normalize(la).unwrap().color(), ColorType::La8);

        let rgba = ExtractedImage::new(1, 1, PixelLayout::Rgba, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(normalize(rgba).unwrap().color(), ColorType::Rgba8);
    }

    #[test]
    fn encode_is_deterministic_png() {
        let img = ExtractedImage::new(2, 2, PixelLayout::Rgb, (0..12).collect()).unwrap();
        let img = normalize(img).unwrap();
        let a = encode_png(&img).unwrap();
        let b = encode_png(&img).unwrap();
        assert_eq!(&a[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(a, b);
    }
}
