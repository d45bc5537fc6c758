use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageEncoder, RgbImage};

use crate::error::ThumbnailError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Size {
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl Size {
    pub(crate) const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Region of the source image kept before resizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CropBox {
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

/// Largest centered box of `source` that has the aspect ratio of `target`.
pub(crate) fn crop_box(source: Size, target: Size) -> CropBox {
    let target_ratio = target.width as f64 / target.height as f64;
    let source_ratio = source.width as f64 / source.height as f64;

    let (width, height) = if source_ratio > target_ratio {
        let crop_width = (target_ratio * source.height as f64).round() as u32;
        (crop_width.clamp(1, source.width), source.height)
    } else {
        let crop_height = (source.width as f64 / target_ratio).round() as u32;
        (source.width, crop_height.clamp(1, source.height))
    };

    CropBox {
        x: (source.width - width) / 2,
        y: (source.height - height) / 2,
        width,
        height,
    }
}

/// Decodes `raw`, center-crops it to the aspect ratio of `target` and resizes
/// it to exactly `target`.
pub(crate) fn normalize(raw: &[u8], target: Size) -> Result<RgbImage, ThumbnailError> {
    if target.width == 0 || target.height == 0 {
        return Err(ThumbnailError::UnreadableImage(format!(
            "invalid target size {}x{}",
            target.width, target.height
        )));
    }

    let decoded = image::load_from_memory(raw)?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(ThumbnailError::UnreadableImage("image has no pixels".into()));
    }
    let rgb = image::DynamicImage::ImageRgb8(decoded.to_rgb8());

    let source = Size::new(rgb.width(), rgb.height());
    let crop = crop_box(source, target);
    log::debug!(
        "Cropping {}x{} to {}x{} at ({}, {})",
        source.width,
        source.height,
        crop.width,
        crop.height,
        crop.x,
        crop.y
    );

    Ok(rgb
        .crop_imm(crop.x, crop.y, crop.width, crop.height)
        .resize_exact(target.width, target.height, FilterType::Lanczos3)
        .to_rgb8())
}

pub(crate) fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ThumbnailError> {
    let mut png_data = Vec::new();
    PngEncoder::new(&mut png_data).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(png_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        encode_png(&img).unwrap()
    }

    #[test]
    fn wider_source_keeps_full_height() {
        let crop = crop_box(Size::new(2048, 2048), Size::new(1080, 1920));
        assert_eq!(
            crop,
            CropBox {
                x: 448,
                y: 0,
                width: 1152,
                height: 2048
            }
        );
    }

    #[test]
    fn taller_source_keeps_full_width() {
        let crop = crop_box(Size::new(100, 400), Size::new(1080, 1920));
        // 100 / 0.5625 = 177.78
        assert_eq!(
            crop,
            CropBox {
                x: 0,
                y: 111,
                width: 100,
                height: 178
            }
        );
    }

    #[test]
    fn equal_ratio_keeps_everything() {
        let crop = crop_box(Size::new(540, 960), Size::new(1080, 1920));
        assert_eq!(
            crop,
            CropBox {
                x: 0,
                y: 0,
                width: 540,
                height: 960
            }
        );
        let crop = crop_box(Size::new(1024, 1024), Size::new(64, 64));
        assert_eq!((crop.width, crop.height), (1024, 1024));
    }

    #[test]
    fn crop_never_collapses() {
        let crop = crop_box(Size::new(1, 1), Size::new(1, 1000));
        assert_eq!((crop.width, crop.height), (1, 1));
    }

    #[test]
    fn output_matches_target_size() {
        let cases = [
            (64, 64, 27, 48),
            (300, 20, 9, 16),
            (20, 300, 16, 9),
            (1, 1, 5, 7),
            (33, 77, 33, 77),
        ];
        for (sw, sh, tw, th) in cases {
            let out = normalize(&png_bytes(sw, sh), Size::new(tw, th)).unwrap();
            assert_eq!(out.dimensions(), (tw, th), "source {sw}x{sh}");
        }
    }

    #[test]
    fn alpha_is_dropped() {
        let rgba = RgbaImage::from_pixel(40, 40, Rgba([10, 20, 30, 0]));
        let mut raw = Vec::new();
        PngEncoder::new(&mut raw)
            .write_image(rgba.as_raw(), 40, 40, ExtendedColorType::Rgba8)
            .unwrap();

        let out = normalize(&raw, Size::new(9, 16)).unwrap();
        assert_eq!(out.dimensions(), (9, 16));
        let [r, g, b] = out.get_pixel(4, 8).0;
        assert!(r.abs_diff(10) <= 1 && g.abs_diff(20) <= 1 && b.abs_diff(30) <= 1);
    }

    #[test]
    fn garbage_is_unreadable() {
        let err = normalize(b"definitely not an image", Size::new(9, 16)).unwrap_err();
        assert!(matches!(err, ThumbnailError::UnreadableImage(_)));
    }

    #[test]
    fn zero_target_is_rejected() {
        let err = normalize(&png_bytes(4, 4), Size::new(0, 16)).unwrap_err();
        assert!(matches!(err, ThumbnailError::UnreadableImage(_)));
    }

    #[test]
    fn encoded_png_decodes_back() {
        let img = RgbImage::from_pixel(3, 5, image::Rgb([1, 2, 3]));
        let decoded = image::load_from_memory(&encode_png(&img).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 5));
    }
}
