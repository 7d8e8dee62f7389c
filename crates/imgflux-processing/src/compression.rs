use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

/// Quality used when re-encoding in the source format without an explicit `format`
pub const SOURCE_FORMAT_QUALITY: u8 = 80;

/// AV1 encoder speed (1 slowest .. 10 fastest)
const AVIF_SPEED: u8 = 6;

/// Encoder settings for one output image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// 1..=100, ignored by lossless-only codecs
    pub quality: u8,
    /// Use lossless compression where the codec offers it
    pub lossless: bool,
}

impl EncodeOptions {
    /// Settings for an explicitly requested output format
    pub fn requested(quality: u8) -> Self {
        Self {
            quality,
            lossless: true,
        }
    }

    /// Settings for re-encoding in the detected source format
    pub fn source_default() -> Self {
        Self {
            quality: SOURCE_FORMAT_QUALITY,
            lossless: false,
        }
    }
}

/// Resolve a user-supplied format name (`jpg`, `png`, `webp`, ...) to an encodable format.
pub fn resolve_format(name: &str) -> Result<ImageFormat> {
    let format = ImageFormat::from_extension(name.trim().to_ascii_lowercase())
        .ok_or_else(|| anyhow!("Unsupported output format: {}", name))?;

    if !is_encodable(format) {
        return Err(anyhow!("Output format '{}' cannot be encoded", name));
    }
    Ok(format)
}

fn is_encodable(format: ImageFormat) -> bool {
    matches!(format, ImageFormat::Jpeg | ImageFormat::WebP | ImageFormat::Avif)
        || format.writing_enabled()
}

/// Output encoder
pub struct ImageCompressor;

impl ImageCompressor {
    /// Encode `img` as `format`
    pub fn compress(img: &DynamicImage, format: ImageFormat, options: EncodeOptions) -> Result<Bytes> {
        let (width, height) = img.dimensions();
        tracing::debug!(
            format = ?format,
            width = width,
            height = height,
            quality = options.quality,
            lossless = options.lossless,
            "Encoding image"
        );

        match format {
            ImageFormat::Jpeg => Self::compress_jpeg(img, options.quality),
            ImageFormat::WebP => Self::compress_webp(img, options),
            ImageFormat::Avif => Self::compress_avif(img, options.quality),
            other => Self::compress_generic(img, other),
        }
    }

    /// Compress to JPEG using mozjpeg
    fn compress_jpeg(img: &DynamicImage, quality: u8) -> Result<Bytes> {
        let (width, height) = img.dimensions();

        let (color_space, pixels) = match img {
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageLumaA8(_) => {
                (mozjpeg::ColorSpace::JCS_GRAYSCALE, img.to_luma8().into_raw())
            }
            _ => (mozjpeg::ColorSpace::JCS_RGB, img.to_rgb8().into_raw()),
        };

        let mut comp = mozjpeg::Compress::new(color_space);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality as f32);
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);

        let mut comp = comp
            .start_compress(Vec::new())
            .context("Failed to start JPEG encoder")?;
        comp.write_scanlines(&pixels)
            .context("Failed to write JPEG scanlines")?;
        let jpeg_data = comp.finish().context("Failed to finish JPEG encoding")?;

        Ok(Bytes::from(jpeg_data))
    }

    /// Compress to WebP
    fn compress_webp(img: &DynamicImage, options: EncodeOptions) -> Result<Bytes> {
        let (width, height) = img.dimensions();
        let rgba_img = img.to_rgba8();

        let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
        let webp_data = encoder
            .encode_simple(options.lossless, options.quality as f32)
            .map_err(|e| anyhow!("WebP encoding failed: {:?}", e))?;

        Ok(Bytes::copy_from_slice(&webp_data))
    }

    /// Compress to AVIF
    fn compress_avif(img: &DynamicImage, quality: u8) -> Result<Bytes> {
        let (width, height) = img.dimensions();
        let rgba_img = img.to_rgba8();

        let rgba_data: Vec<rgb::RGBA8> = rgba_img
            .as_raw()
            .chunks_exact(4)
            .map(|chunk| rgb::RGBA8::new(chunk[0], chunk[1], chunk[2], chunk[3]))
            .collect();

        let img_buf = ravif::Img::new(rgba_data.as_slice(), width as usize, height as usize);

        let encoder = ravif::Encoder::new()
            .with_quality(quality.clamp(1, 100) as f32)
            .with_speed(AVIF_SPEED);

        let avif_data = encoder
            .encode_rgba(img_buf)
            .map_err(|e| anyhow!("AVIF encoding failed: {}", e))?;

        Ok(Bytes::from(avif_data.avif_file))
    }

    /// PNG, GIF, TIFF, BMP and the other formats the `image` crate writes itself
    fn compress_generic(img: &DynamicImage, format: ImageFormat) -> Result<Bytes> {
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), format)
            .with_context(|| format!("Failed to encode image as {:?}", format))?;

        Ok(Bytes::from(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sample() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 12, Rgba([255, 0, 0, 255])))
    }

    fn decoded_format(bytes: &[u8]) -> ImageFormat {
        image::guess_format(bytes).expect("encoded output should be recognisable")
    }

    #[test]
    fn test_resolve_format() {
        assert_eq!(resolve_format("png").unwrap(), ImageFormat::Png);
        assert_eq!(resolve_format("jpg").unwrap(), ImageFormat::Jpeg);
        assert_eq!(resolve_format("JPEG").unwrap(), ImageFormat::Jpeg);
        assert_eq!(resolve_format("webp").unwrap(), ImageFormat::WebP);
        assert_eq!(resolve_format("avif").unwrap(), ImageFormat::Avif);
        assert!(resolve_format("bogus").is_err());
        assert!(resolve_format("").is_err());
    }

    #[test]
    fn test_compress_jpeg() {
        let data = ImageCompressor::compress(&sample(), ImageFormat::Jpeg, EncodeOptions::requested(90))
            .unwrap();
        assert_eq!(decoded_format(&data), ImageFormat::Jpeg);
        assert_eq!(image::load_from_memory(&data).unwrap().dimensions(), (16, 12));
    }

    #[test]
    fn test_compress_grayscale_jpeg() {
        let grey = sample().grayscale();
        let data =
            ImageCompressor::compress(&grey, ImageFormat::Jpeg, EncodeOptions::source_default())
                .unwrap();
        assert_eq!(decoded_format(&data), ImageFormat::Jpeg);
    }

    #[test]
    fn test_compress_png_is_lossless() {
        let img = sample();
        let data =
            ImageCompressor::compress(&img, ImageFormat::Png, EncodeOptions::requested(100)).unwrap();
        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!(decoded.to_rgba8().as_raw(), img.to_rgba8().as_raw());
    }

    #[test]
    fn test_compress_webp_lossless() {
        let img = sample();
        let data =
            ImageCompressor::compress(&img, ImageFormat::WebP, EncodeOptions::requested(100)).unwrap();
        assert_eq!(decoded_format(&data), ImageFormat::WebP);
        let decoded = image::load_from_memory(&data).unwrap();
        assert_eq!(decoded.to_rgba8().as_raw(), img.to_rgba8().as_raw());
    }

    #[test]
    fn test_compress_gif() {
        let data =
            ImageCompressor::compress(&sample(), ImageFormat::Gif, EncodeOptions::requested(100))
                .unwrap();
        assert_eq!(decoded_format(&data), ImageFormat::Gif);
    }
}
