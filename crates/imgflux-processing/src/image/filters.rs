use image::DynamicImage;
use imageproc::filter::{gaussian_blur_f32, median_filter};

/// Pixel filters (median, blur, greyscale)
pub struct ImageFilters;

impl ImageFilters {
    /// Median filter over an `size`x`size` window.
    ///
    /// Even sizes use the next odd window, since the filter is centred on each pixel.
    pub fn median(img: DynamicImage, size: u32) -> DynamicImage {
        let radius = size / 2;
        if radius == 0 {
            return img;
        }

        match img {
            DynamicImage::ImageLuma8(gray) => {
                DynamicImage::ImageLuma8(median_filter(&gray, radius, radius))
            }
            DynamicImage::ImageRgb8(rgb) => {
                DynamicImage::ImageRgb8(median_filter(&rgb, radius, radius))
            }
            other => DynamicImage::ImageRgba8(median_filter(&other.to_rgba8(), radius, radius)),
        }
    }

    /// Gaussian blur; `sigma` must be positive.
    pub fn blur(img: DynamicImage, sigma: f32) -> DynamicImage {
        match img {
            DynamicImage::ImageLuma8(gray) => DynamicImage::ImageLuma8(gaussian_blur_f32(&gray, sigma)),
            DynamicImage::ImageRgb8(rgb) => DynamicImage::ImageRgb8(gaussian_blur_f32(&rgb, sigma)),
            other => DynamicImage::ImageRgba8(gaussian_blur_f32(&other.to_rgba8(), sigma)),
        }
    }

    /// Convert to luminance, keeping alpha when present
    pub fn greyscale(img: DynamicImage) -> DynamicImage {
        img.grayscale()
    }
}
