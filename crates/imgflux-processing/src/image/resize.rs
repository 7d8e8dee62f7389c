use anyhow::{bail, Result};
use image::{imageops, DynamicImage, GenericImageView, Rgba, RgbaImage};
use imgflux_core::{FitMode, Position, SizeSpec};

/// Background for letterboxed areas
const CANVAS_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Largest intermediate or output image a resize may allocate
pub const MAX_RESIZE_PIXELS: u64 = 100_000_000;

/// Image resize operations
pub struct ImageResize;

impl ImageResize {
    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> imageops::FilterType {
        let width_ratio = orig_width as f32 / new_width as f32;
        let height_ratio = orig_height as f32 / new_height as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            imageops::FilterType::Triangle
        } else if max_ratio > 1.5 {
            imageops::FilterType::CatmullRom
        } else {
            imageops::FilterType::Lanczos3
        }
    }

    /// Aspect-preserving dimensions for fitting `source` against `target`.
    ///
    /// With `at_least` the result covers the box on both axes, otherwise it fits inside it.
    pub fn scaled_dimensions(source: (u32, u32), target: (u32, u32), at_least: bool) -> (u32, u32) {
        let (sw, sh) = (source.0.max(1) as f64, source.1.max(1) as f64);
        let width_ratio = target.0 as f64 / sw;
        let height_ratio = target.1 as f64 / sh;
        let ratio = if at_least {
            width_ratio.max(height_ratio)
        } else {
            width_ratio.min(height_ratio)
        };

        let width = ((sw * ratio).round() as u32).max(1);
        let height = ((sh * ratio).round() as u32).max(1);

        if at_least {
            (width.max(target.0), height.max(target.1))
        } else {
            (width.min(target.0), height.min(target.1))
        }
    }

    /// Reject dimensions whose buffer would exceed [`MAX_RESIZE_PIXELS`].
    fn check_budget(width: u32, height: u32) -> Result<()> {
        let pixels = width as u64 * height as u64;
        if pixels > MAX_RESIZE_PIXELS {
            bail!(
                "resize to {}x{} exceeds the {} pixel limit",
                width,
                height,
                MAX_RESIZE_PIXELS
            );
        }
        Ok(())
    }

    fn resize_exact(img: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage> {
        let (orig_width, orig_height) = img.dimensions();
        if (orig_width, orig_height) == (width, height) {
            return Ok(img.clone());
        }
        Self::check_budget(width, height)?;
        let filter = Self::select_filter(orig_width, orig_height, width, height);
        Ok(img.resize_exact(width, height, filter))
    }

    /// Scale to cover the box, then crop the overflow around `position`.
    pub fn cover(img: &DynamicImage, target: (u32, u32), position: Position) -> Result<DynamicImage> {
        let (width, height) = Self::scaled_dimensions(img.dimensions(), target, true);
        let scaled = Self::resize_exact(img, width, height)?;
        let (x, y) = position.offset((width, height), target);
        Ok(scaled.crop_imm(x, y, target.0, target.1))
    }

    /// Scale to fit the box, then place on a canvas of exactly the box size.
    pub fn contain(img: &DynamicImage, target: (u32, u32), position: Position) -> Result<DynamicImage> {
        Self::check_budget(target.0, target.1)?;
        let (width, height) = Self::scaled_dimensions(img.dimensions(), target, false);
        let scaled = Self::resize_exact(img, width, height)?;

        let mut canvas = RgbaImage::from_pixel(target.0, target.1, CANVAS_COLOR);
        let (x, y) = position.offset(target, (width, height));
        imageops::overlay(&mut canvas, &scaled.to_rgba8(), x as i64, y as i64);

        Ok(DynamicImage::ImageRgba8(canvas))
    }

    pub fn inside(img: &DynamicImage, target: (u32, u32)) -> Result<DynamicImage> {
        let (width, height) = Self::scaled_dimensions(img.dimensions(), target, false);
        Self::resize_exact(img, width, height)
    }

    pub fn outside(img: &DynamicImage, target: (u32, u32)) -> Result<DynamicImage> {
        let (width, height) = Self::scaled_dimensions(img.dimensions(), target, true);
        Self::resize_exact(img, width, height)
    }

    pub fn fill(img: &DynamicImage, target: (u32, u32)) -> Result<DynamicImage> {
        Self::resize_exact(img, target.0, target.1)
    }

    /// Apply the `size` operation with the given fit and anchor
    pub fn apply_resize(
        img: &DynamicImage,
        size: SizeSpec,
        fit: FitMode,
        position: Position,
    ) -> Result<DynamicImage> {
        let (orig_width, orig_height) = img.dimensions();
        let target = size.target_box(orig_width, orig_height);

        tracing::debug!(
            from_width = orig_width,
            from_height = orig_height,
            box_width = target.0,
            box_height = target.1,
            fit = fit.as_str(),
            position = ?position,
            "Resizing image"
        );

        match fit {
            FitMode::Cover => Self::cover(img, target, position),
            FitMode::Contain => Self::contain(img, target, position),
            FitMode::Fill => Self::fill(img, target),
            FitMode::Outside => Self::outside(img, target),
            FitMode::Inside => Self::inside(img, target),
        }
    }
}
