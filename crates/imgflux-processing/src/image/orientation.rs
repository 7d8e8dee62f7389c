use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};

/// Fill for corners uncovered by a non-right-angle rotation
const ROTATION_BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Image orientation operations (rotation and mirroring)
pub struct ImageOrientation;

impl ImageOrientation {
    /// Normalize any integer angle to 0..360
    pub fn normalize_angle(degrees: i32) -> u32 {
        degrees.rem_euclid(360) as u32
    }

    /// Rotate clockwise by `degrees`.
    ///
    /// Right angles are lossless. Other angles grow the canvas so the whole rotated image
    /// stays visible.
    pub fn rotate(img: DynamicImage, degrees: i32) -> DynamicImage {
        match Self::normalize_angle(degrees) {
            0 => img,
            90 => img.rotate90(),
            180 => img.rotate180(),
            270 => img.rotate270(),
            angle => Self::rotate_arbitrary(&img, angle),
        }
    }

    /// Size of the canvas needed to hold `width`x`height` rotated by `angle` degrees
    pub fn rotated_bounds(width: u32, height: u32, angle: u32) -> (u32, u32) {
        let theta = (angle as f64).to_radians();
        let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
        let (w, h) = (width as f64, height as f64);

        let new_width = (w * cos + h * sin).ceil().max(1.0) as u32;
        let new_height = (w * sin + h * cos).ceil().max(1.0) as u32;
        (new_width, new_height)
    }

    fn rotate_arbitrary(img: &DynamicImage, angle: u32) -> DynamicImage {
        let (width, height) = img.dimensions();
        let (out_width, out_height) = Self::rotated_bounds(width, height, angle);

        let source = img.to_rgba8();
        let mut out = RgbaImage::from_pixel(out_width, out_height, ROTATION_BACKGROUND);

        let projection = Projection::translate(out_width as f32 / 2.0, out_height as f32 / 2.0)
            * Projection::rotate((angle as f32).to_radians())
            * Projection::translate(-(width as f32) / 2.0, -(height as f32) / 2.0);

        warp_into(
            &source,
            &projection,
            Interpolation::Bilinear,
            ROTATION_BACKGROUND,
            &mut out,
        );

        DynamicImage::ImageRgba8(out)
    }

    /// Mirror top-to-bottom (`flip`)
    pub fn apply_flip_vertical(img: DynamicImage) -> DynamicImage {
        img.flipv()
    }

    /// Mirror left-to-right (`flop`)
    pub fn apply_flip_horizontal(img: DynamicImage) -> DynamicImage {
        img.fliph()
    }
}
