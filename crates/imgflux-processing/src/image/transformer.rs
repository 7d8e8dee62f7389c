use std::io::Cursor;

use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use image::{GenericImageView, ImageReader};
use imgflux_core::OperationSet;

use super::filters::ImageFilters;
use super::orientation::ImageOrientation;
use super::resize::ImageResize;
use crate::compression::{resolve_format, EncodeOptions, ImageCompressor};

/// Encoded result of one transformation
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    pub bytes: Bytes,
    /// Set only when an output format was requested
    pub content_type: Option<String>,
}

/// Applies an [`OperationSet`] to an encoded image.
///
/// Pipeline order is fixed: resize, format, flip, flop, rotate, median, blur, greyscale.
pub struct TransformEngine;

impl TransformEngine {
    pub fn apply(data: &[u8], operations: &OperationSet) -> Result<TransformOutput> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .context("Failed to read source image")?;
        let source_format = reader
            .format()
            .ok_or_else(|| anyhow!("Unrecognized source image format"))?;
        let mut img = reader.decode().context("Failed to decode source image")?;

        let (width, height) = img.dimensions();
        tracing::debug!(
            format = ?source_format,
            width = width,
            height = height,
            "Decoded source image"
        );

        if let Some(size) = operations.size {
            img = ImageResize::apply_resize(
                &img,
                size,
                operations.fit_or_default(),
                operations.position_or_default(),
            )?;
        }

        let (output_format, options, content_type) = match operations.format.as_deref() {
            Some(name) => {
                let format = resolve_format(name)?;
                let options = EncodeOptions::requested(operations.quality_or_default());
                (format, options, Some(format.to_mime_type().to_string()))
            }
            None => (source_format, EncodeOptions::source_default(), None),
        };

        if operations.flip {
            tracing::debug!("Applying flip");
            img = ImageOrientation::apply_flip_vertical(img);
        }

        if operations.flop {
            tracing::debug!("Applying flop");
            img = ImageOrientation::apply_flip_horizontal(img);
        }

        if let Some(degrees) = operations.rotate {
            tracing::debug!(degrees = degrees, "Applying rotation");
            img = ImageOrientation::rotate(img, degrees);
        }

        if let Some(size) = operations.median {
            tracing::debug!(size = size, "Applying median filter");
            img = ImageFilters::median(img, size);
        }

        if let Some(sigma) = operations.blur {
            tracing::debug!(sigma = sigma, "Applying blur");
            img = ImageFilters::blur(img, sigma);
        }

        if operations.greyscale {
            tracing::debug!("Applying greyscale");
            img = ImageFilters::greyscale(img);
        }

        let bytes = ImageCompressor::compress(&img, output_format, options)?;

        Ok(TransformOutput {
            bytes,
            content_type,
        })
    }
}
