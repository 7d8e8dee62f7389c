//! Query string parsing for transform requests
//!
//! Turns the raw query of an inbound request into a [`TransformRequest`]: the source image
//! URL plus a validated [`OperationSet`]. Unknown keys are ignored.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::{AppError, AppResult};
use crate::operations::{FitMode, OperationSet, Position, SizeSpec};

pub const MAX_MEDIAN_SIZE: u32 = 1000;
/// Largest accepted width or height in an explicit `size`
pub const MAX_SIZE_DIMENSION: u32 = 16_384;
pub const MIN_BLUR_SIGMA: f32 = 0.3;
pub const MAX_BLUR_SIGMA: f32 = 1000.0;

/// A source location and the operations to apply to it
#[derive(Debug, Clone, PartialEq)]
pub struct TransformRequest {
    pub source_url: Url,
    pub operations: OperationSet,
}

/// Shape of a decoded query value
#[derive(Debug, Clone, PartialEq)]
enum QueryValue {
    Single(String),
    /// The key appeared more than once
    Many(Vec<String>),
    /// Bracketed key such as `size[w]=10`
    Nested,
}

fn url_decode(s: &str) -> String {
    percent_decode_str(&s.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

fn parse_query(raw_query: &str) -> HashMap<String, QueryValue> {
    let mut params: HashMap<String, QueryValue> = HashMap::new();
    let raw_query = raw_query.strip_prefix('?').unwrap_or(raw_query);

    for pair in raw_query.split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = url_decode(raw_key);
        let value = url_decode(raw_value);

        let (base, nested) = match key.find('[') {
            Some(idx) if idx > 0 => (key[..idx].to_string(), true),
            _ => (key, false),
        };
        if base.is_empty() {
            continue;
        }

        if nested {
            params.insert(base, QueryValue::Nested);
            continue;
        }

        match params.remove(&base) {
            None => {
                params.insert(base, QueryValue::Single(value));
            }
            Some(QueryValue::Single(first)) => {
                params.insert(base, QueryValue::Many(vec![first, value]));
            }
            Some(QueryValue::Many(mut values)) => {
                values.push(value);
                params.insert(base, QueryValue::Many(values));
            }
            Some(QueryValue::Nested) => {
                params.insert(base, QueryValue::Nested);
            }
        }
    }

    params
}

/// Fetch a single-valued parameter; lists and nested values are rejected.
fn single<'a>(
    params: &'a HashMap<String, QueryValue>,
    key: &'static str,
) -> AppResult<Option<&'a str>> {
    match params.get(key) {
        None => Ok(None),
        Some(QueryValue::Single(value)) => Ok(Some(value.as_str())),
        Some(_) => Err(AppError::invalid_parameter(key, "expected a single value")),
    }
}

fn parse_source_url(params: &HashMap<String, QueryValue>) -> AppResult<Url> {
    let raw = match single(params, "url")? {
        Some(value) if !value.trim().is_empty() => value.trim(),
        _ => return Err(AppError::MissingSource),
    };

    let url = Url::parse(raw)
        .map_err(|e| AppError::invalid_parameter("url", format!("not a valid URL: {}", e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::invalid_parameter(
            "url",
            format!("unsupported scheme '{}', expected http or https", other),
        )),
    }
}

/// Parse `width`, `height` or `<w>x<h>`.
pub fn parse_size(value: &str) -> AppResult<SizeSpec> {
    let value = value.trim().to_ascii_lowercase();
    match value.as_str() {
        "width" => return Ok(SizeSpec::SourceWidth),
        "height" => return Ok(SizeSpec::SourceHeight),
        _ => {}
    }

    let invalid = || {
        AppError::invalid_parameter(
            "size",
            format!(
                "'{}' is not 'width', 'height' or '<width>x<height>' with positive integers",
                value
            ),
        )
    };

    let (w, h) = value.split_once('x').ok_or_else(invalid)?;
    let width: u32 = w.parse().map_err(|_| invalid())?;
    let height: u32 = h.parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    if width > MAX_SIZE_DIMENSION || height > MAX_SIZE_DIMENSION {
        return Err(AppError::invalid_parameter(
            "size",
            format!(
                "'{}' exceeds the {} pixel limit per side",
                value, MAX_SIZE_DIMENSION
            ),
        ));
    }

    Ok(SizeSpec::Exact { width, height })
}

fn parse_quality(value: &str) -> AppResult<u8> {
    let quality: i64 = value
        .trim()
        .parse()
        .map_err(|_| AppError::invalid_parameter("quality", format!("'{}' is not an integer", value)))?;
    if !(1..=100).contains(&quality) {
        return Err(AppError::invalid_parameter(
            "quality",
            format!("{} is outside 1..=100", quality),
        ));
    }
    Ok(quality as u8)
}

fn parse_rotate(value: &str) -> AppResult<i32> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::invalid_parameter("rotate", format!("'{}' is not an integer", value)))
}

fn parse_median(value: &str) -> AppResult<u32> {
    let size: i64 = value
        .trim()
        .parse()
        .map_err(|_| AppError::invalid_parameter("median", format!("'{}' is not an integer", value)))?;
    if size < 1 || size > MAX_MEDIAN_SIZE as i64 {
        return Err(AppError::invalid_parameter(
            "median",
            format!("{} is outside 1..={}", size, MAX_MEDIAN_SIZE),
        ));
    }
    Ok(size as u32)
}

fn parse_blur(value: &str) -> AppResult<f32> {
    let sigma: f32 = value
        .trim()
        .parse()
        .map_err(|_| AppError::invalid_parameter("blur", format!("'{}' is not a number", value)))?;
    if !sigma.is_finite() || !(MIN_BLUR_SIGMA..=MAX_BLUR_SIGMA).contains(&sigma) {
        return Err(AppError::invalid_parameter(
            "blur",
            format!(
                "sigma {} is outside {}..={}",
                sigma, MIN_BLUR_SIGMA, MAX_BLUR_SIGMA
            ),
        ));
    }
    Ok(sigma)
}

fn parse_format(value: &str) -> AppResult<String> {
    let format = value.trim().to_ascii_lowercase();
    if format.is_empty() {
        return Err(AppError::invalid_parameter("format", "must not be empty"));
    }
    Ok(format)
}

fn parse_operations(params: &HashMap<String, QueryValue>) -> AppResult<OperationSet> {
    let fit = params.get("fit").map(|value| match value {
        QueryValue::Single(v) => FitMode::from_param(v),
        _ => FitMode::Inside,
    });

    let position = single(params, "position")?
        .map(|value| {
            Position::from_param(value).ok_or_else(|| {
                AppError::invalid_parameter("position", format!("unknown position '{}'", value))
            })
        })
        .transpose()?;

    Ok(OperationSet {
        size: single(params, "size")?.map(parse_size).transpose()?,
        fit,
        position,
        format: single(params, "format")?.map(parse_format).transpose()?,
        quality: single(params, "quality")?.map(parse_quality).transpose()?,
        flip: params.contains_key("flip"),
        flop: params.contains_key("flop"),
        rotate: single(params, "rotate")?.map(parse_rotate).transpose()?,
        median: single(params, "median")?.map(parse_median).transpose()?,
        blur: single(params, "blur")?.map(parse_blur).transpose()?,
        greyscale: params.contains_key("greyscale"),
    })
}

/// Parse a raw (still URL-encoded) query string into a [`TransformRequest`].
///
/// `url` is required and is consumed here; it never becomes part of the operation set.
pub fn parse(raw_query: &str) -> AppResult<TransformRequest> {
    let mut params = parse_query(raw_query);
    let source_url = parse_source_url(&params)?;
    params.remove("url");
    let operations = parse_operations(&params)?;

    Ok(TransformRequest {
        source_url,
        operations,
    })
}
