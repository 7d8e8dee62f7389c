//! Typed transformation operations
//!
//! An [`OperationSet`] holds every operation a request asked for. The engine applies them in
//! a fixed order (resize, format, flip, flop, rotate, median, blur, greyscale) no matter how
//! the keys were ordered in the query string.

/// Resize target box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeSpec {
    /// Square box whose side is the source width
    SourceWidth,
    /// Square box whose side is the source height
    SourceHeight,
    Exact { width: u32, height: u32 },
}

impl SizeSpec {
    /// Resolve the box against the decoded source dimensions.
    pub fn target_box(&self, source_width: u32, source_height: u32) -> (u32, u32) {
        match *self {
            SizeSpec::SourceWidth => (source_width, source_width),
            SizeSpec::SourceHeight => (source_height, source_height),
            SizeSpec::Exact { width, height } => (width, height),
        }
    }
}

/// How the image is fitted into the resize box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Preserve aspect ratio, crop to cover the whole box
    Cover,
    /// Preserve aspect ratio, letterbox inside the box
    Contain,
    /// Ignore aspect ratio, stretch to the box
    Fill,
    /// Preserve aspect ratio, at least as large as the box
    Outside,
    /// Preserve aspect ratio, no larger than the box
    #[default]
    Inside,
}

impl FitMode {
    /// Unknown fit names fall back to [`FitMode::Inside`].
    pub fn from_param(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "cover" => FitMode::Cover,
            "contain" => FitMode::Contain,
            "fill" => FitMode::Fill,
            "outside" => FitMode::Outside,
            _ => FitMode::Inside,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FitMode::Cover => "cover",
            FitMode::Contain => "contain",
            FitMode::Fill => "fill",
            FitMode::Outside => "outside",
            FitMode::Inside => "inside",
        }
    }
}

/// Anchor used when cropping (`cover`) or letterboxing (`contain`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Centre,
    Top,
    RightTop,
    Right,
    RightBottom,
    Bottom,
    LeftBottom,
    Left,
    LeftTop,
}

impl Position {
    /// Parse a position keyword. Accepts edge names (`left top`), compass names
    /// (`northwest`) and both spellings of centre.
    pub fn from_param(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '-' || c == '_' { ' ' } else { c })
            .collect();
        let words: Vec<&str> = normalized.split_whitespace().collect();

        let position = match words.as_slice() {
            ["centre"] | ["center"] => Position::Centre,
            ["top"] | ["north"] => Position::Top,
            ["right", "top"] | ["top", "right"] | ["northeast"] => Position::RightTop,
            ["right"] | ["east"] => Position::Right,
            ["right", "bottom"] | ["bottom", "right"] | ["southeast"] => Position::RightBottom,
            ["bottom"] | ["south"] => Position::Bottom,
            ["left", "bottom"] | ["bottom", "left"] | ["southwest"] => Position::LeftBottom,
            ["left"] | ["west"] => Position::Left,
            ["left", "top"] | ["top", "left"] | ["northwest"] => Position::LeftTop,
            _ => return None,
        };
        Some(position)
    }

    /// Offset of an `inner` span inside an `outer` span along both axes.
    ///
    /// Returns the top-left corner of the inner rectangle. Inner spans larger than the
    /// outer span yield 0 on that axis.
    pub fn offset(&self, outer: (u32, u32), inner: (u32, u32)) -> (u32, u32) {
        let free_x = outer.0.saturating_sub(inner.0);
        let free_y = outer.1.saturating_sub(inner.1);

        let x = match self {
            Position::Left | Position::LeftTop | Position::LeftBottom => 0,
            Position::Right | Position::RightTop | Position::RightBottom => free_x,
            Position::Centre | Position::Top | Position::Bottom => free_x / 2,
        };
        let y = match self {
            Position::Top | Position::LeftTop | Position::RightTop => 0,
            Position::Bottom | Position::LeftBottom | Position::RightBottom => free_y,
            Position::Centre | Position::Left | Position::Right => free_y / 2,
        };
        (x, y)
    }
}

/// Defaults applied when a request leaves an operation's tuning knob unset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformDefaults {
    pub fit: FitMode,
    pub position: Position,
    /// Encoder quality used when `format` is given without `quality`
    pub quality: u8,
}

impl TransformDefaults {
    pub const fn new() -> Self {
        Self {
            fit: FitMode::Inside,
            position: Position::Centre,
            quality: 100,
        }
    }
}

impl Default for TransformDefaults {
    fn default() -> Self {
        Self::new()
    }
}

pub const DEFAULTS: TransformDefaults = TransformDefaults::new();

/// Parsed, validated operations for one request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationSet {
    pub size: Option<SizeSpec>,
    pub fit: Option<FitMode>,
    pub position: Option<Position>,
    /// Lower-cased output format name, validated by the encoder
    pub format: Option<String>,
    pub quality: Option<u8>,
    pub flip: bool,
    pub flop: bool,
    pub rotate: Option<i32>,
    pub median: Option<u32>,
    pub blur: Option<f32>,
    pub greyscale: bool,
}

impl OperationSet {
    pub fn is_empty(&self) -> bool {
        *self == OperationSet::default()
    }

    pub fn fit_or_default(&self) -> FitMode {
        self.fit.unwrap_or(DEFAULTS.fit)
    }

    pub fn position_or_default(&self) -> Position {
        self.position.unwrap_or(DEFAULTS.position)
    }

    pub fn quality_or_default(&self) -> u8 {
        self.quality.unwrap_or(DEFAULTS.quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_spec_target_box() {
        assert_eq!(SizeSpec::SourceWidth.target_box(640, 480), (640, 640));
        assert_eq!(SizeSpec::SourceHeight.target_box(640, 480), (480, 480));
        assert_eq!(
            SizeSpec::Exact {
                width: 10,
                height: 20
            }
            .target_box(640, 480),
            (10, 20)
        );
    }

    #[test]
    fn test_fit_mode_falls_back_to_inside() {
        assert_eq!(FitMode::from_param("cover"), FitMode::Cover);
        assert_eq!(FitMode::from_param("CONTAIN"), FitMode::Contain);
        assert_eq!(FitMode::from_param("stretch"), FitMode::Inside);
        assert_eq!(FitMode::from_param(""), FitMode::Inside);
    }

    #[test]
    fn test_position_spellings() {
        assert_eq!(Position::from_param("center"), Some(Position::Centre));
        assert_eq!(Position::from_param("centre"), Some(Position::Centre));
        assert_eq!(Position::from_param("left top"), Some(Position::LeftTop));
        assert_eq!(Position::from_param("top-left"), Some(Position::LeftTop));
        assert_eq!(Position::from_param("SouthEast"), Some(Position::RightBottom));
        assert_eq!(Position::from_param("middle"), None);
    }

    #[test]
    fn test_position_offset() {
        let outer = (100, 50);
        let inner = (40, 20);
        assert_eq!(Position::Centre.offset(outer, inner), (30, 15));
        assert_eq!(Position::LeftTop.offset(outer, inner), (0, 0));
        assert_eq!(Position::RightBottom.offset(outer, inner), (60, 30));
        assert_eq!(Position::Top.offset(outer, inner), (30, 0));
        assert_eq!(Position::Centre.offset((10, 10), (20, 20)), (0, 0));
    }

    #[test]
    fn test_defaults() {
        let ops = OperationSet::default();
        assert!(ops.is_empty());
        assert_eq!(ops.fit_or_default(), FitMode::Inside);
        assert_eq!(ops.position_or_default(), Position::Centre);
        assert_eq!(ops.quality_or_default(), 100);
    }
}
