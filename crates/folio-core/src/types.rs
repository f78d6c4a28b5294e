// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Folio composition engine.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FolioError, Result};

/// Opaque identity of a source image, stable for the lifetime of the caller's
/// list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageId(pub Uuid);

impl ImageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encoded image bytes handed over by the caller.
///
/// The buffer is reference counted and never mutated, so clones are cheap and
/// can be read concurrently by decode workers.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub id: ImageId,
    /// Display name (usually the original file name), used in logs only.
    pub name: Option<String>,
    bytes: Arc<[u8]>,
}

impl SourceImage {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: ImageId::new(),
            name: None,
            bytes: bytes.into(),
        }
    }

    /// Attach a caller-chosen identity instead of a fresh random one.
    pub fn with_id(mut self, id: ImageId) -> Self {
        self.id = id;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Clockwise rotation applied to an image before it is placed on its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Accepts exactly 0, 90, 180 or 270. Anything else is rejected rather
    /// than normalised.
    pub fn from_degrees(degrees: i32) -> Result<Self> {
        match degrees {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            other => Err(FolioError::InvalidArgument(format!(
                "rotation must be one of 0, 90, 180 or 270 degrees, got {other}"
            ))),
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// True when width and height trade places (90 and 270).
    pub fn swaps_dimensions(self) -> bool {
        self.degrees() % 180 != 0
    }

    /// The rotation reached by turning a further 90 degrees clockwise.
    pub fn rotate_clockwise(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg90,
            Self::Deg90 => Self::Deg180,
            Self::Deg180 => Self::Deg270,
            Self::Deg270 => Self::Deg0,
        }
    }
}

impl TryFrom<i32> for Rotation {
    type Error = FolioError;

    fn try_from(degrees: i32) -> Result<Self> {
        Self::from_degrees(degrees)
    }
}

impl From<Rotation> for i32 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

/// One input image plus the rotation to apply; contributes exactly one page.
#[derive(Debug, Clone)]
pub struct PageItem {
    pub image: SourceImage,
    pub rotation: Rotation,
}

impl PageItem {
    pub fn new(image: SourceImage, rotation: Rotation) -> Self {
        Self { image, rotation }
    }
}

/// Fixed paper sizes offered for output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    Letter,
    Custom { width_mm: f32, height_mm: f32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            Self::A4 => (210.0, 297.0),
            Self::Letter => (215.9, 279.4),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::A4 => "A4",
            Self::Letter => "Letter",
            Self::Custom { .. } => "Custom",
        }
    }
}

/// Page sizing policy for a whole conversion run.
///
/// Parses from the selector strings `a4`, `letter` and `fit`, or a custom
/// `WIDTHxHEIGHT` size in millimetres (e.g. `148x210`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PageFormat {
    Fixed(PaperSize),
    /// Every page takes the size of its own (rotated) image.
    FitToImage,
}

impl Default for PageFormat {
    fn default() -> Self {
        Self::Fixed(PaperSize::A4)
    }
}

impl FromStr for PageFormat {
    type Err = FolioError;

    fn from_str(value: &str) -> Result<Self> {
        let selector = value.trim().to_ascii_lowercase();
        match selector.as_str() {
            "a4" => Ok(Self::Fixed(PaperSize::A4)),
            "letter" => Ok(Self::Fixed(PaperSize::Letter)),
            "fit" => Ok(Self::FitToImage),
            custom => parse_custom_size(custom).ok_or_else(|| {
                FolioError::InvalidArgument(format!(
                    "unknown page format '{value}' (expected a4, letter, fit or WIDTHxHEIGHT in mm)"
                ))
            }),
        }
    }
}

fn parse_custom_size(value: &str) -> Option<PageFormat> {
    let (width, height) = value.split_once('x')?;
    let width_mm: f32 = width.trim().parse().ok()?;
    let height_mm: f32 = height.trim().parse().ok()?;
    if !(width_mm.is_finite() && height_mm.is_finite() && width_mm > 0.0 && height_mm > 0.0) {
        return None;
    }
    Some(PageFormat::Fixed(PaperSize::Custom {
        width_mm,
        height_mm,
    }))
}

impl fmt::Display for PageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(PaperSize::A4) => f.write_str("a4"),
            Self::Fixed(PaperSize::Letter) => f.write_str("letter"),
            Self::Fixed(PaperSize::Custom {
                width_mm,
                height_mm,
            }) => write!(f, "{width_mm}x{height_mm}"),
            Self::FitToImage => f.write_str("fit"),
        }
    }
}

impl TryFrom<String> for PageFormat {
    type Error = FolioError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PageFormat> for String {
    fn from(format: PageFormat) -> Self {
        format.to_string()
    }
}

/// Page orientation, derived from the final page dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Landscape iff strictly wider than tall.
    pub fn from_dimensions(width: f32, height: f32) -> Self {
        if width > height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }
}

/// Computed page size and image placement for one output page, in millimetres.
///
/// `draw_y_mm` is measured from the top edge of the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PagePlan {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub orientation: Orientation,
    pub draw_x_mm: f32,
    pub draw_y_mm: f32,
    pub draw_width_mm: f32,
    pub draw_height_mm: f32,
}

impl PagePlan {
    /// Offset of the draw rectangle's lower edge from the page bottom, as
    /// used by PDF's y-up coordinate system.
    pub fn draw_y_from_bottom_mm(&self) -> f32 {
        self.page_height_mm - self.draw_y_mm - self.draw_height_mm
    }
}
