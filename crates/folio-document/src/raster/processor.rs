// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster processor — turns a source image into the pixels that land on a page.
// Decoding and re-encoding use the `image` crate; rotation is restricted to
// lossless quarter turns about the image centre.

use std::io::Cursor;

use folio_core::error::{FolioError, Result};
use folio_core::{Rotation, SourceImage};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, ImageDecoder, ImageReader, Luma, Rgb, RgbImage};
use tracing::{debug, instrument};

/// A decoded image after its rotation has been applied.
///
/// Width and height are swapped relative to the decoded image iff the rotation
/// is 90 or 270 degrees.
#[derive(Debug, Clone)]
pub struct RotatedRaster {
    image: DynamicImage,
    rotation: Rotation,
}

impl RotatedRaster {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }
}

/// Colour space of an [`EncodedImage`], mirrored into the PDF image dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    Gray,
    Rgb,
}

impl JpegColorSpace {
    pub fn pdf_name(self) -> &'static str {
        match self {
            Self::Gray => "DeviceGray",
            Self::Rgb => "DeviceRGB",
        }
    }
}

/// Baseline JPEG stream ready to be embedded with `DCTDecode`.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub color_space: JpegColorSpace,
}

// -- Decode -------------------------------------------------------------------

/// Decode the encoded bytes of `source` and bring it upright according to any
/// EXIF orientation tag. `index` is the item's position in the run and is
/// carried in the error.
#[instrument(skip(source), fields(index, image = %source.id, data_len = source.len()))]
pub fn decode(source: &SourceImage, index: usize) -> Result<DynamicImage> {
    let decode_error = |reason: String| FolioError::Decode {
        index,
        image: source.id,
        reason,
    };

    let mut decoder = ImageReader::new(Cursor::new(source.bytes()))
        .with_guessed_format()
        .map_err(|err| decode_error(err.to_string()))?
        .into_decoder()
        .map_err(|err| decode_error(err.to_string()))?;
    let orientation = decoder
        .orientation()
        .map_err(|err| decode_error(err.to_string()))?;
    let mut image =
        DynamicImage::from_decoder(decoder).map_err(|err| decode_error(err.to_string()))?;
    image.apply_orientation(orientation);

    debug!(
        width = image.width(),
        height = image.height(),
        ?orientation,
        name = source.name.as_deref().unwrap_or(""),
        "Image decoded"
    );
    Ok(image)
}

// -- Rotate -------------------------------------------------------------------

/// Rotate `image` clockwise about its centre.
///
/// The input is consumed, so the identity case hands the same pixels back
/// without copying while the caller still ends up with its own value.
#[instrument(skip(image), fields(degrees = rotation.degrees()))]
pub fn rotate(image: DynamicImage, rotation: Rotation) -> RotatedRaster {
    let image = match rotation {
        Rotation::Deg0 => image,
        Rotation::Deg90 => image.rotate90(),
        Rotation::Deg180 => image.rotate180(),
        Rotation::Deg270 => image.rotate270(),
    };
    debug!(width = image.width(), height = image.height(), "Rotation applied");
    RotatedRaster { image, rotation }
}

// -- Encode -------------------------------------------------------------------

/// Re-encode the rotated pixels as JPEG with the given quality (1-100).
///
/// Greyscale sources stay single-channel; everything else is converted to RGB.
/// Transparent pixels are composited over white, the colour of the page.
#[instrument(skip(raster), fields(index, quality, width = raster.width(), height = raster.height()))]
pub fn encode_jpeg(raster: &RotatedRaster, quality: u8, index: usize) -> Result<EncodedImage> {
    if !(1..=100).contains(&quality) {
        return Err(FolioError::InvalidArgument(format!(
            "JPEG quality must be between 1 and 100, got {quality}"
        )));
    }

    let encoding_error = |err: image::ImageError| FolioError::Encoding {
        index,
        reason: err.to_string(),
    };

    let mut data = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut data, quality);
    let color_space = match raster.as_dynamic() {
        DynamicImage::ImageLuma8(gray) => {
            gray.write_with_encoder(encoder).map_err(encoding_error)?;
            JpegColorSpace::Gray
        }
        DynamicImage::ImageLumaA8(_) => {
            gray_over_white(raster.as_dynamic())
                .write_with_encoder(encoder)
                .map_err(encoding_error)?;
            JpegColorSpace::Gray
        }
        other if other.color().has_alpha() => {
            rgb_over_white(other)
                .write_with_encoder(encoder)
                .map_err(encoding_error)?;
            JpegColorSpace::Rgb
        }
        other => {
            other
                .to_rgb8()
                .write_with_encoder(encoder)
                .map_err(encoding_error)?;
            JpegColorSpace::Rgb
        }
    };

    debug!(jpeg_len = data.len(), ?color_space, "JPEG encoded");
    Ok(EncodedImage {
        data,
        width: raster.width(),
        height: raster.height(),
        color_space,
    })
}

/// Blend one channel over white with straight alpha.
fn over_white(channel: u8, alpha: u8) -> u8 {
    let alpha = u16::from(alpha);
    ((u16::from(channel) * alpha + 255 * (255 - alpha) + 127) / 255) as u8
}

fn rgb_over_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        Rgb([over_white(r, a), over_white(g, a), over_white(b, a)])
    })
}

fn gray_over_white(image: &DynamicImage) -> GrayImage {
    let gray = image.to_luma_alpha8();
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let [l, a] = gray.get_pixel(x, y).0;
        Luma([over_white(l, a)])
    })
}

// -- Tests --------------------------------------------------------------------
