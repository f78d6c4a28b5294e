// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unit conversion between source pixels, millimetres and PDF points.

use folio_core::error::{FolioError, Result};

/// Reference resolution at which one source pixel maps to physical length.
pub const REFERENCE_DPI: f32 = 96.0;

pub const MM_PER_INCH: f32 = 25.4;

/// PDF user-space units (points) per inch.
pub const PT_PER_INCH: f32 = 72.0;

/// Convert a pixel measurement to millimetres at [`REFERENCE_DPI`].
///
/// Negative or non-finite input is rejected.
pub fn pixels_to_mm(pixels: f32) -> Result<f32> {
    if !pixels.is_finite() || pixels < 0.0 {
        return Err(FolioError::InvalidArgument(format!(
            "pixel measurement must be finite and non-negative, got {pixels}"
        )));
    }
    Ok(pixels * MM_PER_INCH / REFERENCE_DPI)
}

pub fn mm_to_pt(mm: f32) -> f32 {
    mm * PT_PER_INCH / MM_PER_INCH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_inch_of_pixels_is_one_inch() {
        assert_eq!(pixels_to_mm(96.0).unwrap(), 25.4);
        assert_eq!(pixels_to_mm(0.0).unwrap(), 0.0);
    }

    #[test]
    fn matches_legacy_factor() {
        let mm = pixels_to_mm(1000.0).unwrap();
        assert!((mm - 264.583).abs() < 1e-3, "got {mm}");
    }

    #[test]
    fn rejects_negative_and_non_finite() {
        for bad in [-1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                pixels_to_mm(bad),
                Err(FolioError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn a4_width_in_points() {
        assert!((mm_to_pt(210.0) - 595.276).abs() < 1e-2);
        assert!((mm_to_pt(25.4) - 72.0).abs() < 1e-4);
    }
}
