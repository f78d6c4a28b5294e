// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page geometry planner — page size and image placement for a single page.
//
// Fixed paper sizes scale the image to fit inside a uniform margin, preserving
// aspect ratio and centring it. Fit-to-image pages take the image's own size
// at the reference resolution with no margin.

use folio_core::error::{FolioError, Result};
use folio_core::{Orientation, PageFormat, PagePlan, PaperSize};
use tracing::{debug, instrument};

use crate::units::pixels_to_mm;

/// Margin kept clear on all four sides of fixed-size pages, in millimetres.
pub const MARGIN_MM: f32 = 10.0;

/// Plan one page for a rotated raster of `width_px` x `height_px`.
#[instrument(level = "debug", skip(format), fields(format = %format))]
pub fn plan(width_px: u32, height_px: u32, format: &PageFormat) -> Result<PagePlan> {
    if width_px == 0 || height_px == 0 {
        return Err(FolioError::InvalidArgument(format!(
            "raster must have non-zero dimensions, got {width_px}x{height_px}"
        )));
    }

    let plan = match format {
        PageFormat::Fixed(paper) => plan_fixed(width_px, height_px, paper)?,
        PageFormat::FitToImage => plan_fit(width_px, height_px)?,
    };

    debug!(
        page_w = plan.page_width_mm,
        page_h = plan.page_height_mm,
        draw_x = plan.draw_x_mm,
        draw_y = plan.draw_y_mm,
        draw_w = plan.draw_width_mm,
        draw_h = plan.draw_height_mm,
        "Page planned"
    );
    Ok(plan)
}

fn plan_fixed(width_px: u32, height_px: u32, paper: &PaperSize) -> Result<PagePlan> {
    let (page_w, page_h) = paper.dimensions_mm();
    let available_w = page_w - 2.0 * MARGIN_MM;
    let available_h = page_h - 2.0 * MARGIN_MM;
    if !(available_w > 0.0 && available_h > 0.0) {
        return Err(FolioError::InvalidArgument(format!(
            "{} paper {page_w}x{page_h} mm leaves no room inside a {MARGIN_MM} mm margin",
            paper.name()
        )));
    }

    let image_ratio = width_px as f32 / height_px as f32;
    let available_ratio = available_w / available_h;

    let (draw_w, draw_h) = if image_ratio > available_ratio {
        (available_w, available_w / image_ratio)
    } else {
        (available_h * image_ratio, available_h)
    };

    Ok(PagePlan {
        page_width_mm: page_w,
        page_height_mm: page_h,
        orientation: Orientation::from_dimensions(page_w, page_h),
        draw_x_mm: (page_w - draw_w) / 2.0,
        draw_y_mm: (page_h - draw_h) / 2.0,
        draw_width_mm: draw_w,
        draw_height_mm: draw_h,
    })
}

fn plan_fit(width_px: u32, height_px: u32) -> Result<PagePlan> {
    let page_w = pixels_to_mm(width_px as f32)?;
    let page_h = pixels_to_mm(height_px as f32)?;
    Ok(PagePlan {
        page_width_mm: page_w,
        page_height_mm: page_h,
        orientation: Orientation::from_dimensions(page_w, page_h),
        draw_x_mm: 0.0,
        draw_y_mm: 0.0,
        draw_width_mm: page_w,
        draw_height_mm: page_h,
    })
}
