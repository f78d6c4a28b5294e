// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster module — decode, quarter-turn rotation, and JPEG re-encoding for embedding.

pub mod processor;

pub use processor::{EncodedImage, JpegColorSpace, RotatedRaster, decode, encode_jpeg, rotate};
