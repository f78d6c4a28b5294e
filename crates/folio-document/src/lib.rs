// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-document — the composition engine behind Folio.
//
// Turns an ordered list of (image, rotation) items into one PDF: unit
// conversion, lossless quarter-turn rotation, per-page geometry for fixed paper
// sizes or fit-to-image pages, and JPEG-embedded page assembly.

pub mod compose;
pub mod integrity;
pub mod layout;
pub mod pdf;
pub mod raster;
pub mod sink;
pub mod units;

// Re-export the primary entry points so callers can use `folio_document::DocumentComposer` etc.
pub use compose::{ComposedDocument, DocumentComposer};
pub use integrity::hash_bytes;
pub use pdf::PdfAssembler;
pub use sink::{DocumentSink, FileSink};

// The cancellation type appears in the composer's signatures.
pub use tokio_util::sync::CancellationToken;
