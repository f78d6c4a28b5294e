// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Folio.

use thiserror::Error;

use crate::types::ImageId;

/// Top-level error type for all Folio operations.
///
/// Any error raised while composing aborts the whole run; no partial document
/// is ever handed back alongside one of these.
#[derive(Debug, Error)]
pub enum FolioError {
    // -- Contract violations --
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // -- Per-item pipeline errors --
    #[error("item {index} ({image}) could not be decoded: {reason}")]
    Decode {
        index: usize,
        image: ImageId,
        reason: String,
    },

    #[error("item {index} could not be re-encoded for embedding: {reason}")]
    Encoding { index: usize, reason: String },

    // -- Run control --
    #[error("composition cancelled after {completed} page(s)")]
    Cancelled { completed: usize },

    #[error("worker failed: {0}")]
    Worker(String),

    // -- Output --
    #[error("PDF assembly failed: {0}")]
    PdfError(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FolioError {
    /// Position of the input item that caused the failure, if the error is
    /// tied to one.
    pub fn item_index(&self) -> Option<usize> {
        match self {
            Self::Decode { index, .. } | Self::Encoding { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FolioError>;
