// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output sinks — where a finished document goes.
//
// The engine never decides how an artifact reaches the user. Callers hand in a
// sink; the composer delivers exactly one complete document to it, or nothing.

use std::path::{Path, PathBuf};

use folio_core::error::Result;
use tracing::info;

/// Receives one finished PDF byte-stream.
pub trait DocumentSink {
    fn deliver(&mut self, document: &[u8]) -> Result<()>;
}

/// Return-as-buffer: the document is appended to the vector.
impl DocumentSink for Vec<u8> {
    fn deliver(&mut self, document: &[u8]) -> Result<()> {
        self.extend_from_slice(document);
        Ok(())
    }
}

/// Save-to-disk.
///
/// Bytes are written to a sibling `.part` file first and renamed into place,
/// so a reader never sees a truncated PDF at `path`.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn partial_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".part");
        self.path.with_file_name(name)
    }
}

impl DocumentSink for FileSink {
    fn deliver(&mut self, document: &[u8]) -> Result<()> {
        let partial = self.partial_path();
        std::fs::write(&partial, document)?;
        if let Err(err) = std::fs::rename(&partial, &self.path) {
            let _ = std::fs::remove_file(&partial);
            return Err(err.into());
        }
        info!(path = %self.path.display(), bytes = document.len(), "PDF written");
        Ok(())
    }
}
