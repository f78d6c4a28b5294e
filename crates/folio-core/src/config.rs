// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Composer configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};
use crate::types::PageFormat;

/// Settings for one conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Title written into the PDF /Info dictionary.
    pub title: String,
    /// JPEG quality (1-100) used when embedding each page image.
    pub jpeg_quality: u8,
    /// Number of items decoded concurrently. Zero means one per available CPU.
    pub parallelism: usize,
    /// Page sizing policy applied to every page.
    pub page_format: PageFormat,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            title: "Converted Images".into(),
            jpeg_quality: 95,
            parallelism: 0,
            page_format: PageFormat::default(),
        }
    }
}

impl ComposerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(FolioError::InvalidArgument(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }

    /// Worker count after resolving `parallelism == 0`.
    pub fn effective_parallelism(&self) -> usize {
        if self.parallelism > 0 {
            return self.parallelism;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaperSize;

    #[test]
    fn defaults_match_reference_output() {
        let config = ComposerConfig::default();
        assert_eq!(config.jpeg_quality, 95);
        assert_eq!(config.page_format, PageFormat::Fixed(PaperSize::A4));
        assert!(config.validate().is_ok());
        assert!(config.effective_parallelism() >= 1);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = ComposerConfig::from_json_str(r#"{ "page_format": "fit" }"#).unwrap();
        assert_eq!(config.page_format, PageFormat::FitToImage);
        assert_eq!(config.jpeg_quality, 95);
        assert_eq!(config.title, "Converted Images");
    }

    #[test]
    fn rejects_out_of_range_quality() {
        let result = ComposerConfig::from_json_str(r#"{ "jpeg_quality": 0 }"#);
        assert!(matches!(result, Err(FolioError::InvalidArgument(_))));
    }

    #[test]
    fn rejects_unknown_page_format() {
        let result = ComposerConfig::from_json_str(r#"{ "page_format": "tabloid" }"#);
        assert!(matches!(result, Err(FolioError::Serialization(_))));
    }

    #[test]
    fn explicit_parallelism_wins() {
        let config = ComposerConfig {
            parallelism: 3,
            ..ComposerConfig::default()
        };
        assert_eq!(config.effective_parallelism(), 3);
    }
}
