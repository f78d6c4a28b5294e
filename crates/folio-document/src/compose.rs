// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document composer — drives decode, rotate, plan and append for every item.
//
// Items are processed in windows of `parallelism`. Within a window, decode,
// rotation and JPEG re-encoding fan out over a rayon pool; the results are
// collected back in input order and appended one by one, so page N is always
// item N. Cancellation is observed before each window and before each append.
// A run either produces one complete document or an error, never both.

use std::sync::Arc;

use folio_core::error::{FolioError, Result};
use folio_core::{ComposerConfig, PageFormat, PageItem, PagePlan};
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::integrity::hash_bytes;
use crate::layout;
use crate::pdf::PdfAssembler;
use crate::raster::{self, EncodedImage};
use crate::sink::DocumentSink;

/// A finished, immutable PDF artifact and the plan of every page in it.
#[derive(Debug, Clone)]
pub struct ComposedDocument {
    bytes: Vec<u8>,
    pages: Vec<PagePlan>,
    sha256: String,
}

impl ComposedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page plans in output order.
    pub fn pages(&self) -> &[PagePlan] {
        &self.pages
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// SHA-256 of the PDF bytes, lowercase hex.
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    pub fn deliver(&self, sink: &mut dyn DocumentSink) -> Result<()> {
        sink.deliver(&self.bytes)
    }
}

/// Work done off the joining thread for one item.
struct PreparedItem {
    index: usize,
    image: EncodedImage,
}

/// Composes ordered page items into a single PDF.
///
/// Cloning is cheap; clones share the worker pool.
#[derive(Clone)]
pub struct DocumentComposer {
    config: ComposerConfig,
    pool: Arc<rayon::ThreadPool>,
}

impl DocumentComposer {
    pub fn new(config: ComposerConfig) -> Result<Self> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.effective_parallelism())
            .thread_name(|n| format!("folio-decode-{n}"))
            .build()
            .map_err(|err| FolioError::Worker(format!("failed to start decode pool: {err}")))?;
        Ok(Self {
            config,
            pool: Arc::new(pool),
        })
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    // -- Composition ----------------------------------------------------------

    /// Compose `items` into one document using `format` for every page.
    ///
    /// Empty input is rejected before any work starts.
    pub fn compose(
        &self,
        items: &[PageItem],
        format: &PageFormat,
        cancel: &CancellationToken,
    ) -> Result<ComposedDocument> {
        self.compose_with_progress(items, format, cancel, |_| {})
    }

    /// Like [`DocumentComposer::compose`], calling `on_page` with the number of
    /// pages appended so far after each page lands in the document.
    #[instrument(
        skip(self, items, format, cancel, on_page),
        fields(items = items.len(), format = %format)
    )]
    pub fn compose_with_progress(
        &self,
        items: &[PageItem],
        format: &PageFormat,
        cancel: &CancellationToken,
        mut on_page: impl FnMut(usize),
    ) -> Result<ComposedDocument> {
        if items.is_empty() {
            return Err(FolioError::InvalidArgument(
                "at least one image is required to build a document".into(),
            ));
        }

        let window = self.config.effective_parallelism();
        let quality = self.config.jpeg_quality;
        info!(window, quality, "Composing document");

        let mut assembler = PdfAssembler::new(self.config.title.as_str());
        let mut pages: Vec<PagePlan> = Vec::with_capacity(items.len());

        for (window_index, chunk) in items.chunks(window).enumerate() {
            ensure_not_cancelled(cancel, pages.len())?;

            let base = window_index * window;
            let prepared: Vec<Result<PreparedItem>> = self.pool.install(|| {
                chunk
                    .par_iter()
                    .enumerate()
                    .map(|(offset, item)| prepare_item(item, base + offset, quality, cancel))
                    .collect()
            });

            for result in prepared {
                ensure_not_cancelled(cancel, pages.len())?;
                let prepared = result?;
                let plan = layout::plan(prepared.image.width, prepared.image.height, format)?;
                debug_assert_eq!(prepared.index, pages.len());
                assembler.add_page(&plan, prepared.image)?;
                pages.push(plan);
                on_page(pages.len());
            }
        }

        ensure_not_cancelled(cancel, pages.len())?;
        let bytes = assembler.finish()?;
        let sha256 = hash_bytes(&bytes);
        info!(pages = pages.len(), bytes = bytes.len(), %sha256, "Document composed");

        Ok(ComposedDocument {
            bytes,
            pages,
            sha256,
        })
    }

    /// Compose and hand the finished document to `sink`. Nothing reaches the
    /// sink if composition fails.
    pub fn compose_into(
        &self,
        items: &[PageItem],
        format: &PageFormat,
        cancel: &CancellationToken,
        sink: &mut dyn DocumentSink,
    ) -> Result<ComposedDocument> {
        let document = self.compose(items, format, cancel)?;
        document.deliver(sink)?;
        Ok(document)
    }

    /// Run [`DocumentComposer::compose`] on tokio's blocking pool.
    pub async fn compose_async(
        &self,
        items: Vec<PageItem>,
        format: PageFormat,
        cancel: CancellationToken,
    ) -> Result<ComposedDocument> {
        let composer = self.clone();
        tokio::task::spawn_blocking(move || composer.compose(&items, &format, &cancel))
            .await
            .map_err(|err| FolioError::Worker(format!("composition task failed: {err}")))?
    }
}

/// Decode, rotate and re-encode one item. Runs on a pool worker.
fn prepare_item(
    item: &PageItem,
    index: usize,
    quality: u8,
    cancel: &CancellationToken,
) -> Result<PreparedItem> {
    if cancel.is_cancelled() {
        return Err(FolioError::Cancelled { completed: 0 });
    }
    let decoded = raster::decode(&item.image, index)?;
    let rotated = raster::rotate(decoded, item.rotation);
    let image = raster::encode_jpeg(&rotated, quality, index)?;
    debug!(index, width = image.width, height = image.height, "Item prepared");
    Ok(PreparedItem { index, image })
}

fn ensure_not_cancelled(cancel: &CancellationToken, completed: usize) -> Result<()> {
    if cancel.is_cancelled() {
        warn!(completed, "Composition cancelled");
        return Err(FolioError::Cancelled { completed });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{PaperSize, Rotation, SourceImage};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    fn png(width: u32, height: u32) -> SourceImage {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([90, 90, 200])));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("encode png");
        SourceImage::new(bytes)
    }

    fn composer(parallelism: usize) -> DocumentComposer {
        DocumentComposer::new(ComposerConfig {
            parallelism,
            ..ComposerConfig::default()
        })
        .expect("composer")
    }

    #[test]
    fn one_page_per_item() {
        let items: Vec<PageItem> = (0..5)
            .map(|i| PageItem::new(png(10 + i, 20), Rotation::Deg0))
            .collect();
        let document = composer(2)
            .compose(&items, &PageFormat::Fixed(PaperSize::A4), &CancellationToken::new())
            .expect("compose");
        assert_eq!(document.page_count(), 5);
        assert!(document.bytes().starts_with(b"%PDF-1.5"));
        assert_eq!(document.sha256(), hash_bytes(document.bytes()));
    }

    #[test]
    fn rotation_changes_fit_page_orientation() {
        let items = vec![
            PageItem::new(png(40, 20), Rotation::Deg0),
            PageItem::new(png(40, 20), Rotation::Deg90),
        ];
        let document = composer(1)
            .compose(&items, &PageFormat::FitToImage, &CancellationToken::new())
            .expect("compose");
        let pages = document.pages();
        assert!(pages[0].page_width_mm > pages[0].page_height_mm);
        assert!(pages[1].page_width_mm < pages[1].page_height_mm);
        assert_eq!(pages[0].page_width_mm, pages[1].page_height_mm);
    }

    #[test]
    fn empty_input_is_rejected() {
        let result = composer(1).compose(&[], &PageFormat::FitToImage, &CancellationToken::new());
        assert!(matches!(result, Err(FolioError::InvalidArgument(_))));
    }

    #[test]
    fn cancelled_token_produces_no_document() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let items = vec![PageItem::new(png(4, 4), Rotation::Deg0)];
        let result = composer(1).compose(&items, &PageFormat::FitToImage, &cancel);
        assert!(matches!(result, Err(FolioError::Cancelled { completed: 0 })));
    }

    fn items(count: u32) -> Vec<PageItem> {
        (0..count)
            .map(|i| PageItem::new(png(6 + i, 6), Rotation::Deg0))
            .collect()
    }

    #[test]
    fn cancel_between_windows_stops_after_appended_pages() {
        let cancel = CancellationToken::new();
        let result = composer(1).compose_with_progress(
            &items(4),
            &PageFormat::FitToImage,
            &cancel,
            |appended| {
                if appended == 2 {
                    cancel.cancel();
                }
            },
        );
        assert!(matches!(result, Err(FolioError::Cancelled { completed: 2 })));
    }

    #[test]
    fn cancel_inside_a_window_stops_before_next_append() {
        let cancel = CancellationToken::new();
        let result = composer(3).compose_with_progress(
            &items(6),
            &PageFormat::Fixed(PaperSize::Letter),
            &cancel,
            |appended| {
                if appended == 1 {
                    cancel.cancel();
                }
            },
        );
        assert!(matches!(result, Err(FolioError::Cancelled { completed: 1 })));
    }

    #[test]
    fn progress_reports_every_page_in_order() {
        let mut seen = Vec::new();
        let document = composer(2)
            .compose_with_progress(
                &items(5),
                &PageFormat::FitToImage,
                &CancellationToken::new(),
                |appended| seen.push(appended),
            )
            .expect("compose");
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
        assert_eq!(document.page_count(), 5);
    }

    #[test]
    fn failed_run_leaves_sink_untouched() {
        let items = vec![
            PageItem::new(png(4, 4), Rotation::Deg0),
            PageItem::new(SourceImage::new(b"garbage".to_vec()), Rotation::Deg0),
        ];
        let mut sink: Vec<u8> = Vec::new();
        let result = composer(2).compose_into(
            &items,
            &PageFormat::FitToImage,
            &CancellationToken::new(),
            &mut sink,
        );
        assert_eq!(result.unwrap_err().item_index(), Some(1));
        assert!(sink.is_empty());
    }

    #[test]
    fn invalid_quality_is_rejected_up_front() {
        let config = ComposerConfig {
            jpeg_quality: 101,
            ..ComposerConfig::default()
        };
        assert!(matches!(
            DocumentComposer::new(config),
            Err(FolioError::InvalidArgument(_))
        ));
    }
}
