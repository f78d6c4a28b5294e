// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — builds a multi-page document of full-page JPEG images with `lopdf`.
//
// Each page gets its own image XObject holding the JPEG stream untouched
// (`DCTDecode`), so the output size is bounded by the re-encode quality rather
// than by raw pixel counts. The page tree is written once, in `finish`.

use folio_core::PagePlan;
use folio_core::error::{FolioError, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use tracing::{debug, info, instrument};

use crate::raster::EncodedImage;
use crate::units::mm_to_pt;

/// Resource name under which each page refers to its image.
const IMAGE_RESOURCE: &str = "Im0";

/// Accumulates pages for one output document.
///
/// Pages appear in the final file in the order `add_page` was called. The
/// assembler is consumed by [`PdfAssembler::finish`], so a document can only be
/// serialised once.
pub struct PdfAssembler {
    document: Document,
    /// Reserved id of the page tree root; filled in by `finish`.
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    title: String,
}

impl PdfAssembler {
    pub fn new(title: impl Into<String>) -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            page_ids: Vec::new(),
            title: title.into(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    // -- Pages ----------------------------------------------------------------

    /// Append one page sized per `plan`, with `image` drawn into the plan's
    /// draw rectangle.
    #[instrument(skip(self, plan, image), fields(page = self.page_ids.len(), jpeg_len = image.data.len()))]
    pub fn add_page(&mut self, plan: &PagePlan, image: EncodedImage) -> Result<ObjectId> {
        let image_id = self.document.add_object(
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(image.width),
                    "Height" => i64::from(image.height),
                    "ColorSpace" => image.color_space.pdf_name(),
                    "BitsPerComponent" => 8i64,
                    "Filter" => "DCTDecode",
                },
                image.data,
            )
            .with_compression(false),
        );

        // PDF user space is y-up, the plan measures from the top edge.
        let draw_w = mm_to_pt(plan.draw_width_mm);
        let draw_h = mm_to_pt(plan.draw_height_mm);
        let draw_x = mm_to_pt(plan.draw_x_mm);
        let draw_y = mm_to_pt(plan.draw_y_from_bottom_mm());

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        draw_w.into(),
                        Object::Integer(0),
                        Object::Integer(0),
                        draw_h.into(),
                        draw_x.into(),
                        draw_y.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_bytes = content.encode().map_err(|err| {
            FolioError::PdfError(format!("failed to encode page content: {err}"))
        })?;
        let content_id = self
            .document
            .add_object(Stream::new(dictionary! {}, content_bytes));

        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                mm_to_pt(plan.page_width_mm).into(),
                mm_to_pt(plan.page_height_mm).into(),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    IMAGE_RESOURCE => image_id,
                },
            },
        });

        self.page_ids.push(page_id);
        debug!(
            page_w_pt = mm_to_pt(plan.page_width_mm),
            page_h_pt = mm_to_pt(plan.page_height_mm),
            draw_x,
            draw_y,
            draw_w,
            draw_h,
            "Page appended"
        );
        Ok(page_id)
    }

    // -- Output ---------------------------------------------------------------

    /// Write the page tree, catalog and info dictionary and serialise the
    /// document.
    #[instrument(skip(self), fields(pages = self.page_ids.len()))]
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.page_ids.is_empty() {
            return Err(FolioError::InvalidArgument(
                "a PDF needs at least one page".into(),
            ));
        }

        let kids: Vec<Object> = self.page_ids.iter().copied().map(Object::Reference).collect();
        let count = kids.len() as i64;
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.document.add_object(dictionary! {
            "Title" => Object::string_literal(self.title.as_str()),
            "Producer" => Object::string_literal("Folio"),
        });
        self.document.trailer.set("Root", catalog_id);
        self.document.trailer.set("Info", info_id);

        let mut output = Vec::new();
        self.document
            .save_to(&mut output)
            .map_err(|err| FolioError::PdfError(format!("failed to serialise PDF: {err}")))?;

        info!(pages = count, bytes = output.len(), "PDF assembled");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{JpegColorSpace, encode_jpeg, rotate};
    use folio_core::{Orientation, Rotation};
    use image::{DynamicImage, Rgb, RgbImage};

    fn encoded(width: u32, height: u32) -> EncodedImage {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 200, 30])));
        encode_jpeg(&rotate(img, Rotation::Deg0), 95, 0).expect("encode")
    }

    fn plan(page_w: f32, page_h: f32) -> PagePlan {
        PagePlan {
            page_width_mm: page_w,
            page_height_mm: page_h,
            orientation: Orientation::from_dimensions(page_w, page_h),
            draw_x_mm: 10.0,
            draw_y_mm: 10.0,
            draw_width_mm: page_w - 20.0,
            draw_height_mm: page_h - 20.0,
        }
    }

    fn media_box(doc: &Document, page_id: ObjectId) -> Vec<f32> {
        doc.get_dictionary(page_id)
            .expect("page dict")
            .get(b"MediaBox")
            .expect("media box")
            .as_array()
            .expect("array")
            .iter()
            .map(|value| value.as_float().expect("number"))
            .collect()
    }

    #[test]
    fn pages_keep_insertion_order_and_size() {
        let mut assembler = PdfAssembler::new("Test");
        assembler.add_page(&plan(210.0, 297.0), encoded(8, 4)).unwrap();
        assembler.add_page(&plan(100.0, 50.0), encoded(4, 8)).unwrap();
        assert_eq!(assembler.page_count(), 2);
        let bytes = assembler.finish().expect("finish");

        let doc = Document::load_mem(&bytes).expect("reload");
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);

        let first = media_box(&doc, pages[&1]);
        assert!((first[2] - mm_to_pt(210.0)).abs() < 0.01);
        assert!((first[3] - mm_to_pt(297.0)).abs() < 0.01);
        let second = media_box(&doc, pages[&2]);
        assert!((second[2] - mm_to_pt(100.0)).abs() < 0.01);
        assert!((second[3] - mm_to_pt(50.0)).abs() < 0.01);
    }

    #[test]
    fn images_are_embedded_as_jpeg() {
        let mut assembler = PdfAssembler::new("Test");
        let image = encoded(6, 3);
        assert_eq!(image.color_space, JpegColorSpace::Rgb);
        let jpeg = image.data.clone();
        assembler.add_page(&plan(210.0, 297.0), image).unwrap();
        let bytes = assembler.finish().unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let streams: Vec<&Stream> = doc
            .objects
            .values()
            .filter_map(|object| object.as_stream().ok())
            .filter(|stream| {
                stream
                    .dict
                    .get(b"Subtype")
                    .and_then(|value| value.as_name())
                    .map(|name| name == b"Image")
                    .unwrap_or(false)
            })
            .collect();
        assert_eq!(streams.len(), 1);
        let filter = streams[0].dict.get(b"Filter").unwrap().as_name().unwrap();
        assert_eq!(filter, b"DCTDecode");
        assert_eq!(streams[0].content, jpeg);
    }

    #[test]
    fn finish_without_pages_is_rejected() {
        let assembler = PdfAssembler::new("Empty");
        assert!(matches!(
            assembler.finish(),
            Err(FolioError::InvalidArgument(_))
        ));
    }
}
