// SPDX-License-Identifier: MIT
//
// PDF composer — turn a decoded raster image into a one-page PDF using
// `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialized via
// `PdfDocument::save()`.

use image::DynamicImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use quire_core::error::Result;
use tracing::{debug, instrument};

const MM_PER_INCH: f32 = 25.4;

/// Composes single-page PDFs from raster images.
///
/// The page is sized to the image at the configured DPI, with the image
/// placed edge to edge — no fitting onto a fixed paper size.
pub struct PdfComposer {
    dpi: f32,
}

impl PdfComposer {
    pub fn new(dpi: f32) -> Self {
        Self { dpi }
    }

    /// Encode `image` as a one-page PDF and return the serialized bytes.
    ///
    /// The image is converted to opaque RGB first; callers that need alpha
    /// flattening semantics get them here unconditionally because the
    /// embedded encoding has no alpha channel.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn compose(&self, image: &DynamicImage, title: &str) -> Result<Vec<u8>> {
        let rgb = image.to_rgb8();
        let (width_px, height_px) = (rgb.width() as usize, rgb.height() as usize);

        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width: width_px,
            height: height_px,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };

        let mut doc = PdfDocument::new(title);
        let xobject_id = doc.add_image(&raw);

        let page_w = Mm(width_px as f32 / self.dpi * MM_PER_INCH);
        let page_h = Mm(height_px as f32 / self.dpi * MM_PER_INCH);

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(1.0),
                scale_y: Some(1.0),
                dpi: Some(self.dpi),
                rotate: None,
            },
        }];
        doc.with_pages(vec![PdfPage::new(page_w, page_h, ops)]);

        debug!(width_px, height_px, dpi = self.dpi, "Image page composed");

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        Ok(doc.save(&PdfSaveOptions::default(), &mut warnings))
    }
}

impl Default for PdfComposer {
    fn default() -> Self {
        Self::new(150.0)
    }
}
