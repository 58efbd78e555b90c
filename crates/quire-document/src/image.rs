// SPDX-License-Identifier: MIT
//
// Image loading and color-model normalization using the `image` crate.
//
// Downstream single-page PDF encoding and JPG output support neither palette
// nor alpha-bearing color models, so anything that is not already opaque RGB
// is flattened before it leaves this module.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat as EncodeFormat};
use quire_core::error::{QuireError, Result};
use quire_core::types::ImageFormat;
use tracing::{debug, instrument};

/// One decoded raster image, typically a page.
#[derive(Debug)]
pub struct PageImage {
    image: DynamicImage,
}

impl PageImage {
    /// Decode an image file. Palette formats are expanded by the decoder.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let image = image::open(path_ref).map_err(|err| {
            QuireError::Image(format!("failed to decode {}: {}", path_ref.display(), err))
        })?;
        debug!(width = image.width(), height = image.height(), "Image decoded");
        Ok(Self { image })
    }

    /// Wrap an already-decoded image.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Whether the current color model carries an alpha channel.
    pub fn has_alpha(&self) -> bool {
        self.image.color().has_alpha()
    }

    /// Flatten to an opaque 8-bit RGB model. No-op if already there.
    pub fn into_opaque_rgb(self) -> Self {
        if matches!(self.image, DynamicImage::ImageRgb8(_)) {
            return self;
        }
        Self {
            image: DynamicImage::ImageRgb8(self.image.to_rgb8()),
        }
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Write the image to `path` in the given split-artifact format.
    ///
    /// JPG output is always encoded from opaque RGB; `jpeg_quality` is the
    /// 1-100 encoder quality.
    pub fn save(&self, path: impl AsRef<Path>, format: ImageFormat, jpeg_quality: u8) -> Result<()> {
        let path_ref = path.as_ref();
        match format {
            ImageFormat::Png => self
                .image
                .save_with_format(path_ref, EncodeFormat::Png)
                .map_err(|err| {
                    QuireError::Image(format!(
                        "failed to save {}: {}",
                        path_ref.display(),
                        err
                    ))
                }),
            ImageFormat::Jpg => {
                let rgb = self.image.to_rgb8();
                let file = File::create(path_ref)?;
                let mut writer = BufWriter::new(file);
                let encoder = JpegEncoder::new_with_quality(&mut writer, jpeg_quality);
                rgb.write_with_encoder(encoder).map_err(|err| {
                    QuireError::Image(format!(
                        "failed to save {}: {}",
                        path_ref.display(),
                        err
                    ))
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn rgba_fixture() -> PageImage {
        PageImage::from_dynamic(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            4,
            4,
            Rgba([10, 20, 30, 100]),
        )))
    }

    #[test]
    fn flattening_drops_alpha() {
        let img = rgba_fixture();
        assert!(img.has_alpha());
        let flat = img.into_opaque_rgb();
        assert!(!flat.has_alpha());
        assert_eq!(flat.width(), 4);
    }

    #[test]
    fn jpg_round_trip_is_opaque() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.jpg");
        rgba_fixture().save(&path, ImageFormat::Jpg, 90).unwrap();

        let reopened = PageImage::open(&path).unwrap();
        assert!(!reopened.has_alpha());
    }

    #[test]
    fn png_round_trip_preserves_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        rgba_fixture().save(&path, ImageFormat::Png, 90).unwrap();

        let reopened = PageImage::open(&path).unwrap();
        assert_eq!((reopened.width(), reopened.height()), (4, 4));
    }

    #[test]
    fn unreadable_file_is_an_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let err = PageImage::open(&path).unwrap_err();
        assert!(matches!(err, QuireError::Image(_)));
    }
}
