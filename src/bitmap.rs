//! Page buffer contract.
//!
//! The device consumes 24-bit packed BGR rows with the stride rounded up
//! to a 4-byte boundary. Producing a buffer (resampling, color management)
//! is the caller's business; this module only pins down the layout and
//! offers the packing step from a plain RGB buffer.

use crate::error::Error;
use crate::paper::PaperProfile;

pub const BYTES_PER_PIXEL: usize = 3;

/// Row stride in bytes for a given pixel width, 4-byte aligned.
pub fn row_stride(width: u32) -> usize {
    (width as usize * BYTES_PER_PIXEL + 3) / 4 * 4
}

/// A page image in the exact layout the device consumes.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
}

impl ImageBuffer {
    /// Wrap an already packed BGR buffer.
    ///
    /// `data` must hold `row_stride(width) * height` bytes.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::Validation("image dimensions must be non-zero".to_string()));
        }
        let stride = row_stride(width);
        let expected = stride * height as usize;
        if data.len() != expected {
            return Err(Error::Validation(format!(
                "image buffer is {} bytes, {}x{} needs {} (stride {})",
                data.len(),
                width,
                height,
                expected,
                stride
            )));
        }
        Ok(ImageBuffer {
            width,
            height,
            stride,
            data,
        })
    }

    /// Pack a tightly packed RGB buffer (`width * height * 3` bytes) into
    /// the padded BGR layout.
    pub fn from_rgb(width: u32, height: u32, rgb: &[u8]) -> Result<Self, Error> {
        if rgb.len() != width as usize * height as usize * BYTES_PER_PIXEL {
            return Err(Error::Validation(format!(
                "RGB data is {} bytes, expected {}x{}x3",
                rgb.len(),
                width,
                height
            )));
        }
        let stride = row_stride(width);
        let mut data = vec![0u8; stride * height as usize];
        for y in 0..height as usize {
            for x in 0..width as usize {
                let src = (y * width as usize + x) * BYTES_PER_PIXEL;
                let dst = y * stride + x * BYTES_PER_PIXEL;
                data[dst] = rgb[src + 2];
                data[dst + 1] = rgb[src + 1];
                data[dst + 2] = rgb[src];
            }
        }
        Self::new(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether this buffer has the exact pixel dimensions the profile
    /// prints at.
    pub fn matches_profile(&self, profile: &PaperProfile) -> bool {
        (self.width, self.height) == profile.pixel_dimensions()
    }
}

/// Turns a request's source images into the single page buffer a sheet
/// submission consumes.
///
/// The output must match the profile's exact pixel dimensions; how the
/// pixels get there (resampling, split-layout compositing, color
/// management) is the implementor's business and out of scope here.
pub trait ImagePreparer {
    fn prepare_page(
        &self,
        images: &[ImageBuffer],
        profile: &PaperProfile,
    ) -> Result<ImageBuffer, Error>;
}

/// Preparer for plain one-image jobs: the supplied buffer is the page.
///
/// Split layouts need an external compositor and are rejected here.
#[derive(Debug, Default, Clone, Copy)]
pub struct SinglePagePreparer;

impl ImagePreparer for SinglePagePreparer {
    fn prepare_page(
        &self,
        images: &[ImageBuffer],
        profile: &PaperProfile,
    ) -> Result<ImageBuffer, Error> {
        if profile.paper.is_split() {
            return Err(Error::Validation(
                "split layouts need a compositing image preparer".to_string(),
            ));
        }
        match images {
            [page] if page.matches_profile(profile) => Ok(page.clone()),
            [page] => Err(Error::Validation(format!(
                "page is {}x{}, profile needs {:?}",
                page.width(),
                page.height(),
                profile.pixel_dimensions()
            ))),
            _ => Err(Error::Validation(format!(
                "expected one image, got {}",
                images.len()
            ))),
        }
    }
}
