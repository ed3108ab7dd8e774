use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::VgcResult;
use crate::foundation::hash::{KeyWriter, StructuralKey};

/// Encoded raster image blob (PNG, JPEG, ...) with its intrinsic size.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageData {
    /// Intrinsic width in pixels.
    pub width: u32,
    /// Intrinsic height in pixels.
    pub height: u32,
    /// Encoded bytes, passed to the renderer untouched.
    pub bytes: Arc<[u8]>,
}

impl ImageData {
    /// Wrap an encoded blob whose size is already known.
    pub fn new(width: u32, height: u32, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            bytes: bytes.into(),
        }
    }

    /// Wrap an encoded blob, probing its header for the intrinsic size.
    pub fn from_encoded(bytes: impl Into<Arc<[u8]>>) -> VgcResult<Self> {
        let bytes: Arc<[u8]> = bytes.into();
        let (width, height) = image::ImageReader::new(Cursor::new(&bytes[..]))
            .with_guessed_format()
            .context("guess image format")?
            .into_dimensions()
            .context("read image dimensions")?;
        Ok(Self {
            width,
            height,
            bytes,
        })
    }
}

impl StructuralKey for ImageData {
    fn write_key(&self, w: &mut KeyWriter) {
        w.write_u32(self.width);
        w.write_u32(self.height);
        w.write_len(self.bytes.len());
        w.write_bytes(&self.bytes);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/image.rs"]
mod tests;
