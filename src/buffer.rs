use crate::error::{SnapdeckError, SnapdeckResult};

/// Opaque RGB8 pixels read back from the render surface, row-major, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RgbBuffer {
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> SnapdeckResult<Self> {
        if width == 0 || height == 0 {
            return Err(SnapdeckError::validation(
                "rgb buffer width/height must be non-zero",
            ));
        }
        if data.len() != (width as usize) * (height as usize) * 3 {
            return Err(SnapdeckError::validation(format!(
                "rgb buffer data length {} does not match {}x{}x3",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Solid-fill constructor, mainly useful for tests and scripted hosts.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> SnapdeckResult<Self> {
        let px = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(px * 3);
        for _ in 0..px {
            data.extend_from_slice(&rgb);
        }
        Self::from_raw(width, height, data)
    }

    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

/// Straight-alpha RGBA8 pixels, row-major, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RgbaBuffer {
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> SnapdeckResult<Self> {
        if width == 0 || height == 0 {
            return Err(SnapdeckError::validation(
                "rgba buffer width/height must be non-zero",
            ));
        }
        if data.len() != (width as usize) * (height as usize) * 4 {
            return Err(SnapdeckError::validation(format!(
                "rgba buffer data length {} does not match {}x{}x4",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

/// One opacity byte per pixel: 255 where the subject covers the pixel, 0 elsewhere.
///
/// Produced once per captured instance by the silhouette pass and reused across
/// composites; the mask is a hard cut, never anti-aliased.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlphaMask {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl AlphaMask {
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> SnapdeckResult<Self> {
        if width == 0 || height == 0 {
            return Err(SnapdeckError::validation(
                "alpha mask width/height must be non-zero",
            ));
        }
        if data.len() != (width as usize) * (height as usize) {
            return Err(SnapdeckError::validation(format!(
                "alpha mask data length {} does not match {}x{}",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Binarize a silhouette capture: opaque wherever the red channel is lit.
    ///
    /// The silhouette pass renders the subject flat white on a black surface,
    /// so any non-zero red means coverage.
    pub fn binarize(silhouette: &RgbBuffer) -> Self {
        let mut data = Vec::with_capacity(silhouette.pixel_count());
        for px in silhouette.data.chunks_exact(3) {
            data.push(if px[0] > 0 { 255 } else { 0 });
        }
        Self {
            width: silhouette.width,
            height: silhouette.height,
            data,
        }
    }
}
