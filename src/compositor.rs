use crate::buffer::{AlphaMask, RgbBuffer, RgbaBuffer};
use crate::error::{SnapdeckError, SnapdeckResult};

/// Merge an opaque RGB capture with a silhouette capture into straight-alpha
/// RGBA: a pixel is opaque wherever the silhouette's red channel is lit.
///
/// Pure: neither input is mutated; the only side effect is the output
/// allocation.
pub fn composite(rgb: &RgbBuffer, alpha_source: &RgbBuffer) -> SnapdeckResult<RgbaBuffer> {
    if rgb.width != alpha_source.width || rgb.height != alpha_source.height {
        return Err(SnapdeckError::validation(format!(
            "composite size mismatch: rgb {}x{}, alpha source {}x{}",
            rgb.width, rgb.height, alpha_source.width, alpha_source.height
        )));
    }
    let mut data = Vec::with_capacity(rgb.pixel_count() * 4);
    for (color, sil) in rgb.data.chunks_exact(3).zip(alpha_source.data.chunks_exact(3)) {
        data.extend_from_slice(color);
        data.push(if sil[0] > 0 { 255 } else { 0 });
    }
    RgbaBuffer::from_raw(rgb.width, rgb.height, data)
}

/// Merge an opaque RGB capture with a previously binarized [`AlphaMask`].
pub fn composite_with_mask(rgb: &RgbBuffer, mask: &AlphaMask) -> SnapdeckResult<RgbaBuffer> {
    if rgb.width != mask.width || rgb.height != mask.height {
        return Err(SnapdeckError::validation(format!(
            "composite size mismatch: rgb {}x{}, mask {}x{}",
            rgb.width, rgb.height, mask.width, mask.height
        )));
    }
    let mut data = Vec::with_capacity(rgb.pixel_count() * 4);
    for (color, &a) in rgb.data.chunks_exact(3).zip(mask.data.iter()) {
        data.extend_from_slice(color);
        data.push(a);
    }
    RgbaBuffer::from_raw(rgb.width, rgb.height, data)
}

/// Downscale to `target_width`, preserving aspect ratio
/// (`target_height = round(target_width * height / width)`) with a single
/// smooth triangle-filter resample pass.
///
/// The source is untouched, so one capture can feed several target widths.
pub fn downscale(src: &RgbaBuffer, target_width: u32) -> SnapdeckResult<RgbaBuffer> {
    if target_width == 0 {
        return Err(SnapdeckError::validation("target width must be non-zero"));
    }
    let target_height = ((f64::from(target_width) * f64::from(src.height))
        / f64::from(src.width))
    .round()
    .max(1.0) as u32;

    let img = image::RgbaImage::from_raw(src.width, src.height, src.data.clone())
        .ok_or_else(|| SnapdeckError::validation("rgba buffer does not form an image"))?;
    let resized = image::imageops::resize(
        &img,
        target_width,
        target_height,
        image::imageops::FilterType::Triangle,
    );
    RgbaBuffer::from_raw(target_width, target_height, resized.into_raw())
}

/// Linear interpolation between two same-sized RGBA buffers: `t = 0` returns
/// `a`, `t = 1` returns `b`. Channels interpolate independently, straight
/// alpha included.
pub fn crossfade(a: &RgbaBuffer, b: &RgbaBuffer, t: f32) -> SnapdeckResult<RgbaBuffer> {
    if a.width != b.width || a.height != b.height {
        return Err(SnapdeckError::validation(format!(
            "crossfade size mismatch: {}x{} vs {}x{}",
            a.width, a.height, b.width, b.height
        )));
    }
    let t = t.clamp(0.0, 1.0);
    let mut data = Vec::with_capacity(a.data.len());
    for (&av, &bv) in a.data.iter().zip(b.data.iter()) {
        data.push(lerp_u8(av, bv, t));
    }
    RgbaBuffer::from_raw(a.width, a.height, data)
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8
}
