use image::ImageError;

use super::model::CoverArt;

/// Cover images are scaled down to fit this box.
pub const MAX_COVER_EDGE: u32 = 300;

/// Decode embedded picture bytes, shrinking anything larger than 300x300.
///
/// Aspect ratio is preserved; smaller images are kept at their size.
pub fn decode_cover(bytes: &[u8]) -> Result<CoverArt, ImageError> {
    let img = image::load_from_memory(bytes)?;

    let img = if img.width() > MAX_COVER_EDGE || img.height() > MAX_COVER_EDGE {
        img.thumbnail(MAX_COVER_EDGE, MAX_COVER_EDGE)
    } else {
        img
    };

    let rgba = img.to_rgba8();
    Ok(CoverArt {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}
