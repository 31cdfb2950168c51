use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageFormat};

pub const TARGET_WIDTH: u32 = 1080;
pub const TARGET_HEIGHT: u32 = 1920;

/// A poster ready to be written: encoded bytes and the format they are in.
#[derive(Debug)]
pub struct NormalizedPoster {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

/// Output format for a poster: the one named by `extension` when the
/// encoder supports it, otherwise whatever the downloaded bytes are.
pub fn output_format(
    extension: Option<&str>,
    data: &[u8],
) -> Result<ImageFormat, ImageError> {
    if let Some(format) = extension
        .and_then(ImageFormat::from_extension)
        .filter(ImageFormat::writing_enabled)
    {
        return Ok(format);
    }
    image::guess_format(data)
}

/// Decode `data`, stretch it to the poster resolution with Lanczos3 and
/// re-encode it as `format`.
pub fn normalize(
    data: &[u8],
    format: ImageFormat,
) -> Result<NormalizedPoster, ImageError> {
    let decoded = image::load_from_memory(data)?;
    let mut resized =
        decoded.resize_exact(TARGET_WIDTH, TARGET_HEIGHT, FilterType::Lanczos3);

    // The JPEG encoder rejects alpha channels.
    if format == ImageFormat::Jpeg && resized.color().has_alpha() {
        resized = DynamicImage::ImageRgb8(resized.into_rgb8());
    }

    let mut out = Cursor::new(Vec::new());
    resized.write_to(&mut out, format)?;

    Ok(NormalizedPoster {
        bytes: out.into_inner(),
        format,
    })
}
