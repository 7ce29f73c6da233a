//! Image decoding via the `image` crate

use image::{DynamicImage, ImageReader};
use std::path::Path;

use crate::error::AnalysisError;
use crate::media::ImageBuffer;

/// Decode an image file, sniffing the format from its content
pub fn load<P: AsRef<Path>>(path: P) -> Result<ImageBuffer, AnalysisError> {
    let path = path.as_ref();
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader.format().map(|f| format!("{:?}", f).to_lowercase());
    let img = reader.decode()?;

    let mut buffer = from_dynamic(img);
    buffer.format = format;
    log::debug!(
        "Decoded {}: {}x{}x{}",
        path.display(),
        buffer.width,
        buffer.height,
        buffer.channels
    );
    Ok(buffer)
}

/// Flatten a decoded image to 8-bit samples, keeping its channel layout
///
/// Deeper images are reduced to 8 bits per sample, so their original LSBs
/// are not what the LSB detector sees.
pub fn from_dynamic(img: DynamicImage) -> ImageBuffer {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let channels = img.color().channel_count() as usize;

    let (channels, data) = match channels {
        1 => (1, img.into_luma8().into_raw()),
        2 => (2, img.into_luma_alpha8().into_raw()),
        3 => (3, img.into_rgb8().into_raw()),
        _ => (4, img.into_rgba8().into_raw()),
    };

    ImageBuffer::new(width, height, channels, data)
}
