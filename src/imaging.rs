use crate::error::{GenerationError, Result};
use image::{DynamicImage, ImageFormat};

#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
}

/// Validate that `bytes` are a well-formed raster image.
///
/// The format is sniffed from the payload; `declared_mime` is only used
/// when sniffing fails and the bytes still decode.
pub fn decode(bytes: &[u8], declared_mime: &str) -> Result<DecodedImage> {
    if bytes.is_empty() {
        return Err(GenerationError::Decode("image payload is empty".into()));
    }

    let format = image::guess_format(bytes).ok();
    let image = image::load_from_memory(bytes)
        .map_err(|e| GenerationError::Decode(format!("{} ({} bytes)", e, bytes.len())))?;

    let mime_type = format
        .map(|f: ImageFormat| f.to_mime_type().to_string())
        .unwrap_or_else(|| declared_mime.to_string());

    if mime_type != declared_mime {
        log::debug!(
            "Declared MIME type {} differs from sniffed {}",
            declared_mime,
            mime_type
        );
    }

    Ok(DecodedImage {
        width: image.width(),
        height: image.height(),
        image,
        mime_type,
    })
}

/// Encode a solid image as PNG bytes.
pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Result<Vec<u8>> {
    let buffer = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut cursor = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(buffer)
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| GenerationError::Decode(format!("failed to encode PNG: {}", e)))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_png() {
        let bytes = solid_png(10, 10, [200, 120, 40]).unwrap();
        let decoded = decode(&bytes, "image/png").unwrap();
        assert_eq!((decoded.width, decoded.height), (10, 10));
        assert_eq!(decoded.mime_type, "image/png");
    }

    #[test]
    fn test_sniffed_type_wins() {
        let bytes = solid_png(3, 2, [0, 0, 0]).unwrap();
        let decoded = decode(&bytes, "image/jpeg").unwrap();
        assert_eq!(decoded.mime_type, "image/png");
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let err = decode(b"definitely not a png", "image/png").unwrap_err();
        assert_eq!(err.kind(), "decode_error");
    }

    #[test]
    fn test_truncated_png_is_decode_error() {
        let bytes = solid_png(10, 10, [1, 2, 3]).unwrap();
        let err = decode(&bytes[..20], "image/png").unwrap_err();
        assert!(matches!(err, GenerationError::Decode(_)));
    }

    #[test]
    fn test_empty_is_decode_error() {
        assert!(matches!(
            decode(&[], "image/png"),
            Err(GenerationError::Decode(_))
        ));
    }
}
