//! Shared response types for API handlers.

use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};

/// Content type used when the image header is not recognised.
pub const FALLBACK_IMAGE_TYPE: &str = "image/png";

/// Raw image bytes with a content type sniffed from the data itself.
#[derive(Debug, Clone)]
pub struct ImageResponse(pub Arc<[u8]>);

impl ImageResponse {
    /// MIME type of the payload, falling back to [`FALLBACK_IMAGE_TYPE`].
    pub fn content_type(&self) -> &'static str {
        image::guess_format(&self.0)
            .map(|format| format.to_mime_type())
            .unwrap_or(FALLBACK_IMAGE_TYPE)
    }
}

impl IntoResponse for ImageResponse {
    fn into_response(self) -> Response {
        let content_type = self.content_type();
        ([(CONTENT_TYPE, content_type)], self.0.to_vec()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_jpeg_header() {
        let bytes: Arc<[u8]> = Arc::from(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10][..]);
        assert_eq!(ImageResponse(bytes).content_type(), "image/jpeg");
    }

    #[test]
    fn sniffs_png_header() {
        let bytes: Arc<[u8]> = Arc::from(&b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"[..]);
        assert_eq!(ImageResponse(bytes).content_type(), "image/png");
    }

    #[test]
    fn unknown_bytes_fall_back_to_png() {
        let bytes: Arc<[u8]> = Arc::from(&b"not an image"[..]);
        assert_eq!(ImageResponse(bytes).content_type(), FALLBACK_IMAGE_TYPE);
    }
}
