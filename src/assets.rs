//! Image assets – floor plans, building renders and logos arrive as absolute
//! filesystem paths and are inlined into the HTML as base64 data URIs, so the
//! composed document is self-contained.

use std::fs;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use image::ImageFormat;

/// Read the image at `path` and return a `data:image/...;base64,...` URI.
///
/// Values that are already data URIs pass through. Missing files, unreadable
/// files and unsupported formats are logged and yield `None`, so the template
/// simply omits the image.
pub fn embed_image(path: &str) -> Option<String> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    if path.starts_with("data:") {
        return Some(path.to_string());
    }

    let bytes = match fs::read(Path::new(path)) {
        Ok(b) => b,
        Err(e) => {
            log::warn!("Skipping image {path:?}: {e}");
            return None;
        }
    };

    let mime = match image::guess_format(&bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(other) => {
            log::warn!("Skipping image {path:?}: unsupported format {other:?}");
            return None;
        }
        Err(e) => {
            log::warn!("Skipping image {path:?}: {e}");
            return None;
        }
    };

    log::debug!("Embedded {path:?} ({} bytes, {mime})", bytes.len());
    Some(format!("data:{mime};base64,{}", BASE64_STD.encode(&bytes)))
}

/// Embed an optional path; convenience for context fields.
pub fn embed_optional(path: Option<&str>) -> Option<String> {
    path.and_then(embed_image)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1×1 transparent PNG.
    const PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

    #[test]
    fn embeds_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.png");
        std::fs::write(&path, BASE64_STD.decode(PIXEL_PNG).unwrap()).unwrap();

        let uri = embed_image(path.to_str().unwrap()).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
        assert!(uri.ends_with(PIXEL_PNG));
    }

    #[test]
    fn missing_file_is_skipped() {
        assert!(embed_image("/definitely/not/here.png").is_none());
        assert!(embed_optional(None).is_none());
    }

    #[test]
    fn non_image_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "not an image").unwrap();
        assert!(embed_image(path.to_str().unwrap()).is_none());
    }

    #[test]
    fn data_uri_passes_through() {
        let uri = format!("data:image/png;base64,{PIXEL_PNG}");
        assert_eq!(embed_image(&uri), Some(uri.clone()));
    }
}
