//! Image processor - produces resized variations of an original image
//!
//! Resizes to a requested target height while preserving aspect ratio and
//! re-encodes as JPEG. Upscaling is rejected. CPU-intensive work goes
//! through `spawn_blocking` so the async runtime is never blocked.

use crate::error::{AppError, Result};
use bytes::Bytes;
use image::imageops::FilterType;
use image::{GenericImageView, ImageOutputFormat};
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

/// Result of a resize
#[derive(Debug)]
pub struct ProcessedImage {
    /// JPEG-encoded image data
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
}

/// Image processor
pub struct ImageProcessor {
    /// JPEG quality (0-100)
    quality: u8,
}

impl ImageProcessor {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }

    pub fn with_defaults() -> Self {
        Self::new(85)
    }

    /// Resize the given encoded image to `target_height`, preserving aspect
    /// ratio (blocking version).
    ///
    /// **Note:** decodes and resamples on the calling thread; from async
    /// code use [`ImageProcessor::resize_to_height_async`].
    pub fn resize_to_height(&self, original: &[u8], target_height: u32) -> Result<ProcessedImage> {
        if target_height == 0 {
            return Err(AppError::InvalidResize(
                "Target height must be positive".to_string(),
            ));
        }

        let img = image::load_from_memory(original)
            .map_err(|e| AppError::Internal(format!("Failed to decode image: {e}")))?;

        let (source_width, source_height) = img.dimensions();
        debug!(
            source_width,
            source_height, target_height, "Resizing image"
        );

        if target_height > source_height {
            return Err(AppError::InvalidResize(format!(
                "Requested height {target_height} exceeds source height {source_height}"
            )));
        }

        let ratio = target_height as f64 / source_height as f64;
        let target_width = ((source_width as f64 * ratio) as u32).max(1);

        let resized = img.resize_exact(target_width, target_height, FilterType::Triangle);
        let data = self.encode_jpeg(&resized)?;

        Ok(ProcessedImage {
            data,
            width: target_width,
            height: target_height,
        })
    }

    /// Resize on the blocking thread pool
    pub async fn resize_to_height_async(
        self: Arc<Self>,
        original: Bytes,
        target_height: u32,
    ) -> Result<ProcessedImage> {
        let processor = self.clone();

        tokio::task::spawn_blocking(move || processor.resize_to_height(&original, target_height))
            .await
            .map_err(|e| AppError::Internal(format!("Resize task panicked: {e}")))?
    }

    fn encode_jpeg(&self, img: &image::DynamicImage) -> Result<Bytes> {
        let mut buf = Vec::new();
        let mut cursor = Cursor::new(&mut buf);

        img.write_to(&mut cursor, ImageOutputFormat::Jpeg(self.quality))
            .map_err(|e| AppError::Internal(format!("Failed to encode JPEG: {e}")))?;

        Ok(Bytes::from(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_image(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 80, 40]),
        ));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
            .expect("encode test png");
        buf
    }

    #[test]
    fn test_resize_preserves_aspect_ratio() {
        let processor = ImageProcessor::with_defaults();
        let result = processor
            .resize_to_height(&png_image(200, 400), 100)
            .unwrap();
        assert_eq!(result.width, 50);
        assert_eq!(result.height, 100);

        let decoded = image::load_from_memory(&result.data).unwrap();
        assert_eq!(decoded.dimensions(), (50, 100));
    }

    #[test]
    fn test_resize_floors_fractional_width() {
        let processor = ImageProcessor::with_defaults();
        // ratio 100/500 = 0.2, width 333 * 0.2 = 66.6 -> 66
        let result = processor
            .resize_to_height(&png_image(333, 500), 100)
            .unwrap();
        assert_eq!(result.width, 66);
    }

    #[test]
    fn test_upscaling_rejected() {
        let processor = ImageProcessor::with_defaults();
        let err = processor
            .resize_to_height(&png_image(100, 50), 100)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidResize(_)));
    }

    #[test]
    fn test_zero_height_rejected() {
        let processor = ImageProcessor::with_defaults();
        let err = processor.resize_to_height(&png_image(10, 10), 0).unwrap_err();
        assert!(matches!(err, AppError::InvalidResize(_)));
    }

    #[test]
    fn test_corrupt_bytes_are_internal_errors() {
        let processor = ImageProcessor::with_defaults();
        let err = processor
            .resize_to_height(b"definitely not an image", 10)
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_dimensions_are_deterministic() {
        let processor = ImageProcessor::with_defaults();
        let source = png_image(640, 480);
        let a = processor.resize_to_height(&source, 120).unwrap();
        let b = processor.resize_to_height(&source, 120).unwrap();
        assert_eq!((a.width, a.height), (b.width, b.height));
    }

    #[tokio::test]
    async fn test_async_resize_matches_blocking() {
        let processor = Arc::new(ImageProcessor::with_defaults());
        let source = Bytes::from(png_image(200, 400));
        let result = processor
            .resize_to_height_async(source, 100)
            .await
            .unwrap();
        assert_eq!((result.width, result.height), (50, 100));
    }
}
