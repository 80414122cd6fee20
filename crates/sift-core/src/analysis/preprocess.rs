//! Deterministic upload preprocessing: decode, grayscale, JPEG re-encode.
//!
//! Grayscale plus a fixed JPEG quality shrinks uploads before they are
//! base64-encoded into provider requests. Decoding runs on the blocking pool
//! under a timeout so an adversarial image cannot stall the runtime.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView};
use std::time::Duration;
use tokio::time::timeout;

use crate::config::ImageConfig;
use crate::error::AnalysisError;
use crate::llm::ImageInput;

/// Image preprocessor with configurable limits and quality.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    config: ImageConfig,
}

impl Preprocessor {
    pub fn new(config: ImageConfig) -> Self {
        Self { config }
    }

    /// Decode `bytes`, convert to grayscale and re-encode as JPEG.
    pub async fn prepare(&self, bytes: Vec<u8>) -> Result<ImageInput, AnalysisError> {
        if bytes.is_empty() {
            return Err(AnalysisError::MissingImage);
        }

        let config = self.config.clone();
        let timeout_ms = config.decode_timeout_ms;
        let result = timeout(Duration::from_millis(timeout_ms), async move {
            tokio::task::spawn_blocking(move || Self::prepare_sync(&bytes, &config)).await
        })
        .await;

        match result {
            Ok(Ok(Ok(jpeg))) => Ok(ImageInput::from_bytes(&jpeg, "jpeg")),
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(e)) => Err(AnalysisError::InvalidImage(format!("Task join error: {e}"))),
            Err(_) => Err(AnalysisError::InvalidImage(format!(
                "decode timed out after {timeout_ms}ms"
            ))),
        }
    }

    fn prepare_sync(bytes: &[u8], config: &ImageConfig) -> Result<Vec<u8>, AnalysisError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| AnalysisError::InvalidImage(e.to_string()))?;

        let (width, height) = image.dimensions();
        if width > config.max_dimension || height > config.max_dimension {
            return Err(AnalysisError::InvalidImage(format!(
                "{width}x{height} exceeds {max}px",
                max = config.max_dimension
            )));
        }

        let gray = DynamicImage::ImageLuma8(image.to_luma8());
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, config.jpeg_quality);
        gray.write_with_encoder(encoder)
            .map_err(|e| AnalysisError::InvalidImage(format!("re-encode failed: {e}")))?;

        tracing::debug!(
            width,
            height,
            input_bytes = bytes.len(),
            output_bytes = buffer.len(),
            "Preprocessed upload"
        );
        Ok(buffer)
    }
}
