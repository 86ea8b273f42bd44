use std::sync::Arc;

use image::{codecs::jpeg::JpegEncoder, RgbImage};

use crate::application::engine::ModelInferenceEngine;
use crate::domain::{
    cam::ClassActivationMapSynthesizer,
    errors::{DomainError, DomainResult},
    model::{decode_rgb, HeatmapTransform, Preprocessing},
};

pub const JPEG_QUALITY: u8 = 95;

/// Frame codificado -> overlay CAM codificado en JPEG.
#[derive(Clone)]
pub struct HeatmapService {
    engine: Arc<ModelInferenceEngine>,
    synthesizer: ClassActivationMapSynthesizer,
    preprocessing: Preprocessing,
}

impl HeatmapService {
    pub fn new(engine: Arc<ModelInferenceEngine>, transform: HeatmapTransform) -> Self {
        Self {
            engine,
            synthesizer: ClassActivationMapSynthesizer,
            preprocessing: Preprocessing::Heatmap(transform),
        }
    }

    pub fn num_classes(&self) -> usize {
        self.engine.num_classes()
    }

    /// Overlay del tamaño de `frame` para la clase pedida.
    pub fn overlay(&self, frame: &RgbImage, class_index: usize) -> DomainResult<RgbImage> {
        let out = self.engine.infer(frame, &self.preprocessing)?;
        self.synthesizer
            .synthesize(&out.features, class_index, self.engine.class_weights(), frame)
    }

    pub fn render(&self, frame_bytes: &[u8], class_index: usize) -> DomainResult<Vec<u8>> {
        let frame = decode_rgb(frame_bytes)?;
        let blended = self.overlay(&frame, class_index)?;

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
            .encode_image(&blended)
            .map_err(|e| DomainError::Inference(format!("no se pudo codificar el JPEG: {e}")))?;
        Ok(jpeg)
    }

    /// `render` en el pool de bloqueo para no frenar el runtime.
    pub async fn render_blocking(
        &self,
        frame_bytes: Vec<u8>,
        class_index: usize,
    ) -> DomainResult<Vec<u8>> {
        let svc = self.clone();
        tokio::task::spawn_blocking(move || svc.render(&frame_bytes, class_index))
            .await
            .map_err(|e| DomainError::Inference(format!("tarea de mapa de calor abortada: {e}")))?
    }
}
