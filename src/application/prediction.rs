use std::sync::Arc;

use image::RgbImage;

use crate::application::engine::ModelInferenceEngine;
use crate::domain::{
    classification::ClassificationResult,
    errors::{DomainError, DomainResult},
    model::{argmax, decode_rgb, softmax, ClassifyTransform, Preprocessing},
};

/// Clasificación de una imagen: argmax de los logits + confianza softmax.
#[derive(Clone)]
pub struct PredictionService {
    engine: Arc<ModelInferenceEngine>,
    preprocessing: Preprocessing,
}

impl PredictionService {
    pub fn new(engine: Arc<ModelInferenceEngine>) -> Self {
        Self { engine, preprocessing: Preprocessing::Classify(ClassifyTransform::default()) }
    }

    pub fn classify(&self, image: &RgbImage) -> DomainResult<ClassificationResult> {
        let out = self.engine.infer(image, &self.preprocessing)?;
        let logits = out.logits.to_vec();
        let idx = argmax(&logits).ok_or_else(|| DomainError::Inference("logits vacíos".into()))?;
        let confidence = softmax(&logits)[idx];
        let label = self
            .engine
            .label(idx)
            .ok_or_else(|| DomainError::Inference(format!("clase {idx} sin etiqueta")))?;
        Ok(ClassificationResult::from_label(label, confidence))
    }

    pub fn classify_bytes(&self, bytes: &[u8]) -> DomainResult<ClassificationResult> {
        self.classify(&decode_rgb(bytes)?)
    }

    /// Igual que `classify_bytes` pero en el pool de bloqueo de tokio.
    pub async fn classify_upload(&self, bytes: Vec<u8>) -> DomainResult<ClassificationResult> {
        let svc = self.clone();
        tokio::task::spawn_blocking(move || svc.classify_bytes(&bytes))
            .await
            .map_err(|e| DomainError::Inference(format!("tarea de clasificación abortada: {e}")))?
    }
}
