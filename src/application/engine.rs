use std::sync::Arc;

use image::RgbImage;

use crate::application::ports::BackbonePort;
use crate::domain::{
    errors::{DomainError, DomainResult},
    model::{ClassWeights, HeatmapTransform, Inference, ModelManifest, Preprocessing},
};

/// Motor de inferencia: red + pesos del clasificador + etiquetas.
/// Se construye una vez al arrancar y se comparte por `Arc` en modo sólo lectura.
pub struct ModelInferenceEngine {
    backbone: Arc<dyn BackbonePort>,
    weights: ClassWeights,
    labels: Vec<String>,
}

impl ModelInferenceEngine {
    pub fn new(backbone: Arc<dyn BackbonePort>, manifest: &ModelManifest) -> DomainResult<Self> {
        let weights = manifest.class_weights()?;
        Ok(Self { backbone, weights, labels: manifest.labels.clone() })
    }

    /// Como `new`, más un forward de calentamiento con un frame negro del
    /// tamaño del mapa de calor. Un desajuste de formas es `ModelLoad`.
    pub fn load(
        backbone: Arc<dyn BackbonePort>,
        manifest: &ModelManifest,
        warm_up: HeatmapTransform,
    ) -> DomainResult<Self> {
        let engine = Self::new(backbone, manifest)?;
        let load_err = |e: String| DomainError::ModelLoad(format!("forward de calentamiento: {e}"));

        let frame = RgbImage::new(warm_up.width.max(1), warm_up.height.max(1));
        let input = Preprocessing::Heatmap(warm_up)
            .to_tensor(&frame)
            .map_err(|e| load_err(e.to_string()))?;
        let out = engine.backbone.forward(input).map_err(|e| load_err(e.to_string()))?;
        engine.check_shapes(&out).map_err(load_err)?;
        Ok(engine)
    }

    /// Preprocesa la imagen según la ruta indicada y ejecuta el forward.
    pub fn infer(
        &self,
        image: &RgbImage,
        preprocessing: &Preprocessing,
    ) -> DomainResult<Inference> {
        let input = preprocessing.to_tensor(image)?;
        let out = self.backbone.forward(input)?;
        self.check_shapes(&out).map_err(DomainError::Inference)?;
        Ok(out)
    }

    fn check_shapes(&self, out: &Inference) -> Result<(), String> {
        if out.features.channels() != self.weights.channels() {
            return Err(format!(
                "el backbone devolvió {} canales, se esperaban {}",
                out.features.channels(),
                self.weights.channels()
            ));
        }
        if out.logits.len() != self.labels.len() {
            return Err(format!(
                "el backbone devolvió {} logits para {} clases",
                out.logits.len(),
                self.labels.len()
            ));
        }
        Ok(())
    }

    pub fn class_weights(&self) -> &ClassWeights {
        &self.weights
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, class_index: usize) -> Option<&str> {
        self.labels.get(class_index).map(String::as_str)
    }

    pub fn num_classes(&self) -> usize {
        self.labels.len()
    }
}
