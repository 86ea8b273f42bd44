use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::adapters::onnx::cam_engine::OnnxCamEngine;
use crate::application::engine::ModelInferenceEngine;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::{HeatmapTransform, ModelManifest};

/// Carga el `.onnx` y su manifiesto JSON y devuelve el motor listo.
pub struct OnnxModelCatalog {
    intra_threads: usize,
}

impl OnnxModelCatalog {
    pub fn new(intra_threads: usize) -> Self {
        Self { intra_threads: intra_threads.max(1) }
    }

    pub fn validate_model(&self, path: &Path) -> DomainResult<()> {
        if path.as_os_str().is_empty() {
            return Err(DomainError::ModelLoad("ruta del modelo vacía".into()));
        }
        if !path.exists() {
            return Err(DomainError::ModelLoad(format!("modelo no encontrado: {}", path.display())));
        }
        Ok(())
    }

    /// `modelo.onnx` -> `modelo.json`
    pub fn manifest_path_for(model_path: &Path) -> PathBuf {
        model_path.with_extension("json")
    }

    pub fn read_manifest(path: &Path) -> DomainResult<ModelManifest> {
        let raw = fs::read_to_string(path)
            .map_err(|e| DomainError::ModelLoad(format!("manifiesto {}: {e}", path.display())))?;
        let manifest: ModelManifest = serde_json::from_str(&raw)
            .map_err(|e| DomainError::ModelLoad(format!("manifiesto {}: {e}", path.display())))?;
        // Falla aquí, antes de abrir la sesión, si los pesos no encajan.
        manifest.class_weights()?;
        Ok(manifest)
    }

    pub fn load_engine(
        &self,
        model_path: &Path,
        manifest_path: Option<&Path>,
        warm_up: HeatmapTransform,
    ) -> DomainResult<ModelInferenceEngine> {
        self.validate_model(model_path)?;
        let manifest_path = manifest_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| Self::manifest_path_for(model_path));
        let manifest = Self::read_manifest(&manifest_path)?;

        let backbone = OnnxCamEngine::load(
            model_path,
            self.intra_threads,
            &manifest.features_output,
            &manifest.logits_output,
        )?;
        let engine = ModelInferenceEngine::load(Arc::new(backbone), &manifest, warm_up)?;

        info!(
            "Modelo cargado: {} ({} clases, {} canales)",
            model_path.display(),
            engine.num_classes(),
            manifest.channels
        );
        Ok(engine)
    }
}
