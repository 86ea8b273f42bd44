use serde::{Deserialize, Serialize};

use crate::domain::{batch::BatchSummary, classification::ClassificationResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: ClassificationResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedImage {
    pub filename: String,
    pub error: String,
}

/// Cuerpo de `/analyze`: el resumen en plano más las imágenes omitidas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    #[serde(flatten)]
    pub summary: BatchSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedImage>,
}

/// Parámetros de conexión del stream: `/ws/heatmap?class_index=3`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeatmapQuery {
    pub class_index: Option<usize>,
}

impl HeatmapQuery {
    pub fn resolve(&self, default: usize) -> usize {
        self.class_index.unwrap_or(default)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfoResponse {
    pub labels: Vec<String>,
    pub channels: usize,
    pub cam_class_index: usize,
    pub heatmap_width: u32,
    pub heatmap_height: u32,
    pub max_batch: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
