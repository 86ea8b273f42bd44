use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::application::{
    batch::BatchHealthAggregator, dto::ModelInfoResponse, prediction::PredictionService,
    stream::FrameStreamProcessor,
};

/// Estado compartido para los manejadores HTTP de Axum.
/// Contiene los servicios (casos de uso); el modelo cargado vive dentro de ellos.
#[derive(Clone)]
pub struct HttpState {
    /// Clasificación de una imagen.
    pub prediction: Arc<PredictionService>,
    /// Evaluación de lotes y envío a la bomba.
    pub batch: Arc<BatchHealthAggregator>,
    /// Bucle del stream de mapas de calor.
    pub stream: Arc<FrameStreamProcessor>,
    /// Plazas libres para conexiones de streaming simultáneas.
    pub connections: Arc<Semaphore>,
    pub model_info: Arc<ModelInfoResponse>,
}
