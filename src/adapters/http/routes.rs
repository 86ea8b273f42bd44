use axum::extract::{Multipart, State};
use axum::Json;
use tracing::error;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::state::HttpState;
use crate::application::dto::{BatchReport, HealthResponse, ModelInfoResponse, PredictionResponse};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::upload::UploadedImage;

/// Lee todos los campos con fichero (`file`, `files`...) del multipart.
async fn read_uploads(multipart: &mut Multipart) -> DomainResult<Vec<UploadedImage>> {
    let invalid = |e: axum::extract::multipart::MultipartError| {
        DomainError::Validation(format!("multipart inválido: {e}"))
    };

    let mut uploads = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        let Some(filename) = field.file_name().map(str::to_string) else { continue };
        let bytes = field.bytes().await.map_err(invalid)?;
        uploads.push(UploadedImage::new(filename, bytes.to_vec()));
    }
    Ok(uploads)
}

/// POST /predict: cualquier fallo es un 500.
pub async fn predict(
    State(st): State<HttpState>,
    mut multipart: Multipart,
) -> Result<Json<PredictionResponse>, ApiError> {
    let upload = read_uploads(&mut multipart)
        .await
        .map_err(ApiError::internal)?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::internal("no se recibió ningún fichero"))?;

    let prediction = st.prediction.classify_upload(upload.bytes).await.map_err(|e| {
        error!("Predicción fallida para {}: {}", upload.filename, e);
        ApiError::internal(e)
    })?;
    Ok(Json(PredictionResponse { prediction }))
}

/// POST /analyze: 400 si el lote no tiene entre 1 y 10 imágenes.
pub async fn analyze(
    State(st): State<HttpState>,
    mut multipart: Multipart,
) -> Result<Json<BatchReport>, ApiError> {
    let uploads = read_uploads(&mut multipart).await?;
    let report = st.batch.assess(uploads).await.map_err(|e| {
        error!("Análisis de lote fallido: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(report))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn model_info(State(st): State<HttpState>) -> Json<ModelInfoResponse> {
    Json(st.model_info.as_ref().clone())
}
