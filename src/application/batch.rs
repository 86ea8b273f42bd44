use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::application::{
    actuation::ActuationController,
    dto::{BatchReport, SkippedImage},
    ports::ImageUpload,
    prediction::PredictionService,
};
use crate::domain::{
    batch::{summarize, validate_batch_size, ImageOutcome},
    errors::{DomainError, DomainResult},
};

/// Evaluación de salud de un lote de 1 a 10 imágenes.
#[derive(Clone)]
pub struct BatchHealthAggregator {
    prediction: PredictionService,
    actuation: ActuationController,
}

impl BatchHealthAggregator {
    pub fn new(prediction: PredictionService, actuation: ActuationController) -> Self {
        Self { prediction, actuation }
    }

    /// Clasifica y agrega. No toca la bomba.
    pub async fn analyze<U: ImageUpload>(&self, images: Vec<U>) -> DomainResult<BatchReport> {
        validate_batch_size(images.len())?;
        let received = images.len();

        let mut results = Vec::with_capacity(received);
        let mut skipped = Vec::new();
        for outcome in self.classify_all(images).await {
            match outcome {
                ImageOutcome::Classified { result, .. } => results.push(result),
                ImageOutcome::Failed { filename, error } => {
                    warn!("Lote: se omite {}: {}", filename, error);
                    skipped.push(SkippedImage { filename, error: error.to_string() });
                }
            }
        }

        let summary = summarize(&results)?;
        info!(
            "Lote: {}/{} imágenes válidas, {:.1}% enfermas ({} / {})",
            summary.total,
            received,
            summary.diseased_percentage,
            summary.majority_plant,
            summary.majority_condition
        );
        Ok(BatchReport { summary, skipped })
    }

    /// `analyze` y, si hay resumen, envía la dosis. El fallo de la bomba no
    /// altera el informe.
    pub async fn assess<U: ImageUpload>(&self, images: Vec<U>) -> DomainResult<BatchReport> {
        let report = self.analyze(images).await?;
        self.actuation.dispatch(report.summary.diseased_percentage).await;
        Ok(report)
    }

    /// Una tarea bloqueante por imagen. El resultado vuelve en el orden de
    /// subida, sea cual sea el orden en que terminen.
    async fn classify_all<U: ImageUpload>(&self, images: Vec<U>) -> Vec<ImageOutcome> {
        let filenames: Vec<String> = images.iter().map(|u| u.filename().to_string()).collect();
        let mut slots: Vec<Option<ImageOutcome>> = filenames.iter().map(|_| None).collect();

        let mut tasks = JoinSet::new();
        for (idx, upload) in images.into_iter().enumerate() {
            let svc = self.prediction.clone();
            tasks.spawn_blocking(move || {
                let filename = upload.filename().to_string();
                let outcome = match upload.read().and_then(|bytes| svc.classify_bytes(&bytes)) {
                    Ok(result) => ImageOutcome::Classified { filename, result },
                    Err(error) => ImageOutcome::Failed { filename, error },
                };
                (idx, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, outcome)) => slots[idx] = Some(outcome),
                Err(e) => error!("Lote: tarea de clasificación abortada: {}", e),
            }
        }

        // Un hueco vacío es una tarea que entró en pánico.
        slots
            .into_iter()
            .zip(filenames)
            .map(|(slot, filename)| {
                slot.unwrap_or_else(|| ImageOutcome::Failed {
                    filename,
                    error: DomainError::Inference("la clasificación se abortó".into()),
                })
            })
            .collect()
    }
}
