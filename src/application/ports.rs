use async_trait::async_trait;
use ndarray::Array4;

use crate::domain::{
    actuation::ActuationCommand,
    errors::{ActuationFailure, DomainResult},
    model::Inference,
    stream::InboundFrame,
    upload::UploadedImage,
};

/// Forward de la red: tensor NCHW (batch 1) -> (mapa de características, logits).
/// Sólo inferencia; la implementación decide cómo serializar el acceso.
pub trait BackbonePort: Send + Sync {
    fn forward(&self, input: Array4<f32>) -> DomainResult<Inference>;
}

#[async_trait]
pub trait ActuatorPort: Send + Sync {
    async fn send(&self, command: &ActuationCommand) -> Result<(), ActuationFailure>;
}

/// Canal bidireccional de una conexión de streaming.
#[async_trait]
pub trait FrameChannel: Send {
    /// `None` cuando el cliente cierra la conexión.
    async fn recv(&mut self) -> Option<DomainResult<InboundFrame>>;
    async fn send_text(&mut self, text: String) -> DomainResult<()>;
}

/// Fichero subido: nombre y contenido.
pub trait ImageUpload: Send + 'static {
    fn filename(&self) -> &str;
    fn read(&self) -> DomainResult<Vec<u8>>;
}

impl ImageUpload for UploadedImage {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn read(&self) -> DomainResult<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

impl<T: ImageUpload + ?Sized> ImageUpload for Box<T> {
    fn filename(&self) -> &str {
        (**self).filename()
    }

    fn read(&self) -> DomainResult<Vec<u8>> {
        (**self).read()
    }
}
