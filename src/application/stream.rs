use base64::{prelude::BASE64_STANDARD, Engine};
use tracing::{debug, warn};

use crate::application::{heatmap::HeatmapService, ports::FrameChannel};
use crate::domain::{
    errors::{DomainError, DomainResult},
    stream::{InboundFrame, SessionStats, StreamState, WsErrorMessage},
};

/// Bucle recibir -> procesar -> responder de una conexión.
/// Un único frame en vuelo; los fallos por frame se responden en el canal
/// y la sesión sigue abierta.
#[derive(Clone)]
pub struct FrameStreamProcessor {
    heatmap: HeatmapService,
}

impl FrameStreamProcessor {
    pub fn new(heatmap: HeatmapService) -> Self {
        Self { heatmap }
    }

    pub fn num_classes(&self) -> usize {
        self.heatmap.num_classes()
    }

    /// Atiende la conexión hasta que el cliente cierra o falla el transporte.
    pub async fn run<C>(&self, channel: &mut C, class_index: usize) -> SessionStats
    where
        C: FrameChannel + ?Sized,
    {
        let mut stats = SessionStats::default();
        let mut state = StreamState::Connected;
        debug!(?state, class_index, "Stream: sesión abierta");

        state = StreamState::ReceivingLoop;
        while state == StreamState::ReceivingLoop {
            let frame = match channel.recv().await {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => {
                    warn!("Stream: fallo de transporte al recibir: {}", e);
                    state = StreamState::Closed;
                    continue;
                }
                None => {
                    state = StreamState::Closed;
                    continue;
                }
            };

            let reply = match self.process(frame, class_index).await {
                Ok(encoded) => {
                    stats.frames_ok += 1;
                    encoded
                }
                Err(e) => {
                    stats.frames_failed += 1;
                    warn!("Stream: frame descartado: {}", e);
                    WsErrorMessage { error: e.to_string() }.to_json()
                }
            };

            if let Err(e) = channel.send_text(reply).await {
                warn!("Stream: fallo de transporte al enviar: {}", e);
                state = StreamState::Closed;
            }
        }

        debug!(?state, ?stats, "Stream: sesión cerrada");
        stats
    }

    async fn process(&self, frame: InboundFrame, class_index: usize) -> DomainResult<String> {
        let bytes = match frame {
            InboundFrame::Text(text) => decode_frame(&text)?,
            InboundFrame::Binary(bytes) => bytes,
        };
        let jpeg = self.heatmap.render_blocking(bytes, class_index).await?;
        Ok(encode_frame(&jpeg))
    }
}

/// base64 -> bytes. Acepta el prefijo `data:image/...;base64,` de los navegadores.
pub fn decode_frame(text: &str) -> DomainResult<Vec<u8>> {
    let payload = text.trim();
    let payload = match payload.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => payload,
    };
    BASE64_STANDARD
        .decode(payload)
        .map_err(|e| DomainError::Decode(format!("base64 inválido: {e}")))
}

pub fn encode_frame(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_and_data_url_payloads() {
        assert_eq!(decode_frame("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(decode_frame("data:image/jpeg;base64,aGVsbG8=\n").unwrap(), b"hello");
    }

    #[test]
    fn malformed_base64_is_a_decode_error() {
        assert!(matches!(decode_frame("@@not-base64@@"), Err(DomainError::Decode(_))));
    }

    #[test]
    fn encode_is_standard_base64() {
        assert_eq!(encode_frame(b"hello"), "aGVsbG8=");
    }
}
