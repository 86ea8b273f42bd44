use serde::{Deserialize, Serialize};

/// Estados de una conexión del stream de mapas de calor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Connected,
    ReceivingLoop,
    Closed,
}

/// Mensaje entrante ya separado de los frames de control.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Imagen codificada en base64 (admite prefijo `data:image/...;base64,`).
    Text(String),
    /// Imagen ya en bytes.
    Binary(Vec<u8>),
}

/// Error enviado dentro del propio canal: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsErrorMessage {
    pub error: String,
}

impl WsErrorMessage {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"error":"error interno"}"#.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames_ok: u64,
    pub frames_failed: u64,
}
