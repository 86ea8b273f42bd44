use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

use crate::adapters::http::error::ApiError;
use crate::adapters::http::state::HttpState;
use crate::application::{dto::HeatmapQuery, ports::FrameChannel};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::stream::{InboundFrame, WsErrorMessage};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<HeatmapQuery>,
    State(st): State<HttpState>,
) -> Response {
    let class_index = query.resolve(st.model_info.cam_class_index);
    if class_index >= st.stream.num_classes() {
        return ApiError::from(DomainError::Validation(format!(
            "class_index {class_index} fuera de rango (0..{})",
            st.stream.num_classes()
        )))
        .into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, st, class_index))
}

async fn handle_socket(mut socket: WebSocket, st: HttpState, class_index: usize) {
    let Ok(_permit) = st.connections.clone().try_acquire_owned() else {
        warn!("Stream: conexión rechazada, límite alcanzado");
        let msg = WsErrorMessage { error: "Demasiadas conexiones activas".into() }.to_json();
        let _ = socket.send(Message::Text(msg)).await;
        let _ = socket.send(Message::Close(None)).await;
        return;
    };

    info!("Stream: cliente conectado (clase {})", class_index);
    let mut channel = WsFrameChannel { socket };
    let stats = st.stream.run(&mut channel, class_index).await;
    info!(
        "Stream: cliente desconectado ({} frames, {} con error)",
        stats.frames_ok, stats.frames_failed
    );
}

/// Adaptador de `WebSocket` de Axum al puerto `FrameChannel`.
pub struct WsFrameChannel {
    socket: WebSocket,
}

#[async_trait]
impl FrameChannel for WsFrameChannel {
    async fn recv(&mut self) -> Option<DomainResult<InboundFrame>> {
        loop {
            match self.socket.recv().await? {
                Ok(Message::Text(text)) => return Some(Ok(InboundFrame::Text(text))),
                Ok(Message::Binary(bytes)) => return Some(Ok(InboundFrame::Binary(bytes))),
                Ok(Message::Close(_)) => return None,
                // ping/pong los contesta axum
                Ok(_) => continue,
                Err(e) => return Some(Err(DomainError::Transport(e.to_string()))),
            }
        }
    }

    async fn send_text(&mut self, text: String) -> DomainResult<()> {
        self.socket
            .send(Message::Text(text))
            .await
            .map_err(|e| DomainError::Transport(e.to_string()))
    }
}
