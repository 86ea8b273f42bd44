#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use ndarray::{Array1, Array3, Array4, Axis};

use leaf_cam_server::application::engine::ModelInferenceEngine;
use leaf_cam_server::application::ports::{ActuatorPort, BackbonePort, FrameChannel, ImageUpload};
use leaf_cam_server::domain::actuation::ActuationCommand;
use leaf_cam_server::domain::errors::{ActuationFailure, DomainError, DomainResult};
use leaf_cam_server::domain::model::{FeatureMap, Inference, ModelManifest};
use leaf_cam_server::domain::stream::InboundFrame;

pub const LABELS: [&str; 3] = ["Tomato___Late_blight", "Tomato___healthy", "Potato___Early_blight"];
pub const CHANNELS: usize = 4;

pub const RED: [u8; 3] = [255, 0, 0];
pub const GREEN: [u8; 3] = [0, 255, 0];
pub const BLUE: [u8; 3] = [0, 0, 255];

/// Red falsa: gana la clase del canal RGB con mayor media
/// (rojo -> 0, verde -> 1, azul -> 2).
pub struct StubBackbone {
    pub calls: AtomicUsize,
    channels: usize,
}

impl StubBackbone {
    pub fn new(channels: usize) -> Self {
        Self { calls: AtomicUsize::new(0), channels }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BackbonePort for StubBackbone {
    fn forward(&self, input: Array4<f32>) -> DomainResult<Inference> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (_, _, h, w) = input.dim();

        let means: Vec<f32> = (0..3)
            .map(|c| input.index_axis(Axis(1), c).mean().unwrap_or(0.0))
            .collect();
        let winner = (0..3)
            .max_by(|&a, &b| means[a].total_cmp(&means[b]))
            .unwrap_or(0);
        let mut logits = Array1::<f32>::zeros(LABELS.len());
        logits[winner] = 5.0;

        let (fh, fw) = ((h / 32).max(1), (w / 32).max(1));
        let features = Array3::from_shape_fn((self.channels, fh, fw), |(c, y, x)| {
            input[[0, c % 3, (y * 32).min(h - 1), (x * 32).min(w - 1)]] + (x + y) as f32 * 0.1
        });
        Ok(Inference { features: FeatureMap(features), logits })
    }
}

pub fn manifest() -> ModelManifest {
    ModelManifest {
        channels: CHANNELS,
        labels: LABELS.iter().map(|s| s.to_string()).collect(),
        fc_weight: vec![
            vec![1.0, -0.5, 0.25, 2.0],
            vec![0.1, 0.2, 0.3, 0.4],
            vec![-1.0, 1.0, -1.0, 1.0],
        ],
        features_output: "features".into(),
        logits_output: "logits".into(),
    }
}

pub fn engine() -> (Arc<ModelInferenceEngine>, Arc<StubBackbone>) {
    engine_with_channels(CHANNELS)
}

pub fn engine_with_channels(channels: usize) -> (Arc<ModelInferenceEngine>, Arc<StubBackbone>) {
    let backbone = Arc::new(StubBackbone::new(channels));
    let engine = ModelInferenceEngine::new(backbone.clone(), &manifest()).expect("engine");
    (Arc::new(engine), backbone)
}

pub fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).expect("png");
    buf.into_inner()
}

/// Bomba falsa que guarda las órdenes recibidas.
#[derive(Default)]
pub struct RecordingActuator {
    pub sent: Mutex<Vec<ActuationCommand>>,
    pub offline: bool,
}

impl RecordingActuator {
    pub fn offline() -> Self {
        Self { offline: true, ..Default::default() }
    }

    pub fn sent(&self) -> Vec<ActuationCommand> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActuatorPort for RecordingActuator {
    async fn send(&self, command: &ActuationCommand) -> Result<(), ActuationFailure> {
        self.sent.lock().unwrap().push(command.clone());
        if self.offline {
            return Err(ActuationFailure::Unreachable("sin red".into()));
        }
        Ok(())
    }
}

/// Subida cuyo contenido no se puede leer.
pub struct UnreadableUpload(pub String);

impl ImageUpload for UnreadableUpload {
    fn filename(&self) -> &str {
        &self.0
    }

    fn read(&self) -> DomainResult<Vec<u8>> {
        Err(DomainError::Inference("stream cortado".into()))
    }
}

/// Subida cuya lectura entra en pánico dentro de la tarea bloqueante.
pub struct PanickingUpload(pub String);

impl ImageUpload for PanickingUpload {
    fn filename(&self) -> &str {
        &self.0
    }

    fn read(&self) -> DomainResult<Vec<u8>> {
        panic!("lectura rota: {}", self.0)
    }
}

/// Canal guionizado: entrega los mensajes en orden y después se cierra.
#[derive(Default)]
pub struct ScriptedChannel {
    pub inbound: VecDeque<DomainResult<InboundFrame>>,
    pub sent: Vec<String>,
    pub fail_sends: bool,
    pub recv_calls: usize,
}

impl ScriptedChannel {
    pub fn new(frames: Vec<DomainResult<InboundFrame>>) -> Self {
        Self { inbound: frames.into(), ..Default::default() }
    }
}

#[async_trait]
impl FrameChannel for ScriptedChannel {
    async fn recv(&mut self) -> Option<DomainResult<InboundFrame>> {
        self.recv_calls += 1;
        self.inbound.pop_front()
    }

    async fn send_text(&mut self, text: String) -> DomainResult<()> {
        if self.fail_sends {
            return Err(DomainError::Transport("socket cerrado".into()));
        }
        self.sent.push(text);
        Ok(())
    }
}
