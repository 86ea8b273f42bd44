mod common;

use std::sync::Arc;

use common::{engine, engine_with_channels, manifest, png, StubBackbone, BLUE, CHANNELS, GREEN, RED};
use leaf_cam_server::application::{engine::ModelInferenceEngine, prediction::PredictionService};
use leaf_cam_server::domain::{errors::DomainError, model::HeatmapTransform};

#[test]
fn classifies_and_splits_label() {
    let (engine, _) = engine();
    let svc = PredictionService::new(engine);

    let r = svc.classify_bytes(&png(300, 200, RED)).unwrap();
    assert_eq!(r.class_name, "Tomato___Late_blight");
    assert_eq!(r.plant, "Tomato");
    assert_eq!(r.condition, "Late blight");
    assert!(!r.is_healthy());
    assert!((0.0..=1.0).contains(&r.confidence));

    let r = svc.classify_bytes(&png(300, 200, GREEN)).unwrap();
    assert!(r.is_healthy());

    let r = svc.classify_bytes(&png(120, 400, BLUE)).unwrap();
    assert_eq!(r.plant, "Potato");
    assert_eq!(r.condition, "Early blight");
}

#[test]
fn repeated_classification_is_deterministic() {
    let (engine, backbone) = engine();
    let svc = PredictionService::new(engine);
    let bytes = png(256, 256, RED);

    let first = svc.classify_bytes(&bytes).unwrap();
    let second = svc.classify_bytes(&bytes).unwrap();
    assert_eq!(first, second);
    assert_eq!(backbone.calls(), 2);
}

#[test]
fn undecodable_bytes_are_rejected_without_inference() {
    let (engine, backbone) = engine();
    let svc = PredictionService::new(engine);

    assert!(svc.classify_bytes(b"texto plano").is_err());
    assert_eq!(backbone.calls(), 0);
}

#[test]
fn backbone_channel_mismatch_is_an_inference_error() {
    let (engine, _) = engine_with_channels(CHANNELS + 1);
    let svc = PredictionService::new(engine);

    assert!(matches!(svc.classify_bytes(&png(64, 64, RED)), Err(DomainError::Inference(_))));
}

#[tokio::test]
async fn upload_path_runs_off_the_runtime() {
    let (engine, _) = engine();
    let svc = PredictionService::new(engine);

    let r = svc.classify_upload(png(64, 64, GREEN)).await.unwrap();
    assert_eq!(r.class_name, "Tomato___healthy");
}

#[test]
fn load_rejects_backbone_with_other_channel_count() {
    let wide = Arc::new(StubBackbone::new(CHANNELS + 4));
    let loaded = ModelInferenceEngine::load(wide.clone(), &manifest(), HeatmapTransform::default());
    assert!(matches!(loaded, Err(DomainError::ModelLoad(_))));
    assert_eq!(wide.calls(), 1);

    let fitting = Arc::new(StubBackbone::new(CHANNELS));
    assert!(ModelInferenceEngine::load(fitting, &manifest(), HeatmapTransform::default()).is_ok());
}

#[test]
fn load_rejects_manifest_with_more_labels_than_logits() {
    let mut extra = manifest();
    extra.labels.push("Apple___Black_rot".into());
    extra.fc_weight.push(vec![0.0; CHANNELS]);

    let loaded = ModelInferenceEngine::load(
        Arc::new(StubBackbone::new(CHANNELS)),
        &extra,
        HeatmapTransform { width: 64, height: 64 },
    );
    assert!(matches!(loaded, Err(DomainError::ModelLoad(_))));
}
