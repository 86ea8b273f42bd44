use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::Semaphore;

use leaf_cam_server::adapters::{
    actuator::pump_client::HttpPumpClient,
    http::{router, state::HttpState},
    onnx::model_catalog::OnnxModelCatalog,
};
use leaf_cam_server::application::{
    actuation::ActuationController, batch::BatchHealthAggregator, dto::ModelInfoResponse,
    heatmap::HeatmapService, prediction::PredictionService, stream::FrameStreamProcessor,
};
use leaf_cam_server::config::{AppConfig, Cli};
use leaf_cam_server::domain::batch::MAX_BATCH;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Inicializar logs (RUST_LOG=info por defecto)
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from(Cli::parse());

    // 2. Cargar el modelo una sola vez; todos los servicios lo comparten.
    tracing::info!("🔧 Cargando modelo desde {}...", config.model_path.display());
    let engine = OnnxModelCatalog::new(config.intra_threads)
        .load_engine(
            &config.model_path,
            config.manifest_path.as_deref(),
            config.heatmap,
        )
        .context("no se pudo cargar el modelo CAM")?;
    let engine = Arc::new(engine);

    if config.cam_class_index >= engine.num_classes() {
        anyhow::bail!(
            "cam_class_index {} fuera de rango: el modelo tiene {} clases",
            config.cam_class_index,
            engine.num_classes()
        );
    }

    // 3. Servicios (casos de uso)
    let prediction = PredictionService::new(engine.clone());
    let pump = HttpPumpClient::new(config.actuator_url.clone());
    let actuation = ActuationController::new(Arc::new(pump));
    let batch = BatchHealthAggregator::new(prediction.clone(), actuation);
    let stream = FrameStreamProcessor::new(HeatmapService::new(engine.clone(), config.heatmap));

    // 4. Estado de la API
    let state = HttpState {
        prediction: Arc::new(prediction),
        batch: Arc::new(batch),
        stream: Arc::new(stream),
        connections: Arc::new(Semaphore::new(config.max_connections)),
        model_info: Arc::new(ModelInfoResponse {
            labels: engine.labels().to_vec(),
            channels: engine.class_weights().channels(),
            cam_class_index: config.cam_class_index,
            heatmap_width: config.heatmap.width,
            heatmap_height: config.heatmap.height,
            max_batch: MAX_BATCH,
        }),
    };

    // 5. Lanzar el servidor
    let app = router(state);
    tracing::info!("🚀 Servidor iniciado en http://{}", config.bind_addr);
    tracing::info!("📡 Stream de mapas de calor en ws://{}/ws/heatmap", config.bind_addr);
    tracing::info!("💧 Bomba dosificadora: {}", config.actuator_url);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("no se pudo abrir {}", config.bind_addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
