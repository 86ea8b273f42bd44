use std::path::PathBuf;

use clap::Parser;

use crate::domain::cam::DEFAULT_CAM_CLASS;
use crate::domain::model::HeatmapTransform;

pub const DEFAULT_PUMP_URL: &str = "http://192.168.71.147/pump/action";

/// Servidor de clasificación de hojas y mapas de activación
#[derive(Parser, Debug, Clone)]
#[command(name = "leaf-cam-server")]
#[command(version)]
#[command(about = "Clasificación de enfermedades en hojas con mapas de calor CAM")]
pub struct Cli {
    /// Host donde escuchar
    #[arg(long, env = "LEAF_CAM_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Puerto HTTP
    #[arg(short, long, env = "LEAF_CAM_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Modelo ONNX (salidas `features` y `logits`)
    #[arg(long, env = "CAM_MODEL_PATH", default_value = "model_for_cam.onnx")]
    pub model_path: PathBuf,

    /// Manifiesto JSON del modelo (por defecto, junto al .onnx)
    #[arg(long, env = "CAM_MODEL_MANIFEST")]
    pub manifest_path: Option<PathBuf>,

    /// Clase que visualiza el stream si el cliente no indica otra
    #[arg(long, env = "CAM_CLASS_INDEX", default_value_t = DEFAULT_CAM_CLASS)]
    pub cam_class_index: usize,

    /// Ancho de entrada de la red en la ruta del mapa de calor
    #[arg(long, env = "FRAME_WIDTH", default_value_t = 512)]
    pub frame_width: u32,

    /// Alto de entrada de la red en la ruta del mapa de calor
    #[arg(long, env = "FRAME_HEIGHT", default_value_t = 344)]
    pub frame_height: u32,

    /// Conexiones de streaming simultáneas
    #[arg(long, env = "MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: usize,

    /// Endpoint de la bomba dosificadora
    #[arg(long, env = "PUMP_URL", default_value = DEFAULT_PUMP_URL)]
    pub actuator_url: String,

    /// Hilos intra-op de ONNX Runtime
    #[arg(long, env = "ORT_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub model_path: PathBuf,
    pub manifest_path: Option<PathBuf>,
    pub cam_class_index: usize,
    pub heatmap: HeatmapTransform,
    pub max_connections: usize,
    pub actuator_url: String,
    pub intra_threads: usize,
}

impl From<Cli> for AppConfig {
    fn from(cli: Cli) -> Self {
        Self {
            bind_addr: format!("{}:{}", cli.host, cli.port),
            model_path: cli.model_path,
            manifest_path: cli.manifest_path,
            cam_class_index: cli.cam_class_index,
            heatmap: HeatmapTransform {
                width: cli.frame_width.max(1),
                height: cli.frame_height.max(1),
            },
            max_connections: cli.max_connections.max(1),
            actuator_url: cli.actuator_url,
            intra_threads: cli.intra_threads.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment() {
        let cfg = AppConfig::from(Cli::parse_from(["leaf-cam-server"]));
        assert_eq!(cfg.bind_addr, "0.0.0.0:8000");
        assert_eq!(cfg.cam_class_index, 2);
        assert_eq!(cfg.heatmap, HeatmapTransform { width: 512, height: 344 });
        assert_eq!(cfg.max_connections, 10);
        assert_eq!(cfg.actuator_url, DEFAULT_PUMP_URL);
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = AppConfig::from(Cli::parse_from([
            "leaf-cam-server",
            "--port",
            "9000",
            "--cam-class-index",
            "0",
            "--model-path",
            "models/cam.onnx",
        ]));
        assert_eq!(cfg.bind_addr, "0.0.0.0:9000");
        assert_eq!(cfg.cam_class_index, 0);
        assert_eq!(cfg.model_path, PathBuf::from("models/cam.onnx"));
    }
}
