use ndarray::{Array4, ArrayD, ArrayViewD, Axis, Ix2, Ix4, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::{DynValue, Value};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use crate::application::ports::BackbonePort;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::{FeatureMap, Inference};

/// Red CAM exportada a ONNX con dos salidas: mapa de características de la
/// última capa convolucional y logits.
///
/// ONNX Runtime no calcula gradientes. `Session::run` necesita `&mut`, así
/// que los forward se serializan con el `Mutex`.
pub struct OnnxCamEngine {
    session: Mutex<Session>,
    features_output: String,
    logits_output: String,
}

impl OnnxCamEngine {
    pub fn load(
        path: &Path,
        intra_threads: usize,
        features_output: &str,
        logits_output: &str,
    ) -> DomainResult<Self> {
        let load_err = |e: ort::Error| DomainError::ModelLoad(format!("{}: {e}", path.display()));

        let mut builder = Session::builder()
            .and_then(|b| b.with_intra_threads(intra_threads))
            .map_err(load_err)?;

        // CUDA es opcional: si está disponible se registra, si no continuamos en CPU.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path)
            .map_err(|e| DomainError::ModelLoad(format!("{}: {e}", path.display())))?;
        let session = builder.commit_from_memory(&model_bytes).map_err(load_err)?;

        for name in [features_output, logits_output] {
            if !session.outputs.iter().any(|o| o.name == name) {
                return Err(DomainError::ModelLoad(format!(
                    "{} no expone la salida '{name}'",
                    path.display()
                )));
            }
        }

        Ok(Self {
            session: Mutex::new(session),
            features_output: features_output.to_string(),
            logits_output: logits_output.to_string(),
        })
    }
}

impl BackbonePort for OnnxCamEngine {
    fn forward(&self, input: Array4<f32>) -> DomainResult<Inference> {
        let infer_err = |e: ort::Error| DomainError::Inference(e.to_string());

        let input_shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
        let (data, _) = input.into_raw_vec_and_offset();
        let input_tensor = Value::from_array((input_shape, data)).map_err(infer_err)?;

        let (features, logits) = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| DomainError::Inference("lock de sesión envenenado".into()))?;
            let outputs = session.run(ort::inputs![input_tensor]).map_err(infer_err)?;
            (
                extract(&outputs[self.features_output.as_str()])?,
                extract(&outputs[self.logits_output.as_str()])?,
            )
        };

        let features = features
            .into_dimensionality::<Ix4>()
            .map_err(|e| DomainError::Inference(format!("features: {e}")))?
            .index_axis_move(Axis(0), 0);
        let logits = logits
            .into_dimensionality::<Ix2>()
            .map_err(|e| DomainError::Inference(format!("logits: {e}")))?
            .index_axis_move(Axis(0), 0);

        Ok(Inference { features: FeatureMap(features), logits })
    }
}

fn extract(value: &DynValue) -> DomainResult<ArrayD<f32>> {
    let (shape, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|e| DomainError::Inference(e.to_string()))?;
    let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
    let view = ArrayViewD::from_shape(IxDyn(&dims), data)
        .map_err(|e| DomainError::Inference(e.to_string()))?;
    Ok(view.to_owned())
}
