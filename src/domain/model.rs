use image::{imageops::FilterType, RgbImage};
use ndarray::{Array1, Array2, Array3, Array4, ArrayView1};
use serde::{Deserialize, Serialize};

use super::classification::PLANT_VILLAGE_CLASSES;
use super::errors::{DomainError, DomainResult};

/// Media / desviación por canal (RGB) con las que se calibró el clasificador.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Mapa de características (C, H', W') de la última capa convolucional.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMap(pub Array3<f32>);

impl FeatureMap {
    pub fn channels(&self) -> usize { self.0.shape()[0] }
    pub fn height(&self) -> usize { self.0.shape()[1] }
    pub fn width(&self) -> usize { self.0.shape()[2] }
}

/// Pesos de la capa lineal final, una fila por clase (clases x canales).
/// Se cargan una vez y sólo se leen.
#[derive(Debug, Clone)]
pub struct ClassWeights(Array2<f32>);

impl ClassWeights {
    pub fn new(rows: &[Vec<f32>], channels: usize) -> DomainResult<Self> {
        if rows.is_empty() {
            return Err(DomainError::ModelLoad("fc_weight vacío".into()));
        }
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != channels) {
            return Err(DomainError::ModelLoad(format!(
                "fc_weight[{idx}] tiene {} pesos, la arquitectura declara {channels} canales",
                row.len()
            )));
        }
        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        let matrix = Array2::from_shape_vec((rows.len(), channels), flat)
            .map_err(|e| DomainError::ModelLoad(e.to_string()))?;
        Ok(Self(matrix))
    }

    pub fn num_classes(&self) -> usize { self.0.nrows() }
    pub fn channels(&self) -> usize { self.0.ncols() }

    pub fn row(&self, class_index: usize) -> Option<ArrayView1<'_, f32>> {
        (class_index < self.num_classes()).then(|| self.0.row(class_index))
    }
}

/// Descriptor JSON que acompaña al `.onnx`: etiquetas, pesos del clasificador
/// y nombres de las salidas del grafo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    pub channels: usize,
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,
    pub fc_weight: Vec<Vec<f32>>,
    #[serde(default = "default_features_output")]
    pub features_output: String,
    #[serde(default = "default_logits_output")]
    pub logits_output: String,
}

fn default_labels() -> Vec<String> {
    PLANT_VILLAGE_CLASSES.iter().map(|s| s.to_string()).collect()
}

fn default_features_output() -> String {
    "features".into()
}

fn default_logits_output() -> String {
    "logits".into()
}

impl ModelManifest {
    /// Comprueba que los pesos encajan con la arquitectura declarada.
    pub fn class_weights(&self) -> DomainResult<ClassWeights> {
        if self.channels == 0 {
            return Err(DomainError::ModelLoad("channels debe ser > 0".into()));
        }
        if self.fc_weight.len() != self.labels.len() {
            return Err(DomainError::ModelLoad(format!(
                "fc_weight tiene {} filas pero hay {} etiquetas",
                self.fc_weight.len(),
                self.labels.len()
            )));
        }
        ClassWeights::new(&self.fc_weight, self.channels)
    }
}

/// Resultado de un forward: mapa de características y logits de una imagen.
#[derive(Debug, Clone)]
pub struct Inference {
    pub features: FeatureMap,
    pub logits: Array1<f32>,
}

/// Ruta de clasificación: lado corto a 256, recorte central 224, normalización.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifyTransform {
    pub short_edge: u32,
    pub crop: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for ClassifyTransform {
    fn default() -> Self {
        Self { short_edge: 256, crop: 224, mean: IMAGENET_MEAN, std: IMAGENET_STD }
    }
}

/// Ruta del mapa de calor: redimensionado directo, sin recorte ni normalización.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatmapTransform {
    pub width: u32,
    pub height: u32,
}

impl Default for HeatmapTransform {
    fn default() -> Self {
        Self { width: 512, height: 344 }
    }
}

/// Los dos contratos de preprocesado se calibraron por separado; no unificar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Preprocessing {
    Classify(ClassifyTransform),
    Heatmap(HeatmapTransform),
}

impl Preprocessing {
    /// Convierte la imagen en un tensor NCHW con batch 1.
    pub fn to_tensor(&self, rgb: &RgbImage) -> DomainResult<Array4<f32>> {
        if rgb.width() == 0 || rgb.height() == 0 {
            return Err(DomainError::Inference("imagen vacía".into()));
        }
        match self {
            Preprocessing::Classify(t) => {
                let (w, h) = short_edge_size(rgb.width(), rgb.height(), t.short_edge);
                let resized = image::imageops::resize(rgb, w, h, FilterType::Triangle);
                let crop = t.crop.min(w).min(h);
                let left = ((w - crop) as f64 / 2.0).round_ties_even() as u32;
                let top = ((h - crop) as f64 / 2.0).round_ties_even() as u32;
                let cropped = image::imageops::crop_imm(&resized, left, top, crop, crop).to_image();
                Ok(fill_tensor(&cropped, |c, v| (v - t.mean[c]) / t.std[c]))
            }
            Preprocessing::Heatmap(t) => {
                let resized = image::imageops::resize(rgb, t.width, t.height, FilterType::Triangle);
                Ok(fill_tensor(&resized, |_, v| v))
            }
        }
    }
}

/// Decodifica bytes (JPEG, PNG...) a RGB de 8 bits.
pub fn decode_rgb(bytes: &[u8]) -> DomainResult<RgbImage> {
    if bytes.is_empty() {
        return Err(DomainError::Inference("imagen vacía".into()));
    }
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}

/// Tamaño tras escalar el lado corto a `target` manteniendo la proporción
/// (el lado largo se trunca).
fn short_edge_size(w: u32, h: u32, target: u32) -> (u32, u32) {
    if w <= h {
        (target, ((target as u64 * h as u64) / w as u64) as u32)
    } else {
        (((target as u64 * w as u64) / h as u64) as u32, target)
    }
}

fn fill_tensor(img: &RgbImage, norm: impl Fn(usize, f32) -> f32) -> Array4<f32> {
    let (w, h) = img.dimensions();
    let mut input = Array4::<f32>::zeros((1, 3, h as usize, w as usize));
    for (x, y, pixel) in img.enumerate_pixels() {
        for c in 0..3 {
            input[[0, c, y as usize, x as usize]] = norm(c, pixel[c] as f32 / 255.0);
        }
    }
    input
}

/// Softmax estable (resta el máximo antes de exponenciar).
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Índice del logit máximo; en empate gana el primero.
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}
