//! Mapas de activación de clase (CAM).
//!
//! Para cada posición (y, x) del mapa de características se calcula
//! `Σ_c |w[c]| · |f[c, y, x]|`, se escala a 0..=255, se lleva al tamaño del
//! frame original, se colorea con JET y se mezcla con el frame.

use image::{imageops::FilterType, GrayImage, Luma, Rgb, RgbImage};
use ndarray::{Array2, ArrayView1, Zip};

use super::errors::{DomainError, DomainResult};
use super::model::{ClassWeights, FeatureMap};

/// Clase de enfermedad que se visualiza si el cliente no pide otra.
pub const DEFAULT_CAM_CLASS: usize = 2;
pub const FRAME_WEIGHT: f32 = 0.6;
pub const HEATMAP_WEIGHT: f32 = 0.4;

#[derive(Debug, Clone, Copy, Default)]
pub struct ClassActivationMapSynthesizer;

impl ClassActivationMapSynthesizer {
    /// Genera el overlay para `class_index` sobre `frame`. El resultado
    /// siempre tiene las dimensiones del frame.
    pub fn synthesize(
        &self,
        features: &FeatureMap,
        class_index: usize,
        weights: &ClassWeights,
        frame: &RgbImage,
    ) -> DomainResult<RgbImage> {
        let row = weights.row(class_index).ok_or_else(|| {
            DomainError::Inference(format!(
                "clase {class_index} fuera de rango (el modelo tiene {})",
                weights.num_classes()
            ))
        })?;
        let scores = activation_scores(features, row)?;
        let cam = normalize_to_u8(&scores);
        let heatmap = colorize(&resize_map(&cam, frame.width(), frame.height()));
        Ok(blend(frame, &heatmap))
    }
}

/// Suma ponderada por magnitudes (no producto escalar con signo).
pub fn activation_scores(
    features: &FeatureMap,
    weights: ArrayView1<f32>,
) -> DomainResult<Array2<f32>> {
    if features.channels() != weights.len() {
        return Err(DomainError::Inference(format!(
            "el mapa tiene {} canales y el vector de pesos {}",
            features.channels(),
            weights.len()
        )));
    }
    let mut cam = Array2::<f32>::zeros((features.height(), features.width()));
    for (plane, &w) in features.0.outer_iter().zip(weights.iter()) {
        let w = w.abs();
        Zip::from(&mut cam).and(&plane).for_each(|acc, &f| *acc += w * f.abs());
    }
    Ok(cam)
}

/// Escalado min-max a 0..=255 (truncando). Si max == min el mapa es todo 0.
pub fn normalize_to_u8(scores: &Array2<f32>) -> Array2<u8> {
    let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    if !(range > 0.0) || !range.is_finite() {
        return Array2::zeros(scores.raw_dim());
    }
    scores.mapv(|v| ((v - min) / range * 255.0) as u8)
}

/// Interpolación bilineal al tamaño del frame.
pub fn resize_map(cam: &Array2<u8>, width: u32, height: u32) -> GrayImage {
    let (h, w) = cam.dim();
    let gray = GrayImage::from_fn(w as u32, h as u32, |x, y| Luma([cam[[y as usize, x as usize]]]));
    image::imageops::resize(&gray, width, height, FilterType::Triangle)
}

pub fn colorize(map: &GrayImage) -> RgbImage {
    let lut = jet_lut();
    RgbImage::from_fn(map.width(), map.height(), |x, y| Rgb(lut[map.get_pixel(x, y)[0] as usize]))
}

/// Paleta JET: azul oscuro (0) -> cian -> amarillo -> rojo oscuro (255).
pub fn jet_lut() -> [[u8; 3]; 256] {
    let mut lut = [[0u8; 3]; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        let v = i as f32 / 255.0;
        let channel =
            |offset: f32| ((1.5 - (4.0 * v - offset).abs()).clamp(0.0, 1.0) * 255.0).round() as u8;
        *entry = [channel(3.0), channel(2.0), channel(1.0)];
    }
    lut
}

/// `0.6 * frame + 0.4 * heatmap`, redondeado y saturado.
pub fn blend(frame: &RgbImage, heatmap: &RgbImage) -> RgbImage {
    RgbImage::from_fn(frame.width(), frame.height(), |x, y| {
        let a = frame.get_pixel(x, y);
        let b = heatmap.get_pixel(x, y);
        Rgb(std::array::from_fn(|c| {
            (FRAME_WEIGHT * a[c] as f32 + HEATMAP_WEIGHT * b[c] as f32)
                .round()
                .clamp(0.0, 255.0) as u8
        }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    fn features() -> FeatureMap {
        // 2 canales, 2x3
        FeatureMap(Array3::from_shape_vec(
            (2, 2, 3),
            vec![1.0, -2.0, 3.0, 0.0, 4.0, -1.0, 0.5, 0.5, -0.5, 2.0, 0.0, 1.0],
        ).unwrap())
    }

    #[test]
    fn scores_use_absolute_values() {
        let weights = array![-1.0f32, 2.0];
        let scores = activation_scores(&features(), weights.view()).unwrap();
        assert_eq!(scores, array![[2.0, 3.0, 4.0], [4.0, 4.0, 3.0]]);
    }

    #[test]
    fn channel_mismatch_is_an_inference_error() {
        let weights = array![1.0f32, 2.0, 3.0];
        assert!(matches!(
            activation_scores(&features(), weights.view()),
            Err(DomainError::Inference(_))
        ));
    }

    #[test]
    fn normalization_spans_full_range() {
        let cam = normalize_to_u8(&array![[2.0, 3.0, 4.0], [4.0, 2.5, 3.0]]);
        assert_eq!(cam.iter().min(), Some(&0));
        assert_eq!(cam.iter().max(), Some(&255));
        assert_eq!(cam[[0, 1]], 127);
    }

    #[test]
    fn flat_map_normalizes_to_zero() {
        let cam = normalize_to_u8(&Array2::from_elem((4, 4), 7.5));
        assert!(cam.iter().all(|&v| v == 0));
    }

    #[test]
    fn jet_endpoints() {
        let lut = jet_lut();
        assert_eq!(lut[0], [0, 0, 128]);
        assert_eq!(lut[255], [128, 0, 0]);
    }

    #[test]
    fn blend_weights_frame_and_heatmap() {
        let frame = RgbImage::from_pixel(1, 1, Rgb([100, 200, 0]));
        let heat = RgbImage::from_pixel(1, 1, Rgb([255, 0, 50]));
        assert_eq!(blend(&frame, &heat).get_pixel(0, 0), &Rgb([162, 120, 20]));
    }

    #[test]
    fn overlay_matches_frame_size() {
        let weights =
            ClassWeights::new(&[vec![1.0, 1.0], vec![0.5, -0.5], vec![2.0, 1.0]], 2).unwrap();
        let frame = RgbImage::from_pixel(800, 600, Rgb([10, 120, 30]));
        let overlay = ClassActivationMapSynthesizer
            .synthesize(&features(), DEFAULT_CAM_CLASS, &weights, &frame)
            .unwrap();
        assert_eq!(overlay.dimensions(), (800, 600));
    }

    #[test]
    fn unknown_class_is_rejected() {
        let weights = ClassWeights::new(&[vec![1.0, 1.0]], 2).unwrap();
        let frame = RgbImage::new(4, 4);
        assert!(ClassActivationMapSynthesizer
            .synthesize(&features(), 3, &weights, &frame)
            .is_err());
    }
}
