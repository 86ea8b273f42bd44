use serde::{Deserialize, Serialize};

use super::classification::{ClassificationResult, HEALTHY_CONDITION};
use super::errors::{DomainError, DomainResult};

pub const MIN_BATCH: usize = 1;
pub const MAX_BATCH: usize = 10;

/// Resumen de salud de un lote. Los nombres JSON son los que ya consume
/// el cliente (`total_plants`, `plant`, `condition`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    #[serde(rename = "total_plants")]
    pub total: usize,
    pub healthy_count: usize,
    pub diseased_count: usize,
    pub healthy_percentage: f64,
    pub diseased_percentage: f64,
    #[serde(rename = "plant")]
    pub majority_plant: String,
    #[serde(rename = "condition")]
    pub majority_condition: String,
}

/// Resultado por imagen, en el orden de subida.
#[derive(Debug)]
pub enum ImageOutcome {
    Classified { filename: String, result: ClassificationResult },
    Failed { filename: String, error: DomainError },
}

pub fn validate_batch_size(count: usize) -> DomainResult<()> {
    if count < MIN_BATCH {
        return Err(DomainError::Validation("Se requiere al menos una imagen.".into()));
    }
    if count > MAX_BATCH {
        return Err(DomainError::Validation(format!(
            "Se permiten como máximo {MAX_BATCH} imágenes por petición (recibidas {count})."
        )));
    }
    Ok(())
}

/// Agrega las predicciones correctas. Sin ninguna, `NoValidPredictions`.
pub fn summarize(results: &[ClassificationResult]) -> DomainResult<BatchSummary> {
    let total = results.len();
    if total == 0 {
        return Err(DomainError::NoValidPredictions);
    }
    let healthy_count = results.iter().filter(|r| r.is_healthy()).count();
    let diseased_count = total - healthy_count;

    let majority_plant = stable_mode(results.iter().map(|r| r.plant.as_str()))
        .unwrap_or_default()
        .to_string();
    let majority_condition = stable_mode(
        results.iter().filter(|r| !r.is_healthy()).map(|r| r.condition.as_str()),
    )
    .unwrap_or(HEALTHY_CONDITION)
    .to_string();

    Ok(BatchSummary {
        total,
        healthy_count,
        diseased_count,
        healthy_percentage: healthy_count as f64 / total as f64 * 100.0,
        diseased_percentage: diseased_count as f64 / total as f64 * 100.0,
        majority_plant,
        majority_condition,
    })
}

/// Valor más frecuente; en empate gana el que apareció primero.
pub fn stable_mode<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for v in values {
        match counts.iter_mut().find(|(k, _)| *k == v) {
            Some((_, n)) => *n += 1,
            None => counts.push((v, 1)),
        }
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (k, n)| match best {
            Some((_, b)) if b >= n => best,
            _ => Some((k, n)),
        })
        .map(|(k, _)| k)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(label: &str) -> ClassificationResult {
        ClassificationResult::from_label(label, 0.9)
    }

    #[test]
    fn tie_goes_to_first_seen() {
        assert_eq!(stable_mode(["A", "B", "A", "B"]), Some("A"));
        assert_eq!(stable_mode(["B", "A", "A", "B"]), Some("B"));
        assert_eq!(stable_mode(["rust", "blight", "rust"]), Some("rust"));
        assert_eq!(stable_mode(Vec::<&str>::new()), None);
    }

    #[test]
    fn counts_and_percentages() {
        let results = vec![
            result("Tomato___Late_blight"),
            result("Tomato___healthy"),
            result("Potato___Early_blight"),
            result("Tomato___Late_blight"),
        ];
        let s = summarize(&results).unwrap();
        assert_eq!(s.total, 4);
        assert_eq!(s.healthy_count + s.diseased_count, s.total);
        assert_eq!(s.diseased_count, 3);
        assert_eq!(s.healthy_percentage, 25.0);
        assert_eq!(s.diseased_percentage, 75.0);
        assert_eq!(s.majority_plant, "Tomato");
        assert_eq!(s.majority_condition, "Late blight");
    }

    #[test]
    fn all_healthy_reports_healthy_condition() {
        let s = summarize(&[result("Apple___healthy"), result("Grape___healthy")]).unwrap();
        assert_eq!(s.diseased_count, 0);
        assert_eq!(s.majority_condition, "healthy");
        assert_eq!(s.majority_plant, "Apple");
    }

    #[test]
    fn empty_batch_has_no_valid_predictions() {
        assert!(matches!(summarize(&[]), Err(DomainError::NoValidPredictions)));
    }

    #[test]
    fn batch_size_bounds() {
        assert!(matches!(validate_batch_size(0), Err(DomainError::Validation(_))));
        assert!(matches!(validate_batch_size(11), Err(DomainError::Validation(_))));
        assert!(validate_batch_size(1).is_ok());
        assert!(validate_batch_size(10).is_ok());
    }

    #[test]
    fn serializes_with_wire_names() {
        let s = summarize(&[result("Corn_(maize)___Common_rust_")]).unwrap();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["total_plants"], 1);
        assert_eq!(json["plant"], "Corn (maize)");
        assert_eq!(json["condition"], "Common rust ");
    }
}
