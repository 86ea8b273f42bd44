use serde::{Deserialize, Serialize};

/// Separador entre planta y condición en las etiquetas ("Tomato___Late_blight").
pub const LABEL_DELIMITER: &str = "___";
pub const UNKNOWN_CONDITION: &str = "Unknown";
pub const HEALTHY_CONDITION: &str = "healthy";

/// Clases PlantVillage (38) en el orden de salida del clasificador.
pub const PLANT_VILLAGE_CLASSES: [&str; 38] = [
    "Apple___Apple_scab",
    "Apple___Black_rot",
    "Apple___Cedar_apple_rust",
    "Apple___healthy",
    "Blueberry___healthy",
    "Cherry_(including_sour)___Powdery_mildew",
    "Cherry_(including_sour)___healthy",
    "Corn_(maize)___Cercospora_leaf_spot Gray_leaf_spot",
    "Corn_(maize)___Common_rust_",
    "Corn_(maize)___Northern_Leaf_Blight",
    "Corn_(maize)___healthy",
    "Grape___Black_rot",
    "Grape___Esca_(Black_Measles)",
    "Grape___Leaf_blight_(Isariopsis_Leaf_Spot)",
    "Grape___healthy",
    "Orange___Haunglongbing_(Citrus_greening)",
    "Peach___Bacterial_spot",
    "Peach___healthy",
    "Pepper,_bell___Bacterial_spot",
    "Pepper,_bell___healthy",
    "Potato___Early_blight",
    "Potato___Late_blight",
    "Potato___healthy",
    "Raspberry___healthy",
    "Soybean___healthy",
    "Squash___Powdery_mildew",
    "Strawberry___Leaf_scorch",
    "Strawberry___healthy",
    "Tomato___Bacterial_spot",
    "Tomato___Early_blight",
    "Tomato___Late_blight",
    "Tomato___Leaf_Mold",
    "Tomato___Septoria_leaf_spot",
    "Tomato___Spider_mites Two-spotted_spider_mite",
    "Tomato___Target_Spot",
    "Tomato___Tomato_Yellow_Leaf_Curl_Virus",
    "Tomato___Tomato_mosaic_virus",
    "Tomato___healthy",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub class_name: String,
    pub plant: String,
    pub condition: String,
    pub confidence: f32,
}

impl ClassificationResult {
    pub fn from_label(label: &str, confidence: f32) -> Self {
        let (plant, condition) = parse_class_label(label);
        // clamp deja pasar NaN
        let confidence = if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) };
        Self {
            class_name: label.to_string(),
            plant,
            condition,
            confidence,
        }
    }

    pub fn is_healthy(&self) -> bool {
        is_healthy_condition(&self.condition)
    }
}

pub fn is_healthy_condition(condition: &str) -> bool {
    condition.eq_ignore_ascii_case(HEALTHY_CONDITION)
}

/// Separa "Planta___Condicion" en (planta, condición) cambiando '_' por espacios.
pub fn parse_class_label(label: &str) -> (String, String) {
    let mut parts = label.split(LABEL_DELIMITER);
    let plant = parts.next().unwrap_or_default().replace('_', " ");
    let condition = parts
        .next()
        .map(|c| c.replace('_', " "))
        .unwrap_or_else(|| UNKNOWN_CONDITION.to_string());
    (plant, condition)
}
