use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Factor de dilución de la bomba: dosis = porcentaje * 100 / 1.7.
pub const DOSE_DIVISOR: f64 = 1.7;
/// Espera mínima de la petición a la bomba, en segundos.
pub const BASE_TIMEOUT_SECS: f64 = 5.0;

/// Orden para la bomba dosificadora. En el cable el firmware espera
/// `{"mix1": .., "mix2": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuationCommand {
    #[serde(rename = "mix1")]
    pub dose1: u64,
    #[serde(rename = "mix2")]
    pub dose2: f64,
    #[serde(skip)]
    pub timeout_secs: f64,
}

impl ActuationCommand {
    pub fn for_diseased_percentage(diseased_percentage: f64) -> Self {
        let pct = if diseased_percentage.is_finite() { diseased_percentage.max(0.0) } else { 0.0 };
        let dose1 = (pct * 100.0 / DOSE_DIVISOR).floor() as u64;
        Self {
            dose1,
            dose2: dose1 as f64 / 2.0,
            timeout_secs: dose1 as f64 / 1000.0 + BASE_TIMEOUT_SECS,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }
}
