use std::sync::Arc;

use tracing::{info, warn};

use crate::application::ports::ActuatorPort;
use crate::domain::{actuation::ActuationCommand, errors::ActuationFailure};

/// Envío best-effort de la dosis a la bomba. Nunca devuelve error.
#[derive(Clone)]
pub struct ActuationController {
    actuator: Arc<dyn ActuatorPort>,
}

impl ActuationController {
    pub fn new(actuator: Arc<dyn ActuatorPort>) -> Self {
        Self { actuator }
    }

    pub async fn dispatch(&self, diseased_percentage: f64) {
        let command = ActuationCommand::for_diseased_percentage(diseased_percentage);
        match self.actuator.send(&command).await {
            Ok(()) => info!(
                "Bomba: mix1={} mix2={} (timeout {:.3}s)",
                command.dose1, command.dose2, command.timeout_secs
            ),
            Err(ActuationFailure::Unreachable(e)) => {
                warn!("Bomba inalcanzable, dosis mix1={} descartada: {}", command.dose1, e)
            }
            Err(e @ ActuationFailure::Rejected(_)) => {
                warn!("Bomba rechazó la orden mix1={}: {}", command.dose1, e)
            }
        }
    }
}
