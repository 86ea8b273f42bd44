use async_trait::async_trait;

use crate::application::ports::ActuatorPort;
use crate::domain::actuation::ActuationCommand;
use crate::domain::errors::ActuationFailure;

/// Bomba dosificadora (NodeMCU) accesible por HTTP.
pub struct HttpPumpClient {
    client: reqwest::Client,
    url: String,
}

impl HttpPumpClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), url: url.into() }
    }
}

#[async_trait]
impl ActuatorPort for HttpPumpClient {
    async fn send(&self, command: &ActuationCommand) -> Result<(), ActuationFailure> {
        // timeout proporcional a la dosis
        let res = self
            .client
            .post(&self.url)
            .json(command)
            .timeout(command.timeout())
            .send()
            .await
            .map_err(|e| ActuationFailure::Unreachable(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(ActuationFailure::Rejected(status.as_u16()));
        }
        Ok(())
    }
}
