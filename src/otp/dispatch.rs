//! Code delivery.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::OtpError;

/// Delivers a one-time code to a destination (phone number).
#[async_trait]
pub trait CodeDispatcher: Send + Sync {
    fn name(&self) -> &str;

    async fn dispatch(&self, destination: &str, code: &str) -> Result<(), OtpError>;
}

/// Stand-in for an SMS gateway: waits a fixed delay, then reports success.
pub struct SimulatedDispatcher {
    delay: Duration,
}

impl SimulatedDispatcher {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl CodeDispatcher for SimulatedDispatcher {
    fn name(&self) -> &str {
        "simulated-sms"
    }

    async fn dispatch(&self, destination: &str, code: &str) -> Result<(), OtpError> {
        tokio::time::sleep(self.delay).await;
        debug!(destination, code, "Simulated code dispatch");
        Ok(())
    }
}
