//! Terminal "complete" collaborator: create the account or file the KYC
//! review once the last step verifies.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::model::{Page, WizardKind};
use crate::error::SubmitError;
use crate::validation::FieldValue;

/// Everything the wizard collected, handed to the completion handler.
#[derive(Debug)]
pub struct Submission<'a> {
    pub wizard_id: Uuid,
    pub kind: WizardKind,
    pub fields: &'a BTreeMap<&'static str, FieldValue>,
}

/// Successful completion, including where the page shell should go next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Completion {
    pub reference: Uuid,
    pub completed_at: DateTime<Utc>,
    pub next_page: Page,
}

#[async_trait]
pub trait CompletionHandler: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, submission: &Submission<'_>) -> Result<Completion, SubmitError>;
}

/// Stand-in backend: waits a fixed delay and always succeeds.
pub struct SimulatedCompletion {
    delay: Duration,
}

impl SimulatedCompletion {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl CompletionHandler for SimulatedCompletion {
    fn name(&self) -> &str {
        "simulated-backend"
    }

    async fn complete(&self, submission: &Submission<'_>) -> Result<Completion, SubmitError> {
        tokio::time::sleep(self.delay).await;
        debug!(
            wizard_id = %submission.wizard_id,
            kind = %submission.kind,
            fields = submission.fields.len(),
            "Simulated submission accepted"
        );
        Ok(Completion {
            reference: Uuid::new_v4(),
            completed_at: Utc::now(),
            next_page: submission.kind.flow().next_page,
        })
    }
}
