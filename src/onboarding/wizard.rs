//! StepWizard: drives one sign-up or KYC run.
//!
//! All mutation goes through `set_field`, `advance`, `retreat` and
//! `submit_final`. Simulated backend calls race a cancellation token, so a
//! torn-down wizard never applies a late result.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::completion::{Completion, CompletionHandler, SimulatedCompletion, Submission};
use super::model::{Flow, WizardKind};
use super::state::{WizardState, WizardStatus};
use crate::config::WizardConfig;
use crate::error::{OtpError, SubmitError, WizardError};
use crate::i18n::Translator;
use crate::otp::{
    CodeDispatcher, OTP_LENGTH, OtpChallenge, OtpPhase, OtpSettings, OtpState, SimulatedDispatcher,
};
use crate::validation::{
    FieldInput, FieldKind, FieldValue, FileRef, PasswordStrength, sanitize_phone, validate_step,
};

/// Collaborators shared by every wizard.
#[derive(Clone)]
pub struct WizardDeps {
    pub dispatcher: Arc<dyn CodeDispatcher>,
    pub completion: Arc<dyn CompletionHandler>,
    pub otp: OtpSettings,
    pub translator: Translator,
}

impl WizardDeps {
    /// Simulated backend with the configured delays.
    pub fn simulated(config: &WizardConfig) -> Self {
        Self {
            dispatcher: Arc::new(SimulatedDispatcher::new(config.simulated_delay)),
            completion: Arc::new(SimulatedCompletion::new(config.simulated_delay)),
            otp: config.otp_settings(),
            translator: Translator::new(config.language),
        }
    }
}

/// Result of a successful `advance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Advance {
    Moved { step: u8 },
    /// Entered the verification step and the code went out.
    CodeSent { step: u8 },
    /// Entered the verification step but dispatch failed; resend is open.
    CodeNotSent { step: u8, reason: String },
    /// Already on the last step; use `submit_final`.
    AtFinalStep { step: u8 },
}

pub struct StepWizard {
    id: Uuid,
    flow: &'static Flow,
    state: WizardState,
    otp: Option<OtpChallenge>,
    completion: Arc<dyn CompletionHandler>,
    translator: Translator,
    cancel: CancellationToken,
    completed: Option<Completion>,
}

impl StepWizard {
    pub fn new(kind: WizardKind, deps: &WizardDeps) -> Self {
        let flow = kind.flow();
        let cancel = CancellationToken::new();
        let otp = flow.otp.map(|_| {
            OtpChallenge::new(deps.otp, Arc::clone(&deps.dispatcher), cancel.child_token())
        });

        let state = flow
            .defaults
            .iter()
            .fold(WizardState::new(flow.total_steps()), |state, &(name, value)| {
                state.prefill(name, FieldValue::Text(value.to_string()))
            });

        let id = Uuid::new_v4();
        info!(wizard_id = %id, kind = %kind, steps = flow.total_steps(), "Wizard started");

        Self {
            id,
            flow,
            state,
            otp,
            completion: Arc::clone(&deps.completion),
            translator: deps.translator,
            cancel,
            completed: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> WizardKind {
        self.flow.kind
    }

    pub fn current_step(&self) -> u8 {
        self.state.current_step()
    }

    pub fn total_steps(&self) -> u8 {
        self.state.total_steps()
    }

    pub fn status(&self) -> WizardStatus {
        self.state.status()
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        self.state.errors()
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.state.field(name)
    }

    pub fn otp_state(&self) -> Option<OtpState> {
        self.otp.as_ref().map(OtpChallenge::state)
    }

    pub fn completion(&self) -> Option<&Completion> {
        self.completed.as_ref()
    }

    /// `(current_step - 1) / total_steps * 100`.
    pub fn progress_percent(&self) -> f64 {
        self.state.progress_percent()
    }

    /// Token that tears the wizard down when cancelled. Hand it to whoever
    /// owns the view so a pending call can be abandoned from outside.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Store a value for a field the flow declares.
    pub fn set_field(&mut self, name: &str, input: FieldInput) -> Result<(), WizardError> {
        self.ensure_in_progress()?;
        let (_, spec) = self.flow.field(name).ok_or_else(|| WizardError::UnknownField {
            flow: self.flow.kind.to_string(),
            name: name.to_string(),
        })?;
        let is_code_field = self.flow.otp.is_some_and(|otp| otp.code_field == spec.name);

        let value = match (spec.kind, input) {
            (_, FieldInput::Clear) => FieldValue::Empty,
            (FieldKind::Text, FieldInput::Text(text)) if is_code_field => FieldValue::Text(
                text.chars()
                    .filter(|c| c.is_ascii_digit())
                    .take(OTP_LENGTH)
                    .collect(),
            ),
            (FieldKind::Text, FieldInput::Text(text)) => FieldValue::Text(text),
            (FieldKind::Secret, FieldInput::Text(text)) => FieldValue::Secret(text.into()),
            (FieldKind::Phone, FieldInput::Text(text)) => FieldValue::Text(sanitize_phone(&text)),
            (FieldKind::Flag, FieldInput::Flag(checked)) => FieldValue::Flag(checked),
            (FieldKind::File, FieldInput::File { name: file, size_bytes }) => {
                let file = FileRef::new(file, size_bytes).map_err(|e| WizardError::InvalidValue {
                    name: spec.name.to_string(),
                    reason: e.to_string(),
                })?;
                FieldValue::File(file)
            }
            (kind, _) => {
                let expected = match kind {
                    FieldKind::Flag => "true or false",
                    FieldKind::File => "a file",
                    FieldKind::Text | FieldKind::Secret | FieldKind::Phone => "text",
                };
                return Err(WizardError::InvalidValue {
                    name: spec.name.to_string(),
                    reason: format!("expected {expected}"),
                });
            }
        };

        self.state
            .set_field(spec.name, value)
            .map_err(|_| WizardError::Busy)
    }

    /// Validate the current step and move forward.
    ///
    /// On failure `errors` is replaced with this step's messages and the
    /// step does not change. Entering the verification step sends a code
    /// unless one sent earlier is still inside its cooldown.
    pub async fn advance(&mut self) -> Result<Advance, WizardError> {
        self.ensure_in_progress()?;
        self.validate_current_step()?;

        if self.state.is_final_step() {
            return Ok(Advance::AtFinalStep {
                step: self.state.current_step(),
            });
        }

        let step = self.state.step_forward();
        info!(wizard_id = %self.id, kind = %self.flow.kind, step, "Wizard advanced");

        let Some(otp_step) = self.flow.otp.filter(|otp| otp.step == step) else {
            return Ok(Advance::Moved { step });
        };
        let destination = format!(
            "{}{}",
            otp_step.dial_prefix,
            self.field_text(otp_step.destination_field)
        );
        let Some(otp) = self.otp.as_mut() else {
            return Ok(Advance::Moved { step });
        };
        match otp.phase() {
            OtpPhase::Idle | OtpPhase::ReadyToResend => {}
            OtpPhase::Sent | OtpPhase::Verified => {
                debug!(
                    wizard_id = %self.id,
                    cooldown = otp.cooldown_remaining(),
                    "Earlier code still current, not sending"
                );
                return Ok(Advance::Moved { step });
            }
        }
        match otp.send(&destination).await {
            Ok(()) => Ok(Advance::CodeSent { step }),
            Err(e) => {
                warn!(wizard_id = %self.id, "Entered verification step without a code: {}", e);
                Ok(Advance::CodeNotSent {
                    step,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Go back one step. Values and errors are kept; nothing is validated.
    pub fn retreat(&mut self) -> u8 {
        if self.state.status() != WizardStatus::InProgress {
            return self.state.current_step();
        }
        self.state.step_back()
    }

    /// Resend the verification code, subject to the cooldown.
    pub async fn resend_code(&mut self) -> Result<(), WizardError> {
        self.ensure_in_progress()?;
        let otp = self.otp.as_mut().ok_or(OtpError::NotSent)?;
        otp.resend().await?;
        Ok(())
    }

    /// Validate the last step, verify the code and hand everything to the
    /// completion handler.
    ///
    /// A failed or cancelled completion returns the wizard to `InProgress`
    /// on the same step, so the call can be retried.
    pub async fn submit_final(&mut self) -> Result<Completion, WizardError> {
        self.ensure_in_progress()?;
        if !self.state.is_final_step() {
            return Err(WizardError::NotAtFinalStep {
                step: self.state.current_step(),
                total: self.state.total_steps(),
            });
        }
        self.validate_current_step()?;

        if let Some(otp_step) = self.flow.otp.filter(|otp| otp.step == self.state.current_step()) {
            let attempt = self.field_text(otp_step.code_field).to_string();
            if let Some(otp) = self.otp.as_mut() {
                if let Err(e) = otp.verify(&attempt) {
                    self.state.set_error(otp_step.code_field, e.to_string());
                    return Err(e.into());
                }
            }
        }

        self.set_status(WizardStatus::Submitting);
        let submission = Submission {
            wizard_id: self.id,
            kind: self.flow.kind,
            fields: self.state.fields(),
        };
        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => Err(SubmitError::Cancelled),
            result = self.completion.complete(&submission) => result,
        };

        match outcome {
            Ok(done) => {
                self.set_status(WizardStatus::Complete);
                info!(
                    wizard_id = %self.id,
                    kind = %self.flow.kind,
                    handler = self.completion.name(),
                    next_page = ?done.next_page,
                    "Wizard complete"
                );
                self.completed = Some(done.clone());
                Ok(done)
            }
            Err(e) => {
                self.set_status(WizardStatus::InProgress);
                warn!(wizard_id = %self.id, handler = self.completion.name(), "Submission failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Stop the cooldown ticker and abandon any pending call.
    pub fn teardown(&mut self) {
        self.cancel.cancel();
        if let Some(otp) = self.otp.as_mut() {
            otp.teardown();
        }
    }

    /// Snapshot for display.
    pub fn view(&self) -> WizardView {
        let t = &self.translator;
        let step = self.state.current_step();
        let fields = self
            .flow
            .step(step)
            .map(|def| def.fields)
            .unwrap_or_default()
            .iter()
            .map(|spec| FieldView {
                name: spec.name,
                label: t.t(spec.label_key),
                kind: spec.kind,
                required: spec.required,
                value: self
                    .state
                    .field(spec.name)
                    .map(FieldValue::to_public_json)
                    .unwrap_or(serde_json::Value::Null),
            })
            .collect();
        let password_strength = self
            .flow
            .step(step)
            .and_then(|def| def.fields.iter().find(|f| f.kind == FieldKind::Secret))
            .map(|spec| PasswordStrength::evaluate(self.field_text(spec.name)));

        WizardView {
            id: self.id,
            kind: self.flow.kind,
            title: t.t(self.flow.title_key),
            status: self.state.status(),
            current_step: step,
            total_steps: self.state.total_steps(),
            step_title: self.flow.step(step).map(|def| t.t(def.title_key)).unwrap_or(""),
            progress_percent: if self.state.status().is_terminal() {
                100.0
            } else {
                self.state.progress_percent()
            },
            fields,
            errors: self.state.errors().clone(),
            password_strength,
            otp: self.otp_state(),
            completion: self.completed.clone(),
        }
    }

    fn ensure_in_progress(&self) -> Result<(), WizardError> {
        match self.state.status() {
            WizardStatus::InProgress => Ok(()),
            WizardStatus::Submitting => Err(WizardError::Busy),
            WizardStatus::Complete => Err(WizardError::AlreadyComplete),
        }
    }

    fn validate_current_step(&mut self) -> Result<(), WizardError> {
        let step = self.state.current_step();
        let specs = self.flow.step(step).map(|def| def.fields).unwrap_or_default();
        let issues = validate_step(specs, self.state.fields());

        self.state.replace_errors(
            issues
                .iter()
                .map(|issue| (issue.error.field().to_string(), issue.message.to_string()))
                .collect(),
        );
        if issues.is_empty() {
            return Ok(());
        }
        info!(wizard_id = %self.id, step, invalid = issues.len(), "Step validation failed");
        Err(WizardError::StepInvalid {
            step,
            errors: issues.into_iter().map(|issue| issue.error).collect(),
        })
    }

    fn field_text(&self, name: &str) -> &str {
        self.state
            .field(name)
            .and_then(FieldValue::as_text)
            .unwrap_or("")
    }

    fn set_status(&mut self, target: WizardStatus) {
        if let Err(e) = self.state.transition_to(target) {
            warn!(wizard_id = %self.id, "{}", e);
        }
    }
}

impl Drop for StepWizard {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// One field of the current step, safe to display.
#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub value: serde_json::Value,
}

/// Display snapshot of a wizard.
#[derive(Debug, Clone, Serialize)]
pub struct WizardView {
    pub id: Uuid,
    pub kind: WizardKind,
    pub title: &'static str,
    pub status: WizardStatus,
    pub current_step: u8,
    pub total_steps: u8,
    pub step_title: &'static str,
    pub progress_percent: f64,
    pub fields: Vec<FieldView>,
    pub errors: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_strength: Option<PasswordStrength>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<OtpState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<Completion>,
}
