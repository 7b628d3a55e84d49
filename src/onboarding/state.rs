//! Wizard state: current step, field values, inline errors and status.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::validation::FieldValue;

/// Lifecycle of a wizard.
///
/// InProgress → Submitting → Complete, with Submitting → InProgress when the
/// completion call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStatus {
    #[default]
    InProgress,
    Submitting,
    Complete,
}

impl WizardStatus {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: WizardStatus) -> bool {
        use WizardStatus::*;
        matches!(
            (self, target),
            (InProgress, Submitting) | (Submitting, InProgress) | (Submitting, Complete)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl std::fmt::Display for WizardStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InProgress => "in_progress",
            Self::Submitting => "submitting",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// In-memory state of one wizard run. Discarded on completion or teardown.
#[derive(Debug)]
pub struct WizardState {
    /// 1-based, always within `[1, total_steps]`.
    current_step: u8,
    total_steps: u8,
    fields: BTreeMap<&'static str, FieldValue>,
    /// Field name → inline message, for the step last validated.
    errors: BTreeMap<String, String>,
    status: WizardStatus,
}

impl WizardState {
    pub fn new(total_steps: u8) -> Self {
        Self {
            current_step: 1,
            total_steps: total_steps.max(1),
            fields: BTreeMap::new(),
            errors: BTreeMap::new(),
            status: WizardStatus::default(),
        }
    }

    /// Pre-fill a field before the wizard starts.
    pub fn prefill(mut self, name: &'static str, value: FieldValue) -> Self {
        self.fields.insert(name, value);
        self
    }

    pub fn current_step(&self) -> u8 {
        self.current_step
    }

    pub fn total_steps(&self) -> u8 {
        self.total_steps
    }

    pub fn status(&self) -> WizardStatus {
        self.status
    }

    pub fn fields(&self) -> &BTreeMap<&'static str, FieldValue> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    /// Store a value. Only allowed while the wizard is in progress.
    pub fn set_field(&mut self, name: &'static str, value: FieldValue) -> Result<(), String> {
        if self.status != WizardStatus::InProgress {
            return Err(format!("Cannot edit fields while {}", self.status));
        }
        self.fields.insert(name, value);
        Ok(())
    }

    /// Replace the inline messages with those of the step just validated.
    pub fn replace_errors(&mut self, errors: BTreeMap<String, String>) {
        self.errors = errors;
    }

    pub fn set_error(&mut self, name: &str, message: impl Into<String>) {
        self.errors.insert(name.to_string(), message.into());
    }

    pub fn is_final_step(&self) -> bool {
        self.current_step == self.total_steps
    }

    /// Move forward one step, bounded at the last.
    pub fn step_forward(&mut self) -> u8 {
        self.current_step = (self.current_step + 1).min(self.total_steps);
        self.current_step
    }

    /// Move back one step, bounded at the first.
    pub fn step_back(&mut self) -> u8 {
        self.current_step = self.current_step.saturating_sub(1).max(1);
        self.current_step
    }

    /// `(current_step - 1) / total_steps * 100`.
    pub fn progress_percent(&self) -> f64 {
        f64::from(self.current_step - 1) / f64::from(self.total_steps) * 100.0
    }

    /// Change status. Returns an error for transitions the lifecycle forbids.
    pub fn transition_to(&mut self, target: WizardStatus) -> Result<WizardStatus, String> {
        if !self.status.can_transition_to(target) {
            return Err(format!("Cannot transition from {} to {}", self.status, target));
        }
        self.status = target;
        Ok(target)
    }
}
