//! One-time-code challenge state machine.
//!
//! Progresses: Idle → Sent → ReadyToResend → Sent → … → Verified.
//! `Verified` is terminal for a challenge instance.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::cooldown::Cooldown;
use super::dispatch::CodeDispatcher;
use crate::error::OtpError;
use crate::validation::is_digit_code;

/// Number of digits in a code.
pub const OTP_LENGTH: usize = 6;

/// How `verify` decides whether a well-formed code is correct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPolicy {
    /// Any six digits pass. Matches the simulated backend, which never
    /// shows the user a real code.
    #[default]
    AcceptAnyWellFormed,
    /// The attempt must equal the code handed to the dispatcher.
    MatchIssued,
}

impl std::str::FromStr for OtpPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept_any" | "accept_any_well_formed" => Ok(Self::AcceptAnyWellFormed),
            "match_issued" => Ok(Self::MatchIssued),
            other => Err(format!("unknown OTP policy '{other}'")),
        }
    }
}

/// Challenge tunables.
#[derive(Debug, Clone, Copy)]
pub struct OtpSettings {
    pub cooldown_secs: u32,
    pub tick: Duration,
    pub policy: OtpPolicy,
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            cooldown_secs: 60,
            tick: Duration::from_secs(1),
            policy: OtpPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPhase {
    Idle,
    Sent,
    ReadyToResend,
    Verified,
}

impl std::fmt::Display for OtpPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Sent => "sent",
            Self::ReadyToResend => "ready_to_resend",
            Self::Verified => "verified",
        };
        write!(f, "{s}")
    }
}

/// Observable challenge state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtpState {
    pub phase: OtpPhase,
    pub code_sent_at: Option<DateTime<Utc>>,
    pub cooldown_remaining: u32,
    pub attempt: String,
    pub verified: bool,
}

pub struct OtpChallenge {
    settings: OtpSettings,
    dispatcher: Arc<dyn CodeDispatcher>,
    cooldown: Cooldown,
    cancel: CancellationToken,
    destination: Option<String>,
    code_sent_at: Option<DateTime<Utc>>,
    issued: Option<SecretString>,
    attempt: String,
    verified: bool,
    dispatch_count: u32,
}

impl OtpChallenge {
    pub fn new(
        settings: OtpSettings,
        dispatcher: Arc<dyn CodeDispatcher>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            settings,
            dispatcher,
            cooldown: Cooldown::new(cancel.clone()),
            cancel,
            destination: None,
            code_sent_at: None,
            issued: None,
            attempt: String::new(),
            verified: false,
            dispatch_count: 0,
        }
    }

    pub fn phase(&self) -> OtpPhase {
        if self.verified {
            OtpPhase::Verified
        } else if self.code_sent_at.is_none() {
            OtpPhase::Idle
        } else if self.cooldown.remaining() > 0 {
            OtpPhase::Sent
        } else {
            OtpPhase::ReadyToResend
        }
    }

    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown.remaining()
    }

    /// Number of codes successfully dispatched by this challenge.
    pub fn dispatch_count(&self) -> u32 {
        self.dispatch_count
    }

    pub fn state(&self) -> OtpState {
        OtpState {
            phase: self.phase(),
            code_sent_at: self.code_sent_at,
            cooldown_remaining: self.cooldown.remaining(),
            attempt: self.attempt.clone(),
            verified: self.verified,
        }
    }

    /// Issue a new code to `destination` and start the cooldown.
    ///
    /// The cooldown starts once the dispatcher reports success. A cancelled
    /// or failed dispatch leaves the previous send state untouched.
    pub async fn send(&mut self, destination: &str) -> Result<(), OtpError> {
        if self.verified {
            return Err(OtpError::AlreadyVerified);
        }
        self.destination = Some(destination.to_string());

        let code = generate_code();
        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => Err(OtpError::Cancelled),
            result = self.dispatcher.dispatch(destination, &code) => result,
        };
        if let Err(e) = outcome {
            warn!(dispatcher = self.dispatcher.name(), "Code dispatch failed: {}", e);
            return Err(e);
        }

        self.code_sent_at = Some(Utc::now());
        self.issued = Some(SecretString::from(code));
        self.dispatch_count += 1;
        self.cooldown
            .start(self.settings.cooldown_secs, self.settings.tick);
        info!(
            dispatcher = self.dispatcher.name(),
            cooldown_secs = self.settings.cooldown_secs,
            "Verification code sent"
        );
        Ok(())
    }

    /// Send again to the last destination. Rejected while the cooldown runs;
    /// a rejected resend changes nothing and dispatches nothing.
    pub async fn resend(&mut self) -> Result<(), OtpError> {
        if self.verified {
            return Err(OtpError::AlreadyVerified);
        }
        let destination = self.destination.clone().ok_or(OtpError::NotSent)?;
        let remaining = self.cooldown.remaining();
        if remaining > 0 {
            return Err(OtpError::CooldownActive { remaining });
        }
        self.send(&destination).await
    }

    /// Check an attempt. Verifying an already verified challenge succeeds;
    /// nothing verifies before a code has gone out.
    pub fn verify(&mut self, attempt: &str) -> Result<(), OtpError> {
        if self.verified {
            return Ok(());
        }
        self.attempt = attempt
            .chars()
            .filter(|c| c.is_ascii_digit())
            .take(OTP_LENGTH)
            .collect();

        if !is_digit_code(attempt, OTP_LENGTH) {
            return Err(OtpError::InvalidFormat {
                expected: OTP_LENGTH,
            });
        }

        if self.code_sent_at.is_none() {
            return Err(OtpError::NotSent);
        }
        if self.settings.policy == OtpPolicy::MatchIssued {
            let issued = self.issued.as_ref().ok_or(OtpError::NotSent)?;
            if issued.expose_secret() != attempt {
                return Err(OtpError::CodeMismatch);
            }
        }

        self.verified = true;
        self.cooldown.stop();
        info!("Verification code accepted");
        Ok(())
    }

    /// Stop the cooldown and abandon any pending dispatch.
    pub fn teardown(&mut self) {
        self.cancel.cancel();
        self.cooldown.stop();
    }
}

fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{n:0width$}", width = OTP_LENGTH)
}
