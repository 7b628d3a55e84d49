//! Configuration types.

use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::i18n::Language;
use crate::otp::{OtpPolicy, OtpSettings};

/// Wizard configuration.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    /// Seconds before a code may be resent.
    pub otp_cooldown_secs: u32,
    /// Cooldown tick period.
    pub otp_tick: Duration,
    /// Artificial latency of the simulated backend (send and submit).
    pub simulated_delay: Duration,
    pub otp_policy: OtpPolicy,
    /// Language for labels in status views.
    pub language: Language,
    pub http_port: u16,
    /// Wizards untouched for this long are dropped from the registry.
    pub idle_timeout: Duration,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            otp_cooldown_secs: 60,
            otp_tick: Duration::from_secs(1),
            simulated_delay: Duration::from_millis(1500),
            otp_policy: OtpPolicy::default(),
            language: Language::default(),
            http_port: 8080,
            idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

impl WizardConfig {
    /// Read overrides from `SAFETRADE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let delay_ms: u64 = parse_or(
            &lookup,
            "SAFETRADE_SIM_DELAY_MS",
            defaults.simulated_delay.as_millis() as u64,
        )?;
        let idle_secs: u64 = parse_or(
            &lookup,
            "SAFETRADE_IDLE_TIMEOUT_SECS",
            defaults.idle_timeout.as_secs(),
        )?;

        Ok(Self {
            otp_cooldown_secs: parse_or(
                &lookup,
                "SAFETRADE_OTP_COOLDOWN_SECS",
                defaults.otp_cooldown_secs,
            )?,
            otp_tick: defaults.otp_tick,
            simulated_delay: Duration::from_millis(delay_ms),
            otp_policy: parse_or(&lookup, "SAFETRADE_OTP_POLICY", defaults.otp_policy)?,
            language: parse_or(&lookup, "SAFETRADE_LANG", defaults.language)?,
            http_port: parse_or(&lookup, "SAFETRADE_HTTP_PORT", defaults.http_port)?,
            idle_timeout: Duration::from_secs(idle_secs),
        })
    }

    pub fn otp_settings(&self) -> OtpSettings {
        OtpSettings {
            cooldown_secs: self.otp_cooldown_secs,
            tick: self.otp_tick,
            policy: self.otp_policy,
        }
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{raw}': {e}"),
        }),
    }
}
