//! One-time-code challenge used by the phone verification steps.

pub mod challenge;
pub mod cooldown;
pub mod dispatch;
pub mod entry;

pub use challenge::{OTP_LENGTH, OtpChallenge, OtpPhase, OtpPolicy, OtpSettings, OtpState};
pub use cooldown::Cooldown;
pub use dispatch::{CodeDispatcher, SimulatedDispatcher};
pub use entry::OtpEntry;
