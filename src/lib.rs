//! SafeTrade onboarding: sign-up and KYC wizards with OTP verification.

pub mod config;
pub mod console;
pub mod error;
pub mod i18n;
pub mod onboarding;
pub mod otp;
pub mod validation;
