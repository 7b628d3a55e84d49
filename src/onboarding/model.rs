//! Flow definitions for the sign-up and KYC wizards.

use serde::{Deserialize, Serialize};

use crate::otp::OTP_LENGTH;
use crate::validation::{FieldSpec, Rule};

/// Which wizard is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardKind {
    SignUp,
    Kyc,
}

impl WizardKind {
    pub fn flow(&self) -> &'static Flow {
        match self {
            Self::SignUp => &SIGN_UP,
            Self::Kyc => &KYC,
        }
    }
}

impl std::fmt::Display for WizardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::SignUp => "sign_up",
            Self::Kyc => "kyc",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for WizardKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sign_up" | "signup" => Ok(Self::SignUp),
            "kyc" => Ok(Self::Kyc),
            other => Err(format!("unknown wizard '{other}'")),
        }
    }
}

/// Screen the page shell shows after a wizard completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Kyc,
    Dashboard,
}

/// One screen of a wizard.
#[derive(Debug)]
pub struct StepDef {
    pub title_key: &'static str,
    pub fields: &'static [FieldSpec],
}

/// Where the verification code goes and which field receives it.
#[derive(Debug, Clone, Copy)]
pub struct OtpStep {
    pub step: u8,
    pub code_field: &'static str,
    pub destination_field: &'static str,
    pub dial_prefix: &'static str,
}

/// Static description of a whole wizard.
#[derive(Debug)]
pub struct Flow {
    pub kind: WizardKind,
    pub title_key: &'static str,
    pub steps: &'static [StepDef],
    pub otp: Option<OtpStep>,
    /// Text fields pre-filled when the wizard starts.
    pub defaults: &'static [(&'static str, &'static str)],
    pub next_page: Page,
}

impl Flow {
    pub fn total_steps(&self) -> u8 {
        self.steps.len() as u8
    }

    /// Step by 1-based index.
    pub fn step(&self, index: u8) -> Option<&'static StepDef> {
        let steps: &'static [StepDef] = self.steps;
        steps.get(usize::from(index).checked_sub(1)?)
    }

    /// Look up a field and the step that owns it.
    pub fn field(&self, name: &str) -> Option<(u8, &'static FieldSpec)> {
        let steps: &'static [StepDef] = self.steps;
        steps.iter().enumerate().find_map(|(i, step)| {
            step.fields
                .iter()
                .find(|f| f.name == name)
                .map(|f| (i as u8 + 1, f))
        })
    }
}

pub const ID_TYPES: &[&str] = &["national_id", "passport", "drivers_license"];

const OTP_FIELD: FieldSpec = FieldSpec::text("otp", "enterOtp")
    .required("Please enter a valid 6-digit OTP")
    .rule(
        Rule::DigitCode { len: OTP_LENGTH },
        "Please enter a valid 6-digit OTP",
    );

const SIGN_UP_DETAILS: &[FieldSpec] = &[
    FieldSpec::text("fullName", "fullName").required("Full name is required"),
    FieldSpec::text("email", "emailAddress")
        .required("Email is required")
        .rule(Rule::Email, "Please enter a valid email address"),
    FieldSpec::secret("password", "password")
        .required("Password is required")
        .rule(Rule::StrongPassword, "Password does not meet the requirements"),
    FieldSpec::secret("confirmPassword", "confirmPassword")
        .rule(Rule::Matches("password"), "Passwords do not match"),
    FieldSpec::text("nationalId", "nationalId"),
    FieldSpec::file("idFile", "uploadId"),
    FieldSpec::flag("terms", "termsAndConditions")
        .required("You must agree to the terms and conditions"),
];

const SIGN_UP_PHONE: &[FieldSpec] = &[FieldSpec::phone("phoneNumber", "phoneNumber")
    .required("Valid phone number is required")
    .rule(Rule::Phone { min_digits: 10 }, "Valid phone number is required")];

static SIGN_UP_STEPS: [StepDef; 3] = [
    StepDef {
        title_key: "createAccount",
        fields: SIGN_UP_DETAILS,
    },
    StepDef {
        title_key: "verifyPhone",
        fields: SIGN_UP_PHONE,
    },
    StepDef {
        title_key: "otpVerification",
        fields: &[OTP_FIELD],
    },
];

pub static SIGN_UP: Flow = Flow {
    kind: WizardKind::SignUp,
    title_key: "createAccount",
    steps: &SIGN_UP_STEPS,
    otp: Some(OtpStep {
        step: 3,
        code_field: "otp",
        destination_field: "phoneNumber",
        dial_prefix: "+251",
    }),
    defaults: &[],
    next_page: Page::Kyc,
};

const KYC_IDENTITY: &[FieldSpec] = &[
    FieldSpec::text("idType", "idType")
        .required("Please select an ID type")
        .rule(Rule::OneOf(ID_TYPES), "Please select an ID type"),
    FieldSpec::text("idNumber", "idNumber").required("Please enter your ID number"),
    FieldSpec::text("fullName", "fullName").required("Please enter your full name"),
    FieldSpec::text("dateOfBirth", "dateOfBirth").required("Please enter your date of birth"),
    FieldSpec::file("idFile", "uploadId").required("Please upload a copy of your ID"),
];

const KYC_ADDRESS: &[FieldSpec] = &[
    FieldSpec::text("address", "residentialAddress").required("Please enter your address"),
    FieldSpec::file("addressFile", "uploadProofOfAddress")
        .required("Please upload a proof of address"),
];

const KYC_PHONE: &[FieldSpec] = &[
    FieldSpec::phone("phoneNumber", "phoneNumber").required("Please enter your phone number"),
    FieldSpec::file("selfieFile", "uploadSelfie").required("Please upload a selfie"),
];

static KYC_STEPS: [StepDef; 4] = [
    StepDef {
        title_key: "personalInfo",
        fields: KYC_IDENTITY,
    },
    StepDef {
        title_key: "addressVerification",
        fields: KYC_ADDRESS,
    },
    StepDef {
        title_key: "phoneVerification",
        fields: KYC_PHONE,
    },
    StepDef {
        title_key: "otpVerification",
        fields: &[OTP_FIELD],
    },
];

pub static KYC: Flow = Flow {
    kind: WizardKind::Kyc,
    title_key: "kycVerification",
    steps: &KYC_STEPS,
    otp: Some(OtpStep {
        step: 4,
        code_field: "otp",
        destination_field: "phoneNumber",
        dial_prefix: "+251",
    }),
    defaults: &[("idType", "national_id")],
    next_page: Page::Dashboard,
};
