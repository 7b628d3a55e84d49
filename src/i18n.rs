//! Static translation table for wizard labels.
//!
//! Lookups never fail: an unknown key comes back verbatim.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    En,
    /// Amharic.
    Am,
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "am" => Ok(Self::Am),
            other => Err(format!("unsupported language '{other}'")),
        }
    }
}

/// `key → [en, am]`.
static TRANSLATIONS: LazyLock<HashMap<&'static str, [&'static str; 2]>> = LazyLock::new(|| {
    HashMap::from([
        ("createAccount", ["Create your account", "መለያዎን ይፍጠሩ"]),
        ("fullName", ["Full Name", "ሙሉ ስም"]),
        ("emailAddress", ["Email Address", "የኢሜይል አድራሻ"]),
        ("password", ["Password", "የይለፍ ቃል"]),
        ("confirmPassword", ["Confirm Password", "የይለፍ ቃል ያረጋግጡ"]),
        ("nationalId", ["Ethiopian National ID/FFIDA Number", "የኢትዮጵያ ብሔራዊ መታወቂያ/FFIDA ቁጥር"]),
        ("uploadId", ["Upload National ID/FFIDA", "ብሔራዊ መታወቂያ/FFIDA ይስቀሉ"]),
        ("optional", ["Optional", "አማራጭ"]),
        (
            "termsAndConditions",
            [
                "I agree to the Terms of Service and Privacy Policy",
                "የአገልግሎት ውሎችን እና የግላዊነት ፖሊሲን ተስማምቻለሁ",
            ],
        ),
        ("minChars", ["At least 8 characters", "ቢያንስ 8 ቁምፊዎች"]),
        ("minNumber", ["At least 1 number", "ቢያንስ 1 ቁጥር"]),
        ("minUppercase", ["At least 1 uppercase letter", "ቢያንስ 1 ከፍተኛ ፊደል"]),
        ("minSpecialChar", ["At least 1 special character", "ቢያንስ 1 ልዩ ቁምፊ"]),
        ("phoneNumber", ["Phone Number", "ስልክ ቁጥር"]),
        ("phoneVerification", ["Phone Verification", "የስልክ ማረጋገጫ"]),
        ("verifyPhone", ["Verify Phone Number", "ስልክ ቁጥር ያረጋግጡ"]),
        ("otpVerification", ["OTP Verification", "OTP ማረጋገጫ"]),
        (
            "otpSent",
            [
                "We've sent a 6-digit verification code to your phone number. Please enter it below.",
                "ወደ ስልክ ቁጥርዎ 6 አሃዝ የማረጋገጫ ኮድ ልከናል። እባክዎ ከዚህ በታች ያስገቡት።",
            ],
        ),
        (
            "enterOtp",
            [
                "Enter the 6-digit code sent to your phone",
                "ወደ ስልክዎ የተላከውን 6 አሃዝ ኮድ ያስገቡ",
            ],
        ),
        ("resendCode", ["Resend Code", "ኮድ እንደገና ላክ"]),
        ("resendIn", ["Resend code in", "ኮድ እንደገና ይላክ በ"]),
        ("seconds", ["seconds", "ሰከንዶች"]),
        ("kycVerification", ["KYC Verification", "KYC ማረጋገጫ"]),
        ("verificationProgress", ["Verification Progress", "የማረጋገጫ ሂደት"]),
        ("personalInfo", ["Personal Information", "የግል መረጃ"]),
        ("idType", ["ID Type", "የመታወቂያ አይነት"]),
        ("nationalIdCard", ["National ID", "ብሔራዊ መታወቂያ"]),
        ("passport", ["Passport", "ፓስፖርት"]),
        ("driversLicense", ["Driver's License", "የመንጃ ፈቃድ"]),
        ("idNumber", ["ID Number", "የመታወቂያ ቁጥር"]),
        ("dateOfBirth", ["Date of Birth", "የትውልድ ቀን"]),
        ("addressVerification", ["Address Verification", "የአድራሻ ማረጋገጫ"]),
        ("residentialAddress", ["Residential Address", "የመኖሪያ አድራሻ"]),
        ("uploadProofOfAddress", ["Upload Proof of Address", "የአድራሻ ማረጋገጫ ይስቀሉ"]),
        ("uploadSelfie", ["Upload Selfie", "ሴልፊ ይስቀሉ"]),
        ("verificationSubmitted", ["Verification Submitted!", "ማረጋገጫ ተልኳል!"]),
        ("next", ["Next", "ቀጣይ"]),
        ("back", ["Back", "ተመለስ"]),
        ("verify", ["Verify", "አረጋግጥ"]),
        ("submit", ["Submit", "አስገባ"]),
    ])
});

/// Key lookup for one language.
#[derive(Debug, Clone, Copy, Default)]
pub struct Translator {
    language: Language,
}

impl Translator {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn t<'a>(&self, key: &'a str) -> &'a str {
        let index = match self.language {
            Language::En => 0,
            Language::Am => 1,
        };
        TRANSLATIONS
            .get(key)
            .map(|entry| entry[index])
            .filter(|text| !text.is_empty())
            .unwrap_or(key)
    }
}
