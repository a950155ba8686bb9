use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::api::{ApiError, NewRegistrant, OpenhouseApi};
use crate::models::attendance;
use crate::models::registrant::{is_known_school, Gender};

/// Raw form values exactly as the browser posted them. Kept around so a
/// rejected form can be re-rendered with the attendee's input intact.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub school: String,
}

/// Per-field validation messages, `None` when the field is fine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub school: Option<String>,
}

/// A registration that passed validation; `phone` is normalized.
#[derive(Debug, Clone)]
pub struct ValidRegistration {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub gender: Gender,
    pub school: String,
}

/// Everything the confirmation page and the ID card need.
#[derive(Debug, Clone)]
pub struct IdCardView {
    pub name: String,
    pub school: String,
    pub phone: String,
    pub code: String,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// One or more fields failed validation; nothing left the process.
    Invalid(FieldErrors),
    /// The phone is already registered under this name; no write happened.
    AlreadyRegistered { name: String },
    /// The backend accepted the registration.
    Registered(IdCardView),
}

/// Which of the two backend calls failed. The two stages surface different
/// user-facing messages, matching the original form.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("duplicate-phone lookup failed: {0}")]
    CheckPhone(#[source] ApiError),
    #[error("registration submit failed: {0}")]
    Register(#[source] ApiError),
}

impl SubmitError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::CheckPhone(_) => "Terjadi kesalahan saat memeriksa nomor HP.",
            Self::Register(_) => "Terjadi kesalahan saat mengirim data.",
        }
    }
}

// Accepted phone shapes: local (0…) or international (+62…), 9-17 digits
// after the prefix.
const PHONE_PATTERN: &str = r"^(0\d{9,17}|\+62\d{9,17})$";
const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

/// Normalize an accepted phone input to the canonical `62…` form the
/// backend keys registrants on. Returns `None` when the input does not
/// match either accepted shape.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let pattern = Regex::new(PHONE_PATTERN).expect("phone pattern is valid");
    if !pattern.is_match(raw) {
        return None;
    }
    if let Some(rest) = raw.strip_prefix('0') {
        Some(format!("62{rest}"))
    } else {
        raw.strip_prefix('+').map(str::to_string)
    }
}

pub fn validate(input: &RegistrationInput) -> Result<ValidRegistration, FieldErrors> {
    let mut errors = FieldErrors::default();

    let name = input.name.trim();
    if name.is_empty() {
        errors.name = Some("Nama harus diisi".to_string());
    }

    let phone_raw = input.phone.trim();
    let phone = if phone_raw.is_empty() {
        errors.phone = Some("Nomor HP harus diisi".to_string());
        None
    } else {
        let normalized = normalize_phone(phone_raw);
        if normalized.is_none() {
            errors.phone = Some("Nomor HP tidak valid".to_string());
        }
        normalized
    };

    let email = input.email.trim();
    if email.is_empty() {
        errors.email = Some("Email harus diisi".to_string());
    } else {
        let pattern = Regex::new(EMAIL_PATTERN).expect("email pattern is valid");
        if !pattern.is_match(email) {
            errors.email = Some("Email tidak valid".to_string());
        }
    }

    let gender = Gender::parse(input.gender.trim());
    if gender.is_none() {
        errors.gender = Some("Jenis kelamin harus dipilih".to_string());
    }

    let school = input.school.trim();
    if !is_known_school(school) {
        errors.school = Some("Asal sekolah harus dipilih".to_string());
    }

    match (phone, gender) {
        (Some(phone), Some(gender)) if errors == FieldErrors::default() => Ok(ValidRegistration {
            name: name.to_string(),
            phone,
            email: email.to_string(),
            gender,
            school: school.to_string(),
        }),
        _ => Err(errors),
    }
}

/// Run the full submission flow: validate, check for a duplicate phone,
/// and create the registrant. The create call is only issued when the
/// duplicate lookup came back clean.
pub async fn submit(
    api: &dyn OpenhouseApi,
    input: &RegistrationInput,
) -> Result<SubmitOutcome, SubmitError> {
    let valid = match validate(input) {
        Ok(v) => v,
        Err(errors) => return Ok(SubmitOutcome::Invalid(errors)),
    };

    let lookup = api
        .check_phone(&valid.phone)
        .await
        .map_err(SubmitError::CheckPhone)?;
    if lookup.exists {
        return Ok(SubmitOutcome::AlreadyRegistered {
            name: lookup.name.unwrap_or_default(),
        });
    }

    let code = attendance::derive_code(&valid.phone);
    let registrant = NewRegistrant {
        name: valid.name.clone(),
        phone: valid.phone.clone(),
        gender: valid.gender,
        school: valid.school.clone(),
        qrcode: code.clone(),
    };
    api.register(&registrant)
        .await
        .map_err(SubmitError::Register)?;

    Ok(SubmitOutcome::Registered(IdCardView {
        name: valid.name,
        school: valid.school,
        phone: valid.phone,
        code,
    }))
}
