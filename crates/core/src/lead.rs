//! Lead form types and field validation.
//!
//! Validation is pure: it never touches the network or storage. A lead only
//! moves on to delivery once every field is clean.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::limits::{
    MAX_AREA_CODE, MAX_PHONE_DIGITS, MIN_AGE_YEARS, MIN_AREA_CODE, MIN_BIRTH_YEAR,
    MIN_PHONE_DIGITS,
};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Unvalidated lead form as posted by the site.
///
/// Every field defaults to empty so that a missing field is reported the same
/// way as a blank one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawLeadForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub birth_day: String,
    pub birth_month: String,
    pub birth_year: String,
    pub experience_level: String,

    /// Tracking session of the visitor, if the site sent one
    pub session_id: Option<String>,
    /// URL the visitor first landed on (carries UTM parameters)
    pub landing_url: Option<String>,
    /// URL of the page hosting the form
    pub page_url: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

/// Lead form fields that can carry an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadField {
    FullName,
    Email,
    Phone,
    BirthDate,
    ExperienceLevel,
}

impl LeadField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullName => "full_name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::BirthDate => "birth_date",
            Self::ExperienceLevel => "experience_level",
        }
    }
}

/// Field-level error messages, ordered by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<LeadField, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: LeadField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: LeadField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: LeadField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LeadField, &str)> {
        self.0.iter().map(|(field, msg)| (*field, msg.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, msg)| format!("{}: {}", field.as_str(), msg))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Prior dance experience declared on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExperienceLevel {
    #[serde(alias = "primeira-vez")]
    FirstTime,
    #[serde(alias = "ja-dancei")]
    Returning,
    #[serde(alias = "outra-escola")]
    FromOtherSchool,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstTime => "first-time",
            Self::Returning => "returning",
            Self::FromOtherSchool => "from-other-school",
        }
    }

    /// Human readable label sent to the webhook.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FirstTime => "First time dancing",
            Self::Returning => "Danced before, currently not dancing",
            Self::FromOtherSchool => "Dances at another school, wants to visit",
        }
    }
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "first-time" | "primeira-vez" => Ok(Self::FirstTime),
            "returning" | "ja-dancei" => Ok(Self::Returning),
            "from-other-school" | "outra-escola" => Ok(Self::FromOtherSchool),
            other => Err(format!("unknown experience level '{}'", other)),
        }
    }
}

/// A lead whose fields all passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSubmission {
    pub full_name: String,
    pub email: String,
    /// Digits only
    pub phone: String,
    pub birth_date: NaiveDate,
    pub experience_level: ExperienceLevel,
}

/// Validate a lead form against today's date (UTC).
pub fn validate_lead(raw: &RawLeadForm) -> Result<FormSubmission, FieldErrors> {
    validate_lead_at(raw, Utc::now().date_naive())
}

/// Validate a lead form as of `today`.
///
/// Returns every field error at once so they can be shown inline.
pub fn validate_lead_at(raw: &RawLeadForm, today: NaiveDate) -> Result<FormSubmission, FieldErrors> {
    let mut errors = FieldErrors::new();

    let full_name = validate_name(&raw.full_name)
        .map_err(|e| errors.insert(LeadField::FullName, e))
        .ok();
    let email = validate_email(&raw.email)
        .map_err(|e| errors.insert(LeadField::Email, e))
        .ok();
    let phone = validate_phone(&raw.phone)
        .map_err(|e| errors.insert(LeadField::Phone, e))
        .ok();
    let birth_date = validate_birth_date(&raw.birth_day, &raw.birth_month, &raw.birth_year, today)
        .map_err(|e| errors.insert(LeadField::BirthDate, e))
        .ok();
    let experience_level = validate_experience(&raw.experience_level)
        .map_err(|e| errors.insert(LeadField::ExperienceLevel, e))
        .ok();

    match (full_name, email, phone, birth_date, experience_level) {
        (Some(full_name), Some(email), Some(phone), Some(birth_date), Some(experience_level)) => {
            Ok(FormSubmission {
                full_name,
                email,
                phone,
                birth_date,
                experience_level,
            })
        }
        _ => Err(errors),
    }
}

/// Name must be non-empty after trimming.
pub fn validate_name(name: &str) -> Result<String, String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name is required".into());
    }
    Ok(trimmed.to_string())
}

/// Email must look like `local@domain.tld`.
pub fn validate_email(email: &str) -> Result<String, String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err("Email is required".into());
    }
    if !EMAIL_PATTERN.is_match(trimmed) {
        return Err("Enter a valid email address".into());
    }
    Ok(trimmed.to_string())
}

/// Strip formatting from a phone number, keeping digits only.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Phone must have 10-15 digits; 10-11 digit numbers need a valid area code.
pub fn validate_phone(phone: &str) -> Result<String, String> {
    let digits = normalize_phone(phone);
    if digits.is_empty() {
        return Err("Phone is required".into());
    }
    if digits.len() < MIN_PHONE_DIGITS || digits.len() > MAX_PHONE_DIGITS {
        return Err(format!(
            "Phone must have between {} and {} digits",
            MIN_PHONE_DIGITS, MAX_PHONE_DIGITS
        ));
    }
    if digits.len() <= 11 {
        let area_code: u32 = digits[..2].parse().unwrap_or(0);
        if !(MIN_AREA_CODE..=MAX_AREA_CODE).contains(&area_code) {
            return Err("Enter a valid area code".into());
        }
    }
    Ok(digits)
}

/// Birth date must be a real, past calendar date for someone at least five.
pub fn validate_birth_date(
    day: &str,
    month: &str,
    year: &str,
    today: NaiveDate,
) -> Result<NaiveDate, String> {
    if day.trim().is_empty() || month.trim().is_empty() || year.trim().is_empty() {
        return Err("Birth date is required".into());
    }

    let (Ok(day), Ok(month), Ok(year)) = (
        day.trim().parse::<u32>(),
        month.trim().parse::<u32>(),
        year.trim().parse::<i32>(),
    ) else {
        return Err("Enter a valid birth date".into());
    };

    if !(1..=31).contains(&day) {
        return Err("Day must be between 1 and 31".into());
    }
    if !(1..=12).contains(&month) {
        return Err("Month must be between 1 and 12".into());
    }

    let max_year = today.year() - MIN_AGE_YEARS;
    if year < MIN_BIRTH_YEAR || year > max_year {
        return Err(format!(
            "Year must be between {} and {}",
            MIN_BIRTH_YEAR, max_year
        ));
    }

    let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
        return Err("This date does not exist".into());
    };

    if date > today {
        return Err("Birth date cannot be in the future".into());
    }
    if age_on(date, today) < MIN_AGE_YEARS {
        return Err(format!("Minimum age is {} years", MIN_AGE_YEARS));
    }

    Ok(date)
}

fn validate_experience(value: &str) -> Result<ExperienceLevel, String> {
    if value.trim().is_empty() {
        return Err("Select your dance experience".into());
    }
    value
        .parse()
        .map_err(|_| "Select a valid experience option".to_string())
}

/// Completed years between `birth` and `today`.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}
