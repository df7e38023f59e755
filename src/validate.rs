use regex::Regex;
use std::sync::LazyLock;

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_POSITION_LEN: usize = 3;
pub const MIN_LOCATION_LEN: usize = 2;

const MAX_EXPERIENCE_YEARS: u32 = 50;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email pattern")
});

static PHONE_SEPARATORS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-()]").expect("valid separator pattern"));

// E.164-style international number, or a 10-digit national number.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\+[1-9]\d{1,14}|[1-9]\d{9})$").expect("valid phone pattern")
});

// ASCII only: `\d` would also match other scripts' digits, which `u32` cannot parse.
static DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid digits pattern"));

pub fn validate_email(email: &str) -> bool {
    let len = email.chars().count();
    if !(5..=254).contains(&len) {
        return false;
    }
    EMAIL_RE.is_match(email)
}

pub fn validate_phone(phone: &str) -> bool {
    if phone.is_empty() {
        return false;
    }
    let clean = PHONE_SEPARATORS_RE.replace_all(phone, "");
    PHONE_RE.is_match(&clean)
}

/// Accepts any text whose first run of ASCII digits is a year count between 0 and 50,
/// e.g. "I have 3 years" or "5".
pub fn validate_experience(experience: &str) -> bool {
    let Some(first) = DIGITS_RE.find(experience) else {
        return false;
    };
    // A run too long for u32 is certainly above the cap.
    match first.as_str().parse::<u32>() {
        Ok(years) => years <= MAX_EXPERIENCE_YEARS,
        Err(_) => false,
    }
}

pub fn validate_min_length(value: &str, min: usize) -> bool {
    value.trim().chars().count() >= min
}
