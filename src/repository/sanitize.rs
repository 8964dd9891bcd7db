//! Masking of personal data in file contents.

use regex::Regex;
use std::sync::LazyLock;

static EMAIL_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[\w\-.+]+@(?:[\w-]+\.)+[\w-]{2,4}\b").unwrap());

static PHONE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+\d{1,2}\s?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}").unwrap()
});

static PASSWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)["']?password["']?\s*[=:]\s*["']?[\w_]+["']?"#).unwrap()
});

/// Replace emails, phone numbers and password assignments with placeholders.
///
/// Emails go first so that digits inside an address are not taken for a
/// phone number.
pub fn sanitize_content(content: &str) -> String {
    let content = EMAIL_ADDRESS.replace_all(content, "<anonymous_email_address>");
    let content = PHONE_NUMBER.replace_all(&content, "<anonymous_phone_number>");
    PASSWORD.replace_all(&content, "<password_mask>").into_owned()
}
