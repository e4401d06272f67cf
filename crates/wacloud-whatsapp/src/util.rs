//! Log masking helpers
//!
//! Inbound message bodies and phone numbers are personal data; everything
//! that reaches a log line goes through one of these first.

/// Maximum length of message text to log
pub const MAX_LOG_TEXT_LENGTH: usize = 50;

/// Trailing digits of a phone number left visible in logs
const VISIBLE_PHONE_DIGITS: usize = 4;

/// Patterns that indicate potentially sensitive content
pub const SENSITIVE_PATTERNS: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "token",
    "api_key",
    "apikey",
    "bearer",
    "authorization",
    "credential",
    "private",
];

/// Short markers that only count as whole words ("otp" but not "hotpot")
pub const SENSITIVE_WORDS: &[&str] = &["otp", "pin"];

/// Mask potentially sensitive text for logging
///
/// # Examples
/// ```
/// use wacloud_whatsapp::util::mask_for_logging;
///
/// assert!(mask_for_logging("my password is hunter2").contains("REDACTED"));
/// assert_eq!(mask_for_logging("Hello"), "Hello");
/// ```
#[must_use]
pub fn mask_for_logging(text: &str) -> String {
    let lower = text.to_lowercase();

    let has_pattern = SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p));
    let has_word = lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| SENSITIVE_WORDS.contains(&word));
    if has_pattern || has_word {
        return "[REDACTED - potentially sensitive content]".to_string();
    }

    match text.char_indices().nth(MAX_LOG_TEXT_LENGTH) {
        Some((cut, _)) => format!("{}...[truncated]", &text[..cut]),
        None => text.to_string(),
    }
}

/// Mask a phone number or WhatsApp ID, keeping the last four digits
///
/// # Examples
/// ```
/// use wacloud_whatsapp::util::mask_phone;
///
/// assert_eq!(mask_phone("+1234567890"), "***7890");
/// ```
#[must_use]
pub fn mask_phone(number: &str) -> String {
    let digits: Vec<char> = number.chars().filter(char::is_ascii_digit).collect();
    if digits.len() <= VISIBLE_PHONE_DIGITS {
        return "***".to_string();
    }
    let tail: String = digits[digits.len() - VISIBLE_PHONE_DIGITS..].iter().collect();
    format!("***{tail}")
}
