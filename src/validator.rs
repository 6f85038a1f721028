//! Content Validator
//!
//! Judges whether a raw-text candidate is conversation or noise. A length
//! check alone is not enough: chat UIs show short valid prompts ("how do I
//! fix this") while loading placeholders are long enough to pass one.

use std::fmt;

use crate::patterns::{
    matching_noise_pattern, CONVERSATIONAL_KEYWORDS, CONVERSATIONAL_PUNCTUATION, ROLE_MARKERS,
};

/// Absolute floor (chars) below which nothing is valid.
pub const DEFAULT_FLOOR: usize = 10;

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    TooShort,
    NoiseDetected,
    TooVague,
}

impl ValidationReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationReason::TooShort => "Content too short",
            ValidationReason::NoiseDetected => "Appears to be error or loading message",
            ValidationReason::TooVague => "Content too vague",
        }
    }
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict of [`validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub reason: Option<ValidationReason>,
}

impl Validation {
    const VALID: Self = Self {
        valid: true,
        reason: None,
    };

    fn invalid(reason: ValidationReason) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// Validates `text` against a platform-specific minimum length.
///
/// ```rust
/// use rs_chatscrape::validator::{validate, ValidationReason};
///
/// assert_eq!(validate("Loading...", 50).reason, Some(ValidationReason::NoiseDetected));
/// assert!(validate("how do I fix this", 50).valid);
/// assert!(!validate("ok", 50).valid);
/// ```
#[must_use]
pub fn validate(text: &str, min_length: usize) -> Validation {
    validate_with_floor(text, min_length, DEFAULT_FLOOR)
}

/// [`validate`] with an explicit absolute floor.
#[must_use]
pub fn validate_with_floor(text: &str, min_length: usize, floor: usize) -> Validation {
    let trimmed = text.trim();
    let len = trimmed.chars().count();

    if trimmed.is_empty() || len < floor {
        return Validation::invalid(ValidationReason::TooShort);
    }

    if matching_noise_pattern(trimmed).is_some() {
        return Validation::invalid(ValidationReason::NoiseDetected);
    }

    if len < min_length {
        let words = trimmed.split_whitespace().count();
        if words < 3 {
            return Validation::invalid(ValidationReason::TooVague);
        }
        if words < 5 && !has_conversational_markers(trimmed) {
            return Validation::invalid(ValidationReason::TooVague);
        }
    }

    Validation::VALID
}

/// Question/exclamation marks, wh-keywords or role prefixes.
#[must_use]
pub fn has_conversational_markers(text: &str) -> bool {
    if text.contains(CONVERSATIONAL_PUNCTUATION) {
        return true;
    }

    let lower = text.to_lowercase();
    if ROLE_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return true;
    }

    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| CONVERSATIONAL_KEYWORDS.contains(&word))
}
