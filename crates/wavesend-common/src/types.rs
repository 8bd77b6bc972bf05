//! Common types for Wavesend

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for campaigns
pub type CampaignId = Uuid;

/// Unique identifier for messages
pub type MessageId = Uuid;

/// Unique identifier for contacts
pub type ContactId = Uuid;

/// Unique identifier for contact lists
pub type ContactListId = Uuid;

/// Unique identifier for dispatch jobs
pub type JobId = Uuid;

/// A validated E.164 phone number (`+` followed by 7 to 15 digits,
/// first digit non-zero).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse and validate a phone number string
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let rest = s.strip_prefix('+')?;
        let len = rest.len();
        if !(7..=15).contains(&len) {
            return None;
        }
        let mut digits = rest.bytes();
        match digits.next() {
            Some(b'1'..=b'9') => {}
            _ => return None,
        }
        if digits.all(|b| b.is_ascii_digit()) {
            Some(Self(s.to_string()))
        } else {
            None
        }
    }

    /// The raw address string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper, yielding the validated string
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            crate::Error::Validation(format!(
                "Invalid phone number '{}': must be E.164 (e.g. +212612345678)",
                s
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_parse_valid() {
        let phone = PhoneNumber::parse("+212612345678").unwrap();
        assert_eq!(phone.as_str(), "+212612345678");
        assert_eq!(phone.to_string(), "+212612345678");
    }

    #[test]
    fn test_phone_parse_invalid() {
        assert!(PhoneNumber::parse("212612345678").is_none()); // no plus
        assert!(PhoneNumber::parse("+0612345678").is_none()); // leading zero
        assert!(PhoneNumber::parse("+123").is_none()); // too short
        assert!(PhoneNumber::parse("+1234567890123456").is_none()); // too long
        assert!(PhoneNumber::parse("+21261234567a").is_none()); // non-digit
        assert!(PhoneNumber::parse("").is_none());
    }

    #[test]
    fn test_phone_parse_trims_whitespace() {
        let phone = PhoneNumber::parse(" +14155550123 ").unwrap();
        assert_eq!(phone.as_str(), "+14155550123");
    }
}
