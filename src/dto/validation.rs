//! Validation helpers for DTOs.

use serde::Deserialize;
use validator::ValidationError;

const MAX_IDENTITY_LEN: usize = 128;
/// Characters that would change the meaning of a document URL.
const RESERVED_CHARS: [char; 4] = ['/', '?', '#', '%'];

/// Validates a member or event identity as used in document keys.
///
/// # Examples
///
/// ```ignore
/// validate_identity("u_102")     // Ok
/// validate_identity("")          // Err - empty
/// validate_identity(" u_102")    // Err - surrounding whitespace
/// validate_identity("a/b")       // Err - path separator
/// validate_identity("a?rev=1")   // Err - query delimiter
/// ```
pub fn validate_identity(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_IDENTITY_LEN {
        let mut err = ValidationError::new("identity_length");
        err.message = Some(
            format!(
                "Identity must be between 1 and {MAX_IDENTITY_LEN} bytes (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if id.trim() != id
        || id
            .chars()
            .any(|c| c.is_control() || RESERVED_CHARS.contains(&c))
    {
        let mut err = ValidationError::new("identity_format");
        err.message = Some(
            "Identity must not contain surrounding whitespace, control characters or any of '/?#%'"
                .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Event identity taken from a request path, checked with [`validate_identity`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct EventId(String);

impl EventId {
    /// Validated identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EventId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match validate_identity(&value) {
            Ok(()) => Ok(Self(value)),
            Err(err) => Err(err
                .message
                .map(|message| message.into_owned())
                .unwrap_or_else(|| err.code.into_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identity_valid() {
        assert!(validate_identity("u_102").is_ok());
        assert!(validate_identity("김민수").is_ok());
        assert!(validate_identity("2024-05-11-practice").is_ok());
    }

    #[test]
    fn test_validate_identity_invalid_length() {
        assert!(validate_identity("").is_err());
        assert!(validate_identity(&"x".repeat(MAX_IDENTITY_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_identity_invalid_format() {
        assert!(validate_identity(" u_102").is_err()); // leading space
        assert!(validate_identity("u_102\n").is_err()); // control
        assert!(validate_identity("events/1").is_err()); // separator
        assert!(validate_identity("e1?rev=2").is_err());
        assert!(validate_identity("e1#frag").is_err());
        assert!(validate_identity("e1%2Fx").is_err());
    }

    #[test]
    fn event_id_rejects_url_delimiters() {
        let ok: EventId = serde_json::from_str("\"2026-11-07-run\"").unwrap();
        assert_eq!(ok.as_str(), "2026-11-07-run");
        assert!(serde_json::from_str::<EventId>("\"e1?rev=2\"").is_err());
        assert!(serde_json::from_str::<EventId>("\"\"").is_err());
    }
}
