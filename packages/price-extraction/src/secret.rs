//! API keys that never show up in logs or debug output.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

/// A credential wrapped in `secrecy::SecretBox`.
///
/// `Debug` and `Display` both print `[REDACTED]`; call
/// [`expose`](Self::expose) only where the key goes on the wire.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(value.into().into_boxed_str()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Whether the key is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_redacted() {
        let key = SecretString::new("sk-live-123456");
        assert_eq!(format!("{:?}", key), "[REDACTED]");
        assert_eq!(key.to_string(), "[REDACTED]");
        assert_eq!(key.expose(), "sk-live-123456");
    }

    #[test]
    fn test_blank_key() {
        assert!(SecretString::new("  ").is_blank());
        assert!(!SecretString::from("sk".to_string()).is_blank());
    }
}
