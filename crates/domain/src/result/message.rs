use std::ops::Deref;

use serde::{Deserialize, Serialize};

const FALLBACK: &str = "unspecified error";

/// Error text carried by a failure result. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ErrorMessage(String);

impl ErrorMessage {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self(FALLBACK.to_string())
        } else {
            Self(message)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrorMessage {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<String> for ErrorMessage {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for ErrorMessage {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<ErrorMessage> for String {
    fn from(value: ErrorMessage) -> Self {
        value.0
    }
}

impl std::fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
