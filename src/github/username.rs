use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Username cannot be empty")]
pub struct EmptyUsername;

/// A username that is known to be non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    /// Trims surrounding whitespace and rejects what is left if it is empty.
    pub fn parse(input: &str) -> Result<Self, EmptyUsername> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(EmptyUsername);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
