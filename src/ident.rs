use std::fmt;

use thiserror::Error;

/// Longest identifier accepted. Matches PostgreSQL's NAMEDATALEN - 1.
pub const MAX_IDENTIFIER_LEN: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier {0:?} is longer than {MAX_IDENTIFIER_LEN} bytes")]
    TooLong(String),

    #[error("identifier {name:?} contains disallowed character {found:?}")]
    DisallowedCharacter { name: String, found: char },
}

/// A table, column or index name that is safe to interpolate into DDL.
///
/// DDL identifiers cannot be bound as query parameters, so every name passes
/// through [`Identifier::new`] before it reaches a statement builder. Accepted
/// names start with an ASCII letter or underscore and continue with ASCII
/// letters, digits or underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(name: impl Into<String>) -> Result<Self, IdentifierError> {
        let name = name.into();
        let mut chars = name.chars();

        let first = chars.next().ok_or(IdentifierError::Empty)?;
        if name.len() > MAX_IDENTIFIER_LEN {
            return Err(IdentifierError::TooLong(name));
        }
        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(IdentifierError::DisallowedCharacter { name, found: first });
        }
        if let Some(found) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
            return Err(IdentifierError::DisallowedCharacter { name, found });
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
