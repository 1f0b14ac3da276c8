use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A validated reference to the user owning a shortened URL.
///
/// Owner identifiers are 24 hexadecimal digits, the shape issued by the
/// identity collaborator. Malformed input is rejected up front so that
/// storage backends never see an unparseable owner reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

const OWNER_ID_LENGTH: usize = 24;

impl OwnerId {
    /// Creates a new `OwnerId` after validating the input.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        if id.len() != OWNER_ID_LENGTH || !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidOwner(format!(
                "must be {} hexadecimal characters: '{}'",
                OWNER_ID_LENGTH, id
            )));
        }
        Ok(Self(id))
    }

    /// Returns the owner identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
