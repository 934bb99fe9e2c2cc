use crate::error::CoreError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Server-assigned contact identifier.
///
/// Document stores hand out hex object ids while flat-file backends use
/// integers, so both are accepted on the wire and kept as opaque text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContactId(String);

impl ContactId {
    pub fn new(value: impl Into<String>) -> Result<Self, CoreError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidContactId);
        }
        if trimmed.len() == value.len() {
            Ok(Self(value))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContactId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for ContactId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(u64),
        }

        let raw = match RawId::deserialize(deserializer)? {
            RawId::Text(value) => value,
            RawId::Number(value) => value.to_string(),
        };
        ContactId::new(raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::ContactId;
    use crate::error::CoreError;

    #[test]
    fn contact_id_rejects_blank_values() {
        assert_eq!(ContactId::new("  "), Err(CoreError::InvalidContactId));
        assert!("".parse::<ContactId>().is_err());
    }

    #[test]
    fn contact_id_trims_surrounding_whitespace() {
        let id = ContactId::new(" 65f1c0ffee ").unwrap();
        assert_eq!(id.as_str(), "65f1c0ffee");
    }

    #[test]
    fn contact_id_deserializes_numbers_and_strings() {
        let from_number: ContactId = serde_json::from_str("7").unwrap();
        assert_eq!(from_number.as_str(), "7");
        let from_text: ContactId = serde_json::from_str("\"65f1c0ffee\"").unwrap();
        assert_eq!(from_text.to_string(), "65f1c0ffee");
        assert!(serde_json::from_str::<ContactId>("\"\"").is_err());
    }
}
