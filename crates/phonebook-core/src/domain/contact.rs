use crate::domain::ids::ContactId;
use crate::domain::phone::normalize_phone_number;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(alias = "_id")]
    pub id: ContactId,
    pub name: String,
    pub phone_numbers: Vec<String>,
}

/// Request body for create and update. The server owns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDraft {
    pub name: String,
    pub phone_numbers: Vec<String>,
}

impl Contact {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::EmptyName);
        }
        if self.phone_numbers.is_empty() {
            return Err(CoreError::MissingPhoneNumber);
        }
        Ok(())
    }

    pub fn has_number(&self, normalized: &str) -> bool {
        self.phone_numbers
            .iter()
            .any(|number| normalize_phone_number(number) == normalized)
    }

    pub fn name_matches(&self, name_key: &str) -> bool {
        self.name.trim().to_lowercase() == name_key
    }

    pub fn primary_number(&self) -> Option<&str> {
        self.phone_numbers.first().map(String::as_str)
    }
}

impl ContactDraft {
    pub fn new(name: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone_numbers: vec![number.into()],
        }
    }

    /// Keeps the contact's other fields and replaces its numbers with one.
    pub fn replacing_number(contact: &Contact, number: impl Into<String>) -> Self {
        Self::new(contact.name.clone(), number)
    }
}

#[cfg(test)]
mod tests {
    use super::{Contact, ContactDraft};
    use crate::domain::ContactId;
    use crate::error::CoreError;

    fn contact(name: &str, numbers: &[&str]) -> Contact {
        Contact {
            id: ContactId::new("1").unwrap(),
            name: name.to_string(),
            phone_numbers: numbers.iter().map(|n| n.to_string()).collect(),
        }
    }

    #[test]
    fn validate_rejects_blank_name() {
        let err = contact("  ", &["09-1234567"]).validate().unwrap_err();
        assert_eq!(err, CoreError::EmptyName);
    }

    #[test]
    fn validate_requires_a_number() {
        let err = contact("Ada", &[]).validate().unwrap_err();
        assert_eq!(err, CoreError::MissingPhoneNumber);
    }

    #[test]
    fn deserializes_document_store_records() {
        let json = r#"{"_id":"65f1c0ffee","name":"Ada","phoneNumbers":["09-1234567"],"__v":0}"#;
        let parsed: Contact = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id.as_str(), "65f1c0ffee");
        assert_eq!(parsed.phone_numbers, vec!["09-1234567"]);
    }

    #[test]
    fn deserializes_flat_file_records() {
        let json = r#"{"id":3,"name":"Ada","phoneNumbers":["09-1234567"]}"#;
        let parsed: Contact = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id.as_str(), "3");
    }

    #[test]
    fn has_number_compares_normalized_forms() {
        let ada = contact("Ada", &["09-123 4567"]);
        assert!(ada.has_number("091234567"));
        assert!(!ada.has_number("0912345678"));
    }

    #[test]
    fn draft_serializes_camel_case_without_id() {
        let draft = ContactDraft::new("Ada", "09-1234567");
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "name": "Ada", "phoneNumbers": ["09-1234567"] })
        );
    }
}
