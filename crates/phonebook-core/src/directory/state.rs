use crate::directory::service::{DirectoryService, ServiceError, ServiceErrorKind};
use crate::domain::{
    is_valid_phone_number, normalize_phone_number, sanitize_phone_number, Contact, ContactDraft,
    ContactId, NotificationId, PHONE_FORMAT_HINT,
};
use crate::error::CoreError;
use crate::notification::{Notification, NotificationKind, Notifier};
use tracing::{debug, warn};

pub const LOAD_FAILED_MESSAGE: &str = "Server connection failed. Please try again later.";

/// What an operation did, alongside the notification it raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Loaded(usize),
    Added(Contact),
    Updated(Contact),
    Removed(ContactId),
    Cancelled,
    Invalid(CoreError),
    /// The id of the contact that already holds the number.
    Conflict(ContactId),
    Failed(ServiceErrorKind),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Outcome::Loaded(_) | Outcome::Added(_) | Outcome::Updated(_) | Outcome::Removed(_)
        )
    }
}

/// Local cache of the remote directory plus the ephemeral UI state around it.
///
/// Mutations are applied only after the service confirms them, using the
/// record the service returned.
#[derive(Debug)]
pub struct Directory<S> {
    service: S,
    contacts: Vec<Contact>,
    pending_name: String,
    pending_number: String,
    filter_text: String,
    notifier: Notifier,
    is_loading: bool,
    last_error: Option<String>,
}

impl<S: DirectoryService> Directory<S> {
    pub fn new(service: S, notification_ttl_secs: i64) -> Self {
        Self {
            service,
            contacts: Vec::new(),
            pending_name: String::new(),
            pending_number: String::new(),
            filter_text: String::new(),
            notifier: Notifier::new(notification_ttl_secs),
            is_loading: false,
            last_error: None,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn contact(&self, id: &ContactId) -> Option<&Contact> {
        self.contacts.iter().find(|contact| &contact.id == id)
    }

    pub fn pending_name(&self) -> &str {
        &self.pending_name
    }

    pub fn pending_number(&self) -> &str {
        &self.pending_number
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn notification(&self, now: i64) -> Option<&Notification> {
        self.notifier.current(now)
    }

    pub fn clear_notification(&mut self, id: NotificationId) -> bool {
        self.notifier.clear(id)
    }

    pub fn expire_notification(&mut self, now: i64) -> bool {
        self.notifier.expire(now)
    }

    pub fn set_pending_name(&mut self, value: impl Into<String>) {
        self.pending_name = value.into();
    }

    pub fn set_pending_number(&mut self, value: impl Into<String>) {
        self.pending_number = value.into();
    }

    pub fn set_filter(&mut self, text: impl Into<String>) {
        self.filter_text = text.into();
    }

    /// Contacts whose name contains the filter text, case-insensitively, in
    /// server order.
    pub fn visible_contacts(&self) -> Vec<&Contact> {
        let needle = self.filter_text.trim().to_lowercase();
        self.contacts
            .iter()
            .filter(|contact| contact.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn load(&mut self, now: i64) -> Outcome {
        self.is_loading = true;
        let result = self.service.fetch_all().and_then(admit_all);
        self.is_loading = false;

        match result {
            Ok(contacts) => {
                debug!(count = contacts.len(), "directory loaded");
                let count = contacts.len();
                self.contacts = contacts;
                self.last_error = None;
                Outcome::Loaded(count)
            }
            Err(err) => {
                warn!(error = %err, "failed to load directory");
                self.last_error = Some(LOAD_FAILED_MESSAGE.to_string());
                self.notify(
                    now,
                    NotificationKind::Error,
                    "Connection error: Please check server status",
                );
                Outcome::Failed(err.kind())
            }
        }
    }

    pub fn submit_pending(&mut self, now: i64) -> Outcome {
        let name = self.pending_name.clone();
        let number = self.pending_number.clone();
        self.add(now, &name, &number)
    }

    pub fn add(&mut self, now: i64, name: &str, number: &str) -> Outcome {
        let name = name.trim();
        if name.is_empty() {
            self.notify(now, NotificationKind::Error, "Name cannot be empty");
            return Outcome::Invalid(CoreError::EmptyName);
        }

        let sanitized = sanitize_phone_number(number);
        if !is_valid_phone_number(&sanitized) {
            self.notify(now, NotificationKind::Error, PHONE_FORMAT_HINT);
            return Outcome::Invalid(CoreError::InvalidPhoneNumber(sanitized));
        }

        let normalized = normalize_phone_number(&sanitized);
        let name_key = name.to_lowercase();
        if let Some(existing) = self
            .contacts
            .iter()
            .find(|contact| contact.name_matches(&name_key) && contact.has_number(&normalized))
        {
            let id = existing.id.clone();
            self.notify(
                now,
                NotificationKind::Warning,
                format!("{name} with this number already exists"),
            );
            return Outcome::Conflict(id);
        }

        if let Some(owner) = self
            .contacts
            .iter()
            .find(|contact| !contact.name_matches(&name_key) && contact.has_number(&normalized))
        {
            let id = owner.id.clone();
            let message = format!("Number already registered to {}", owner.name);
            self.notify(now, NotificationKind::Warning, message);
            return Outcome::Conflict(id);
        }

        let draft = ContactDraft::new(name, sanitized);
        match self.service.create(&draft).and_then(admit) {
            Ok(created) => {
                debug!(id = %created.id, "contact created");
                self.upsert(created.clone());
                self.pending_name.clear();
                self.pending_number.clear();
                self.notify(now, NotificationKind::Success, format!("Added {name}"));
                Outcome::Added(created)
            }
            Err(err) => {
                warn!(error = %err, "failed to create contact");
                let message = format!("Failed to add {name}: {}", err.user_message());
                self.notify(now, NotificationKind::Error, message);
                Outcome::Failed(err.kind())
            }
        }
    }

    /// Replaces the contact's numbers with `new_number`. A blank value is a
    /// cancellation and leaves everything untouched.
    pub fn update(&mut self, now: i64, id: &ContactId, new_number: &str) -> Outcome {
        if new_number.trim().is_empty() {
            return Outcome::Cancelled;
        }

        let sanitized = sanitize_phone_number(new_number);
        if !is_valid_phone_number(&sanitized) {
            self.notify(now, NotificationKind::Error, PHONE_FORMAT_HINT);
            return Outcome::Invalid(CoreError::InvalidPhoneNumber(sanitized));
        }

        let Some(current) = self.contact(id) else {
            self.notify(now, NotificationKind::Error, "Contact not found");
            return Outcome::Failed(ServiceErrorKind::NotFound);
        };
        let name = current.name.clone();
        let draft = ContactDraft::replacing_number(current, sanitized);

        let result = self
            .service
            .update(id, &draft)
            .and_then(|contact| admit_same_id(id, contact));
        match result {
            Ok(updated) => {
                debug!(id = %id, "contact updated");
                if let Some(slot) = self.contacts.iter_mut().find(|contact| &contact.id == id) {
                    *slot = updated.clone();
                }
                self.notify(
                    now,
                    NotificationKind::Success,
                    format!("Updated {name}'s number"),
                );
                Outcome::Updated(updated)
            }
            Err(err) => {
                warn!(id = %id, error = %err, "failed to update contact");
                let message = format!("Failed to update {name}: {}", err.user_message());
                self.notify(now, NotificationKind::Error, message);
                Outcome::Failed(err.kind())
            }
        }
    }

    /// Deletes a contact. Callers obtain the user's confirmation first.
    pub fn remove(&mut self, now: i64, id: &ContactId) -> Outcome {
        match self.service.delete(id) {
            Ok(()) => {
                debug!(id = %id, "contact deleted");
                self.contacts.retain(|contact| &contact.id != id);
                self.notify(
                    now,
                    NotificationKind::Success,
                    "Contact deleted successfully",
                );
                Outcome::Removed(id.clone())
            }
            Err(err) => {
                warn!(id = %id, error = %err, "failed to delete contact");
                let message = format!("Failed to delete contact: {}", err.user_message());
                self.notify(now, NotificationKind::Error, message);
                Outcome::Failed(err.kind())
            }
        }
    }

    fn notify(
        &mut self,
        now: i64,
        kind: NotificationKind,
        message: impl Into<String>,
    ) -> NotificationId {
        self.notifier.raise(now, kind, message)
    }

    fn upsert(&mut self, contact: Contact) {
        match self.contacts.iter_mut().find(|c| c.id == contact.id) {
            Some(slot) => *slot = contact,
            None => self.contacts.push(contact),
        }
    }
}

fn admit(contact: Contact) -> Result<Contact, ServiceError> {
    contact
        .validate()
        .map_err(|err| ServiceError::Decode(format!("contact {}: {err}", contact.id)))?;
    Ok(contact)
}

fn admit_same_id(id: &ContactId, contact: Contact) -> Result<Contact, ServiceError> {
    if &contact.id != id {
        return Err(ServiceError::Decode(format!(
            "update of contact {id} returned contact {}",
            contact.id
        )));
    }
    admit(contact)
}

fn admit_all(contacts: Vec<Contact>) -> Result<Vec<Contact>, ServiceError> {
    let mut admitted: Vec<Contact> = Vec::with_capacity(contacts.len());
    for contact in contacts {
        let contact = admit(contact)?;
        if admitted.iter().any(|c| c.id == contact.id) {
            warn!(id = %contact.id, "dropping duplicate contact id");
            continue;
        }
        admitted.push(contact);
    }
    Ok(admitted)
}
