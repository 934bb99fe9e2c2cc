use crate::domain::{Contact, ContactDraft, ContactId};
use thiserror::Error;

/// Remote CRUD boundary the [`Directory`](super::Directory) talks to.
///
/// Implementations resolve each call exactly once; retries and timeouts
/// stay behind this trait.
pub trait DirectoryService {
    fn fetch_all(&self) -> Result<Vec<Contact>, ServiceError>;
    fn create(&self, draft: &ContactDraft) -> Result<Contact, ServiceError>;
    fn update(&self, id: &ContactId, draft: &ContactDraft) -> Result<Contact, ServiceError>;
    fn delete(&self, id: &ContactId) -> Result<(), ServiceError>;
}

impl<T: DirectoryService + ?Sized> DirectoryService for Box<T> {
    fn fetch_all(&self) -> Result<Vec<Contact>, ServiceError> {
        (**self).fetch_all()
    }

    fn create(&self, draft: &ContactDraft) -> Result<Contact, ServiceError> {
        (**self).create(draft)
    }

    fn update(&self, id: &ContactId, draft: &ContactDraft) -> Result<Contact, ServiceError> {
        (**self).update(id, draft)
    }

    fn delete(&self, id: &ContactId) -> Result<(), ServiceError> {
        (**self).delete(id)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("service unavailable ({status}): {message}")]
    Unavailable { status: u16, message: String },
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    NotFound,
    Rejected,
    Unavailable,
    Timeout,
    Transport,
    Decode,
}

impl ServiceError {
    pub fn kind(&self) -> ServiceErrorKind {
        match self {
            ServiceError::NotFound(_) => ServiceErrorKind::NotFound,
            ServiceError::Rejected { .. } => ServiceErrorKind::Rejected,
            ServiceError::Unavailable { .. } => ServiceErrorKind::Unavailable,
            ServiceError::Timeout => ServiceErrorKind::Timeout,
            ServiceError::Transport(_) => ServiceErrorKind::Transport,
            ServiceError::Decode(_) => ServiceErrorKind::Decode,
        }
    }

    /// Short text suitable for a notification suffix.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::NotFound(_) => "contact no longer exists".to_string(),
            ServiceError::Rejected { message, .. } => message.clone(),
            ServiceError::Unavailable { .. }
            | ServiceError::Timeout
            | ServiceError::Transport(_) => {
                "server unreachable, please try again later".to_string()
            }
            ServiceError::Decode(_) => "unexpected response from server".to_string(),
        }
    }
}
