pub mod directory;
pub mod domain;
pub mod error;
pub mod notification;
pub mod time;

pub use directory::{Directory, DirectoryService, Outcome, ServiceError, ServiceErrorKind};
pub use domain::*;
pub use error::CoreError;
pub use notification::{Notification, NotificationKind, Notifier, DEFAULT_NOTIFICATION_TTL_SECS};
