pub mod contact;
pub mod ids;
pub mod phone;

pub use contact::{Contact, ContactDraft};
pub use ids::{ContactId, NotificationId};
pub use phone::{
    is_valid_phone_number, normalize_phone_number, sanitize_phone_number, PHONE_FORMAT_HINT,
};
