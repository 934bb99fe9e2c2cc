pub mod service;
pub mod state;

pub use service::{DirectoryService, ServiceError, ServiceErrorKind};
pub use state::{Directory, Outcome};
