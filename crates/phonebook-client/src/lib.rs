pub mod error;
pub mod http;
pub mod retry;

pub use error::{ClientError, Result};
pub use http::{ClientOptions, HttpDirectory};
pub use retry::{RetryPolicy, Step};
