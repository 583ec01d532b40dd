// Error classification and retry with exponential backoff

pub mod errors;
pub mod executor;
pub mod policy;

pub use errors::{ErrorKind, WorkflowError};
pub use executor::{ErrorLogEntry, RetryExecutor};
pub use policy::{PolicyError, RetryPolicy};
