//! chat-core: Shared infrastructure for the docchat client crates.
pub mod config;
pub mod error;
pub mod observability;
pub mod time;

pub use error::ClientError;
