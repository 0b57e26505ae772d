//! Shared error taxonomy

pub mod errors;

pub use errors::{AmmError, AmmResult};
