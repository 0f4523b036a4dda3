//! Shared utilities for the type definitions.

pub mod bytes;
pub mod encoding;
pub mod rand;
pub mod serde;
