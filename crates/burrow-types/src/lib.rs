//! Foundation types for burrow.
//!
//! This crate contains the platform-agnostic core types shared by all
//! burrow crates: the error taxonomy, Gopher resource addresses, and menu
//! items with their wire (de)serialization.

pub mod address;
pub mod error;
pub mod item;

pub use address::GopherAddress;
pub use error::{BurrowError, Result};
pub use item::Item;

/// Default Gopher port (RFC 1436).
pub const DEFAULT_PORT: u16 = 70;
