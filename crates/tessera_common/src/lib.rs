//! Shared foundational types used across the Tessera build toolchain.
//!
//! This crate provides content hashing, interned identifiers and file
//! modification timestamps.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;
pub mod time;

pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use time::Timestamp;
