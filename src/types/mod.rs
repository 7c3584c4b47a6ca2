//! Request and response types for the Polygon.io API.
//!
//! This module contains the strongly-typed structs used for encoding
//! requests and deserializing responses from the endpoints this crate uses.
//!
//! ## Organization
//!
//! - [`enums`] — Shared enumerations (contract type, sort order)
//! - [`aggregates`] — OHLC bar types for the underlying price
//! - [`options_snapshot`] — Options chain snapshot types
//!
//! All enums are re-exported at the module root via `pub use enums::*`.

pub mod aggregates;
pub mod enums;
pub mod options_snapshot;

pub use enums::*;
