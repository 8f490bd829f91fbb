//! Reading and patching Garmin's Flexible and Interoperable Data Transfer
//! files in place.
//!
//! Chainring loads a whole document into a [`ByteStore`](store::ByteStore),
//! decodes its records once, and lets [scanners](scan) visit the data
//! records in order. Scanners extract values, print tables, summarise
//! activities, or record where fields live so they can be overwritten.
//! Patched documents keep their exact layout; only field bytes and the
//! trailing checksum change.
//!
//! The [`sans`] module holds the protocol primitives the rest is built on:
//! the file and record headers, definition records, base types and a
//! cursor codec aware of byte order.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `cli`: build the `chainring` command line tool (default).

pub mod batch;
pub mod developer;
pub mod fields;
pub mod geo;
pub mod profile;
pub mod sans;
pub mod scan;
pub mod sport;
pub mod store;

pub use fields::{FromFields, FromRecords, publish};
pub use scan::{Flow, Outcome, Scanner, scan};
pub use store::ByteStore;
