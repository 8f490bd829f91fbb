//! Protocol primitives, free of file handling.
//!
//! These pieces decode and encode the parts of a document in isolation: the
//! document and record headers ([`header`]), definition records and their
//! field layouts ([`definition`]), base types and values ([`data`]),
//! byte-order aware cursors ([`codec`]), and the trailing checksum
//! ([`check`]).
//!
//! Most users should begin with [`crate::store::ByteStore`], which stitches
//! these together into a decoded, patchable document.

pub mod check;
pub mod codec;
pub mod data;
pub mod definition;
pub mod header;
