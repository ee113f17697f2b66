//! Network I/O used by checksum resolution.

pub mod download;
