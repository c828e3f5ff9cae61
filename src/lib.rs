//! gcap - reader for GCAP game network capture files
//!
//! A capture is an integrity-checked header followed by a stream of
//! variable-length records. [`CaptureReader`] maps the file, validates the
//! header and decodes records on demand through a lazily built index.
//! [`packet::unroll`] splits composite control packets into atomic packets.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::multiple_crate_versions
)]

pub mod capture;
pub mod config;
pub mod error;
pub mod packet;

pub use capture::{CaptureMetadata, CaptureReader, Record};
pub use config::ReaderConfig;
pub use error::{ErrorKind, GcapError, Result};
