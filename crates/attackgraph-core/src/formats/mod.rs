//! # Formats Module
//!
//! Binary serialization of generated datasets.
//!
//! File I/O stays in the app layer; this module only maps datasets to bytes.

mod persistence;

pub use persistence::*;
