//! Utilities shared by the format decoders.

pub mod encoding;
