//! Utility modules: developer logging, numeric helpers.
pub mod devlog;
pub mod num;
