//! HTTP protocol types
//!
//! Provides the method enum shared by request definitions and the transport.

mod method;

pub use method::*;
