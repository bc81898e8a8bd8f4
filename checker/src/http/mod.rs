//! Outbound HTTP to node APIs and reference sources

pub mod probe;

pub use probe::{ApiProbe, ApiReply};
