//! HTTP request handlers for the command API.
//!
//! - `common` - response envelope and error mapping
//! - `nodes` - add, delete and list nodes
//! - `status` - fresh and cached status reports

pub mod common;
pub mod nodes;
pub mod status;

pub use nodes::*;
pub use status::*;
