//! Node health checking
//!
//! Leaf first: `types` and `registry` describe what can be checked,
//! `parsers` read replies, `checker` runs one node, `hysteresis` gates
//! notifications and `monitor` drives an owner's nodes.

pub mod checker;
pub mod hysteresis;
pub mod monitor;
pub mod parsers;
pub mod registry;
pub mod types;

pub use checker::{CheckSettings, NodeChecker};
pub use monitor::HealthMonitor;
pub use types::{HealthVerdict, NodeState, NodeTarget, NodeType, TransportKind};
