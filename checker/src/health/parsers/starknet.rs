//! Starknet full node, `systemctl status` line

use super::lines::require_line;
use crate::errors::ParseError;
use crate::health::types::HealthVerdict;

pub fn parse(lines: &[String]) -> Result<HealthVerdict, ParseError> {
    let active = require_line(lines, "Active:", "active")?;

    if !active.contains("active (running)") {
        return Ok(HealthVerdict::failed("Wrong active node status"));
    }

    Ok(HealthVerdict::ok("Node is OK, active (running)", 0.0))
}
