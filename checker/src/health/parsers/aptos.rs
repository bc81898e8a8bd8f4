//! Aptos full node, Prometheus `/metrics` text

use super::lines::{last_token, parse_integer};
use crate::constants::thresholds::APTOS_MAX_LEDGER_DIVERGENCE;
use crate::errors::ParseError;
use crate::health::types::HealthVerdict;

const SYNC_METRIC: &str = "aptos_state_sync_version";

/// `reference` is the ledger version of a trusted full node, when it could be fetched
pub fn parse(lines: &[String], reference: Option<i64>) -> Result<HealthVerdict, ParseError> {
    let sync_lines: Vec<&str> = lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.starts_with('#') && line.contains(SYNC_METRIC))
        .collect();
    if sync_lines.is_empty() {
        return Err(ParseError::missing_label(SYNC_METRIC));
    }

    let applied = version_of(&sync_lines, "applied_transaction_outputs", "applied")?;
    let synced = version_of(&sync_lines, "synced", "synced")?;

    let Some(ledger) = reference else {
        return Ok(HealthVerdict::ok(
            format!("Node is OK, ledger unknown, applied {}, synced {}", applied, synced),
            0.0,
        ));
    };

    if ledger.abs_diff(synced) > APTOS_MAX_LEDGER_DIVERGENCE {
        return Ok(HealthVerdict::failed(format!(
            "Something wrong in sync process, ledger {}, synced {}",
            ledger, synced
        )));
    }
    if ledger.abs_diff(applied) > APTOS_MAX_LEDGER_DIVERGENCE {
        return Ok(HealthVerdict::failed(format!(
            "Something wrong in sync process, ledger {}, applied {}",
            ledger, applied
        )));
    }

    Ok(HealthVerdict::ok(
        format!(
            "Node is OK, ledger {}, applied {}, synced {}",
            ledger, applied, synced
        ),
        0.0,
    ))
}

fn version_of(sync_lines: &[&str], needle: &str, name: &str) -> Result<i64, ParseError> {
    let label = format!("{} {}", SYNC_METRIC, name);
    let line = sync_lines
        .iter()
        .rev()
        .find(|line| line.contains(needle))
        .ok_or_else(|| ParseError::missing_label(&label))?;
    parse_integer(last_token(line), &label)
}
