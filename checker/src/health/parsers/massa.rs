//! Massa staking node, `wallet_info` output

use super::lines::{last_token, parse_decimal, parse_integer, require_line};
use crate::constants::thresholds::MASSA_MIN_ROLLS;
use crate::errors::ParseError;
use crate::health::types::HealthVerdict;

pub fn parse(lines: &[String]) -> Result<HealthVerdict, ParseError> {
    let active = last_token(require_line(lines, "Active rolls:", "active rolls")?);
    let candidate = last_token(require_line(lines, "Candidate rolls:", "candidate rolls")?);
    let balance = last_token(require_line(lines, "Final balance:", "balance")?);

    let active_rolls = parse_integer(active, "active rolls")?;
    let candidate_rolls = parse_integer(candidate, "candidate rolls")?;
    let balance_value = parse_decimal(balance, "balance")?;

    if active_rolls < MASSA_MIN_ROLLS {
        return Ok(HealthVerdict::failed(format!(
            "Wrong active rolls count {}",
            active_rolls
        )));
    }
    if candidate_rolls < MASSA_MIN_ROLLS {
        return Ok(HealthVerdict::failed(format!(
            "Wrong candidate rolls count {}",
            candidate_rolls
        )));
    }

    Ok(HealthVerdict::ok(
        format!(
            "Node is OK, rolls active: {}, rolls candidate: {}, balance: {}",
            active_rolls, candidate_rolls, balance
        ),
        balance_value,
    ))
}
