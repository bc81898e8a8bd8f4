//! Minima node, `/incentivecash` JSON

use serde_json::Value;

use crate::errors::ParseError;
use crate::health::types::HealthVerdict;

const REWARD_FIELDS: [&str; 4] = [
    "dailyRewards",
    "previousRewards",
    "communityRewards",
    "inviterRewards",
];

pub fn parse(body: &str) -> Result<HealthVerdict, ParseError> {
    let document: Value =
        serde_json::from_str(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    match document.get("status") {
        Some(Value::Bool(true)) => {}
        other => {
            let status = other.map_or_else(|| "missing".to_string(), Value::to_string);
            return Ok(HealthVerdict::failed(format!(
                "Node status is not true {}",
                status
            )));
        }
    }

    let rewards = document
        .pointer("/response/details/rewards")
        .and_then(Value::as_object)
        .ok_or_else(|| ParseError::missing_field("response.details.rewards"))?;

    let mut total = 0.0;
    for field in REWARD_FIELDS {
        total += match rewards.get(field) {
            None | Some(Value::Null) => 0.0,
            Some(Value::Number(value)) => value.as_f64().unwrap_or(0.0),
            Some(Value::String(value)) => value
                .trim()
                .parse::<f64>()
                .map_err(|_| ParseError::invalid_number(field, value))?,
            Some(other) => return Err(ParseError::invalid_number(field, &other.to_string())),
        };
    }

    Ok(HealthVerdict::ok(
        format!("Node is OK, rewards: {}", total),
        total,
    ))
}
