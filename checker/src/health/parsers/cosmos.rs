//! Tendermint `/status` reply, used by cosmos and defund nodes
//!
//! Read over HTTP the reply is plain JSON. Through a terminal it arrives
//! pretty printed and wrapped in prompt noise, so the JSON object is cut out
//! first and, failing that, the fields are read line by line.

use serde_json::Value;

use super::lines::{bare_token, require_line};
use crate::errors::ParseError;
use crate::health::types::HealthVerdict;

const CATCHING_UP_MESSAGE: &str = "Node is catching_up, and not syncronized yet";

pub fn parse(reply: &str) -> Result<HealthVerdict, ParseError> {
    if let Some(document) = embedded_json(reply) {
        return parse_json(&document);
    }

    let lines: Vec<String> = reply.lines().map(String::from).collect();
    parse_lines(&lines)
}

fn embedded_json(reply: &str) -> Option<Value> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&reply[start..=end]).ok()
}

fn parse_json(document: &Value) -> Result<HealthVerdict, ParseError> {
    let sync_info = document.pointer("/result/sync_info");

    let catching_up = sync_info.and_then(|info| info.get("catching_up"));
    if catching_up != Some(&Value::Bool(false)) {
        return Ok(HealthVerdict::failed(CATCHING_UP_MESSAGE));
    }

    let height = match sync_info.and_then(|info| info.get("latest_block_height")) {
        Some(Value::String(height)) => height.clone(),
        Some(Value::Number(height)) => height.to_string(),
        _ => return Err(ParseError::missing_field("result.sync_info.latest_block_height")),
    };

    Ok(HealthVerdict::ok(
        format!("Node is OK, latest_block_height: {}", height),
        0.0,
    ))
}

fn parse_lines(lines: &[String]) -> Result<HealthVerdict, ParseError> {
    let catching_up = bare_token(require_line(lines, "catching_up", "catching_up")?);
    if catching_up != "false" {
        return Ok(HealthVerdict::failed(format!(
            "Wrong catching_up status, {}",
            catching_up
        )));
    }

    let height = bare_token(require_line(
        lines,
        "latest_block_height",
        "latest_block_height",
    )?);

    Ok(HealthVerdict::ok(
        format!("Node is OK, latest_block_height: {}", height),
        0.0,
    ))
}
