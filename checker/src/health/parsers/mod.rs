//! Pure reply parsers, one per node family
//!
//! Parsers never perform I/O. A reply that cannot be read yields a
//! [`ParseError`]; a reply that reads fine but shows an unhealthy node yields
//! a failed [`HealthVerdict`].

pub mod aptos;
pub mod cosmos;
pub mod lines;
pub mod massa;
pub mod minima;
pub mod starknet;

use super::registry::ParserKind;
use super::types::HealthVerdict;
use crate::errors::ParseError;

/// Raw reply as delivered by the transport
#[derive(Debug, Clone, PartialEq)]
pub enum NodeReply {
    /// HTTP response body
    Body(String),
    /// Sanitized session output
    Lines(Vec<String>),
}

impl NodeReply {
    fn lines(&self) -> Vec<String> {
        match self {
            NodeReply::Body(body) => body.lines().map(String::from).collect(),
            NodeReply::Lines(lines) => lines.clone(),
        }
    }

    fn text(&self) -> String {
        match self {
            NodeReply::Body(body) => body.clone(),
            NodeReply::Lines(lines) => lines.join("\n"),
        }
    }
}

/// Data gathered outside the node itself
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseContext {
    pub reference_height: Option<i64>,
}

pub fn parse(
    kind: ParserKind,
    reply: &NodeReply,
    context: &ParseContext,
) -> Result<HealthVerdict, ParseError> {
    match kind {
        ParserKind::Aptos => aptos::parse(&reply.lines(), context.reference_height),
        ParserKind::Minima => minima::parse(&reply.text()),
        ParserKind::CosmosStatus => cosmos::parse(&reply.text()),
        ParserKind::Massa => massa::parse(&reply.lines()),
        ParserKind::Starknet => starknet::parse(&reply.lines()),
    }
}
