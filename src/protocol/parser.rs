//! Line framing for the JSON protocol.
//!
//! One message per line in both directions. Blank lines are ignored.

use thiserror::Error;

use super::message::{Inbound, Outbound};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Parses one input line. Returns `Ok(None)` for blank lines.
pub fn parse_message(line: &str) -> Result<Option<Inbound>, ProtocolError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(trimmed)?))
}

/// Encodes one outgoing message as a single line without the newline.
pub fn format_message(message: &Outbound) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}
