//! Server protocol.
//!
//! Message types for the JSON line protocol and the framing that turns
//! input lines into messages and messages into output lines.

pub mod message;
pub mod parser;

pub use message::{
    DeltaRequest, Inbound, MatchFinish, MatchStart, Next, Outbound, Snapshot, TeamFormation,
    TeamSnapshot,
};
pub use parser::{format_message, parse_message, ProtocolError};
