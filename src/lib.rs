//! Broomstick engine library.
//!
//! Exposes the board model, the reference rules, evaluation, search, the
//! turn orchestrator and the wire protocol for the binaries, integration
//! tests and benches.

pub mod board;
pub mod config;
pub mod engine;
pub mod eval;
pub mod movegen;
pub mod protocol;
pub mod search;
pub mod selfplay;
