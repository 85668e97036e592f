//! CLI command implementations for `spe-mcp`.
//!
//! Each command module exports an `*Args` struct implementing `clap::Args`
//! and a `run` function taking it.

pub mod call;
pub mod serve;
pub mod tools;
