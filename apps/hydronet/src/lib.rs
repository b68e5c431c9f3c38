//! # hydronet
//!
//! Library side of the hydronet binary: the CLI definition and its commands,
//! and the TOML network description format.

pub mod cli;
pub mod network;
