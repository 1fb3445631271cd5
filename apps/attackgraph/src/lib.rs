//! # attackgraph
//!
//! Command-line driver for [`attackgraph_core`]. The binary in `main.rs` only
//! installs logging and dispatches into [`cli::execute`].

pub mod cli;
