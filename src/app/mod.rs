//! Application layer: wires ports to concrete adapters and exposes the CLI.

pub mod bootstrap;
pub mod cli;
