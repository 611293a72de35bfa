//! Timed composite-action engine of a gamepad remapping daemon.
//!
//! - [`actions`]: the action contract, the macro state machine and its decorators
//! - [`mapper`]: reference dispatcher with scheduler and pressed-key table
//! - [`config`]: TOML profiles binding gamepad buttons to actions
//! - [`daemon`]: tokio dispatch loop driving the mapper
//! - [`controller`]: decoded button edges from the upstream input layer

pub mod actions;
pub mod config;
pub mod controller;
pub mod daemon;
pub mod mapper;

#[cfg(test)]
mod testing;
