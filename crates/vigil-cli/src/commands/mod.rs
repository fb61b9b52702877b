// crates/vigil-cli/src/commands/mod.rs
//
// Command module declarations for the vigil CLI.

pub mod account;
pub mod admin;
pub mod events;
pub mod pool;
pub mod proposal;
pub mod reward;
pub mod stake;
