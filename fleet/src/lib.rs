pub mod accounts;
pub mod config;
pub mod decommission;
pub mod distribute;
pub mod gather;
pub mod launch;
pub mod machines;
pub mod provision;
pub mod remote;

#[cfg(test)]
mod fake;
