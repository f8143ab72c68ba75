// Crate root for the GT7 lap agent modules.

pub mod config;
pub mod constants;
pub mod heartbeat;
pub mod listener;
pub mod session;
pub mod sink;
pub mod tasks;
