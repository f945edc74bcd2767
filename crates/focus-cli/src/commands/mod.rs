pub mod auth_cmd;
pub mod backup;
pub mod common;
pub mod config;
pub mod interrupt;
pub mod session;
pub mod stats;
pub mod sync;
