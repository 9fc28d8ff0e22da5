pub mod common;
pub mod config;
pub mod error;
pub mod map;
pub mod master;
pub mod num;
pub mod separator;
pub mod snapshot;
pub mod stat;
pub mod usage;
