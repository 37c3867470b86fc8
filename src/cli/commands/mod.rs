pub mod config;
pub mod defaults;
pub mod send;
pub mod slack;
pub mod toggle;
