// lmprov-api: Async Rust client for the LogicMonitor REST API

pub mod auth;
pub mod client;
pub mod error;
pub mod filter;
pub mod kind;
pub mod transport;
pub mod types;

pub use auth::LmCredentials;
pub use client::LogicMonitorClient;
pub use error::Error;
pub use filter::Filter;
pub use kind::GroupKind;
pub use transport::TransportConfig;
