// src/lib.rs
//! Track a fleet of polling ESP devices and hand each one at most one
//! pending power command.

pub mod api;
pub mod client;
pub mod config;
pub mod device;
pub mod error;
pub mod monitor;
pub mod registry;
pub mod types;

pub use client::CommandClient;
pub use device::Command;
pub use error::{ApiError, ClientError, RegistryError};
pub use monitor::{LivenessMonitor, MONITOR_PERIOD};
pub use registry::Registry;
