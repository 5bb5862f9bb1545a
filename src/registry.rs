// src/registry.rs
use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::device::{format_elapsed, Command, Device, Liveness};
use crate::error::RegistryError;

/// Copy of one device as seen by `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub id: String,
    pub online: bool,
    pub elapsed: Duration,
    pub last_seen_at: DateTime<Utc>,
}

impl DeviceSnapshot {
    pub fn last_seen(&self) -> String {
        format!("{} ago", format_elapsed(self.elapsed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthSummary {
    pub total: usize,
    pub online: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub id: String,
    pub change: Liveness,
    pub elapsed: Duration,
}

/// Whether `register` created a device or refreshed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    New,
    Refreshed,
}

/// In-memory device table. Every operation holds the single lock for its
/// whole critical section and never does I/O under it.
#[derive(Debug)]
pub struct Registry {
    devices: Mutex<HashMap<String, Device>>,
    timeout: Duration,
}

impl Registry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            devices: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Callers guarantee `id` is non-empty.
    pub fn register(&self, id: &str) -> Registration {
        let now = Instant::now();
        let outcome = {
            let mut devices = self.devices.lock();
            match devices.get_mut(id) {
                Some(dev) => {
                    dev.mark_contact(now);
                    Registration::Refreshed
                }
                None => {
                    devices.insert(id.to_string(), Device::new(now));
                    Registration::New
                }
            }
        };

        match outcome {
            Registration::New => info!(id, "new ESP registered"),
            Registration::Refreshed => info!(id, "ESP re-registered"),
        }
        outcome
    }

    /// Overwrites the pending slot. An undelivered earlier command is lost.
    pub fn set_command(&self, id: &str, command: Command) -> Result<Command, RegistryError> {
        let now = Instant::now();
        let dropped = {
            let mut devices = self.devices.lock();
            let dev = devices
                .get_mut(id)
                .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
            if !dev.is_live(now, self.timeout) {
                return Err(RegistryError::Unavailable(id.to_string()));
            }
            std::mem::replace(&mut dev.command, command.clone())
        };

        if let Command::Unrecognized(raw) = &command {
            warn!(id, command = %raw, "queued unrecognized command");
        }
        if !dropped.is_none() {
            info!(id, %dropped, "overwrote undelivered command");
        }
        info!(id, %command, "command queued");
        Ok(command)
    }

    /// Refreshes liveness and hands out the pending command, leaving the slot empty.
    pub fn poll_and_clear(&self, id: &str) -> Result<Command, RegistryError> {
        let now = Instant::now();
        let command = {
            let mut devices = self.devices.lock();
            let dev = devices
                .get_mut(id)
                .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
            dev.mark_contact(now);
            dev.take_command()
        };

        if !command.is_none() {
            info!(id, %command, "command delivered");
        }
        Ok(command)
    }

    pub fn list(&self) -> Vec<DeviceSnapshot> {
        let now = Instant::now();
        let devices = self.devices.lock();
        devices
            .iter()
            .map(|(id, dev)| DeviceSnapshot {
                id: id.clone(),
                online: dev.is_live(now, self.timeout),
                elapsed: dev.elapsed(now),
                last_seen_at: dev.last_seen_at,
            })
            .collect()
    }

    pub fn health_summary(&self) -> HealthSummary {
        let now = Instant::now();
        let devices = self.devices.lock();
        HealthSummary {
            total: devices.len(),
            online: devices
                .values()
                .filter(|dev| dev.is_live(now, self.timeout))
                .count(),
        }
    }

    /// One liveness pass over every device, under one critical section.
    pub fn sweep(&self) -> Vec<Transition> {
        let now = Instant::now();
        let mut devices = self.devices.lock();
        devices
            .iter_mut()
            .filter_map(|(id, dev)| {
                dev.reassess(now, self.timeout).map(|change| Transition {
                    id: id.clone(),
                    change,
                    elapsed: dev.elapsed(now),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.devices.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
