// src/monitor.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::device::{format_elapsed, Liveness};
use crate::registry::{Registry, Transition};

/// Fixed pass period, independent of the device timeout.
pub const MONITOR_PERIOD: Duration = Duration::from_secs(10);

/// Periodically recomputes device liveness and logs transitions.
pub struct LivenessMonitor {
    registry: Arc<Registry>,
    period: Duration,
}

impl LivenessMonitor {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::with_period(registry, MONITOR_PERIOD)
    }

    pub fn with_period(registry: Arc<Registry>, period: Duration) -> Self {
        Self { registry, period }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    pub async fn run(&self) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            self.pass();
        }
    }

    pub fn pass(&self) -> Vec<Transition> {
        let transitions = self.registry.sweep();
        for t in &transitions {
            match t.change {
                Liveness::WentOffline => warn!(
                    id = %t.id,
                    "ESP went OFFLINE (last seen {} ago)",
                    format_elapsed(t.elapsed)
                ),
                Liveness::BackOnline => info!(id = %t.id, "ESP is back ONLINE"),
            }
        }
        transitions
    }
}
