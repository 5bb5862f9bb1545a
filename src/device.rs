// src/device.rs
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tokio::time::Instant;

/// Pending command slot of a device.
///
/// The three known values map to what the ESP firmware understands. Anything
/// else a client sends is kept verbatim and handed to the device as-is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Command {
    #[default]
    None,
    /// Short power button pulse.
    Pulse,
    /// Long pulse, forces a shutdown.
    Force,
    /// Connectivity check of the target machine.
    Status,
    Unrecognized(String),
}

impl Command {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "" => Command::None,
            "pulse" => Command::Pulse,
            "force" => Command::Force,
            "status" => Command::Status,
            other => Command::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Command::None => "",
            Command::Pulse => "pulse",
            Command::Force => "force",
            Command::Status => "status",
            Command::Unrecognized(raw) => raw,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Command::None)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Command {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// Liveness change observed by a monitor pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    WentOffline,
    BackOnline,
}

#[derive(Debug)]
pub struct Device {
    pub(crate) command: Command,
    pub(crate) last_seen: Instant,
    pub(crate) last_seen_at: DateTime<Utc>,
    pub(crate) online: bool,
}

impl Device {
    pub(crate) fn new(now: Instant) -> Self {
        Self {
            command: Command::None,
            last_seen: now,
            last_seen_at: Utc::now(),
            online: true,
        }
    }

    /// Contact path (register, poll). Can only raise `online`.
    pub(crate) fn mark_contact(&mut self, now: Instant) {
        self.last_seen = now;
        self.last_seen_at = Utc::now();
        self.online = true;
    }

    /// Monitor path. The only place `online` is ever lowered.
    pub(crate) fn reassess(&mut self, now: Instant, timeout: Duration) -> Option<Liveness> {
        let was_online = self.online;
        self.online = self.is_live(now, timeout);
        match (was_online, self.online) {
            (true, false) => Some(Liveness::WentOffline),
            (false, true) => Some(Liveness::BackOnline),
            _ => None,
        }
    }

    pub(crate) fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_seen)
    }

    pub(crate) fn is_live(&self, now: Instant, timeout: Duration) -> bool {
        self.elapsed(now) < timeout
    }

    pub(crate) fn take_command(&mut self) -> Command {
        std::mem::take(&mut self.command)
    }
}

/// Renders an elapsed time rounded to the second, e.g. `42s`, `3m5s`, `2h0m7s`.
pub fn format_elapsed(d: Duration) -> String {
    let secs = (d.as_millis() + 500) / 1000;
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h{m}m{s}s")
    } else if m > 0 {
        format!("{m}m{s}s")
    } else {
        format!("{s}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_and_unknown_commands() {
        assert_eq!(Command::parse(""), Command::None);
        assert_eq!(Command::parse("pulse"), Command::Pulse);
        assert_eq!(Command::parse("force"), Command::Force);
        assert_eq!(Command::parse("status"), Command::Status);
        assert_eq!(
            Command::parse("reboot"),
            Command::Unrecognized("reboot".into())
        );
        assert_eq!(Command::parse("reboot").as_str(), "reboot");
    }

    #[test]
    fn command_serializes_as_plain_string() {
        let v = serde_json::to_value(Command::Force).unwrap();
        assert_eq!(v, serde_json::json!("force"));
        let v = serde_json::to_value(Command::None).unwrap();
        assert_eq!(v, serde_json::json!(""));
    }

    #[test]
    fn formats_elapsed_like_a_clock() {
        assert_eq!(format_elapsed(Duration::ZERO), "0s");
        assert_eq!(format_elapsed(Duration::from_millis(499)), "0s");
        assert_eq!(format_elapsed(Duration::from_millis(1500)), "2s");
        assert_eq!(format_elapsed(Duration::from_secs(42)), "42s");
        assert_eq!(format_elapsed(Duration::from_secs(185)), "3m5s");
        assert_eq!(format_elapsed(Duration::from_secs(7207)), "2h0m7s");
    }

    #[tokio::test(start_paused = true)]
    async fn reassess_reports_transitions_only_on_change() {
        let timeout = Duration::from_secs(30);
        let mut dev = Device::new(Instant::now());

        assert_eq!(dev.reassess(Instant::now(), timeout), None);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(dev.reassess(Instant::now(), timeout), Some(Liveness::WentOffline));
        assert_eq!(dev.reassess(Instant::now(), timeout), None);
        assert!(!dev.online);

        dev.mark_contact(Instant::now());
        assert!(dev.online);
        assert_eq!(dev.reassess(Instant::now(), timeout), None);
    }

    #[tokio::test(start_paused = true)]
    async fn reassess_can_restore_a_flag_lowered_earlier() {
        let timeout = Duration::from_secs(30);
        let mut dev = Device::new(Instant::now());
        dev.online = false;

        assert_eq!(dev.reassess(Instant::now(), timeout), Some(Liveness::BackOnline));
    }

    #[test]
    fn take_command_empties_the_slot() {
        let mut dev = Device::new(Instant::now());
        dev.command = Command::Pulse;
        assert_eq!(dev.take_command(), Command::Pulse);
        assert!(dev.command.is_none());
    }
}
