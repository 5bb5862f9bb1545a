// src/config.rs
use std::time::Duration;

use clap::{Parser, Subcommand};

/// wake-on-demand - Remote server power control
#[derive(Parser, Debug)]
#[command(name = "wake-on-demand", version, about)]
pub struct Cli {
    /// Server port
    #[arg(short, long, env = "WOD_PORT", default_value_t = 8080, global = true)]
    pub port: u16,

    /// Server URL for client commands
    #[arg(
        short,
        long,
        env = "WOD_SERVER",
        default_value = "http://localhost:8080",
        global = true
    )]
    pub server: String,

    /// ESP timeout duration (e.g. 30s, 2m, 1h30m)
    #[arg(
        short,
        long,
        env = "WOD_TIMEOUT",
        default_value = "30s",
        value_parser = parse_duration,
        global = true
    )]
    pub timeout: Duration,

    #[command(subcommand)]
    pub command: Verb,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    /// Start the server
    Server,
    /// Send power on command (short pulse)
    On { esp_id: String },
    /// Send force shutdown command (long pulse)
    Off { esp_id: String },
    /// Check target server connectivity
    Status { esp_id: String },
    /// List all registered ESPs
    List,
}

impl Verb {
    /// Command value sent for the client verbs, `None` for `server` and `list`.
    pub fn command(&self) -> Option<(&'static str, &str)> {
        match self {
            Verb::On { esp_id } => Some(("pulse", esp_id)),
            Verb::Off { esp_id } => Some(("force", esp_id)),
            Verb::Status { esp_id } => Some(("status", esp_id)),
            Verb::Server | Verb::List => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Verb::Server => "server",
            Verb::On { .. } => "on",
            Verb::Off { .. } => "off",
            Verb::Status { .. } => "status",
            Verb::List => "list",
        }
    }
}

/// Parses Go-style durations: `500ms`, `45s`, `2m`, `1h30m`, `1.5h`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration".into());
    }

    let mut total = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration {s:?}"))?;
        let (num, tail) = rest.split_at(num_len);
        let value: f64 = num
            .parse()
            .map_err(|_| format!("invalid duration {s:?}"))?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let scale = match unit {
            "ms" => 0.001,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            other => return Err(format!("unknown unit {other:?} in duration {s:?}")),
        };
        total += value * scale;
        rest = tail;
    }

    if total <= 0.0 {
        return Err("duration must be positive".into());
    }
    Ok(Duration::from_secs_f64(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_and_compound_units() {
        assert_eq!(parse_duration("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h30m"), Ok(Duration::from_secs(5400)));
        assert_eq!(parse_duration("500ms"), Ok(Duration::from_millis(500)));
        assert_eq!(parse_duration("1.5h"), Ok(Duration::from_secs(5400)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("30").is_err());
        assert!(parse_duration("10x").is_err());
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("s").is_err());
    }

    #[test]
    fn maps_verbs_to_command_values() {
        let cli = Cli::try_parse_from(["wake-on-demand", "on", "bedroom"]).unwrap();
        assert_eq!(cli.command.command(), Some(("pulse", "bedroom")));

        let cli = Cli::try_parse_from(["wake-on-demand", "off", "bedroom"]).unwrap();
        assert_eq!(cli.command.command(), Some(("force", "bedroom")));

        let cli = Cli::try_parse_from(["wake-on-demand", "list"]).unwrap();
        assert_eq!(cli.command.command(), None);
    }

    #[test]
    fn global_flags_work_after_the_verb() {
        let cli = Cli::try_parse_from([
            "wake-on-demand",
            "server",
            "--port",
            "9090",
            "--timeout",
            "45s",
        ])
        .unwrap();
        assert_eq!(cli.command, Verb::Server);
        assert_eq!(cli.port, 9090);
        assert_eq!(cli.timeout, Duration::from_secs(45));
    }

    #[test]
    fn on_requires_an_id() {
        assert!(Cli::try_parse_from(["wake-on-demand", "on"]).is_err());
    }
}
