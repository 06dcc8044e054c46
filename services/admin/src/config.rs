//! Command line and environment configuration

use crate::params::MAX_NOTE_BYTES;
use crate::state::Limits;
use clap::Parser;
use std::net::SocketAddr;

#[derive(Debug, Clone, Parser)]
#[command(name = "admin")]
#[command(version)]
#[command(about = "Operator control plane for the exchange venue")]
pub struct AdminConfig {
    /// Address the admin API listens on. Keep it on a private interface.
    #[arg(long, env = "ADMIN_ADDR", default_value = "127.0.0.1:6542")]
    pub addr: SocketAddr,

    /// Log filter directive, used when RUST_LOG is not set.
    #[arg(long, env = "ADMIN_LOG_FILTER", default_value = "info")]
    pub log_filter: String,

    /// Emit logs as JSON lines.
    #[arg(long, env = "ADMIN_LOG_JSON", default_value_t = false)]
    pub log_json: bool,

    /// Match records buffered between the engine and a slow client.
    #[arg(long, env = "ADMIN_EXPORT_BUFFER", default_value_t = Limits::default().export_buffer)]
    pub export_buffer: usize,

    /// Maximum raw notice body bytes read before validation.
    #[arg(long, env = "ADMIN_NOTE_READ_LIMIT", default_value_t = Limits::default().note_read_limit)]
    pub note_read_limit: usize,
}

impl AdminConfig {
    pub fn limits(&self) -> Limits {
        Limits {
            export_buffer: self.export_buffer.max(1),
            note_read_limit: self.note_read_limit.max(MAX_NOTE_BYTES + 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AdminConfig::try_parse_from(["admin"]).unwrap();
        assert_eq!(cfg.addr, "127.0.0.1:6542".parse().unwrap());
        assert!(!cfg.log_json);
        assert_eq!(cfg.limits(), Limits::default());
    }

    #[test]
    fn test_flags_override() {
        let cfg = AdminConfig::try_parse_from([
            "admin",
            "--addr",
            "0.0.0.0:7000",
            "--log-json",
            "--export-buffer",
            "0",
        ])
        .unwrap();
        assert_eq!(cfg.addr.port(), 7000);
        assert!(cfg.log_json);
        assert_eq!(cfg.limits().export_buffer, 1);
    }

    #[test]
    fn test_note_read_limit_never_below_max_notice() {
        let cfg = AdminConfig::try_parse_from(["admin", "--note-read-limit", "100"]).unwrap();
        assert_eq!(cfg.limits().note_read_limit, MAX_NOTE_BYTES + 2);

        let cfg = AdminConfig::try_parse_from(["admin", "--note-read-limit", "1000000"]).unwrap();
        assert_eq!(cfg.limits().note_read_limit, 1_000_000);
    }
}
