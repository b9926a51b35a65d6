use std::net::SocketAddr;
use std::time::Duration;

/// Runtime configuration read once at startup. Kept intentionally small —
/// a config-file crate would be overkill for three knobs.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub leave_grace: Duration,
    pub next_hand_delay: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("BIND_ADDR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| "0.0.0.0:8080".parse().unwrap());
        let leave_grace = std::env::var("LEAVE_GRACE_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));
        let next_hand_delay = std::env::var("NEXT_HAND_DELAY_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(5));
        Config { bind_addr, leave_grace, next_hand_delay }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "0.0.0.0:8080".parse().unwrap(),
            leave_grace: Duration::from_secs(60),
            next_hand_delay: Duration::from_secs(5),
        }
    }
}
