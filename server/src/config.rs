// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::net::SocketAddr;
use std::time::Duration;
use tracing::warn;

/// Default database location, overridable via `DATABASE_URL`.
pub const DEFAULT_DB_URL: &str = "sqlite://database/sqlite.db";

/// Fallback signing secret for development. Deployments must set
/// `ACCESS_TOKEN_SECRET`.
const DEFAULT_ACCESS_TOKEN_SECRET: &str = "dev-access-token-secret";

const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 3000);

/// Interval between background reminder/expiry sweeps (seconds).
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 5 * 60;

pub fn database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DB_URL.to_string())
}

pub fn access_token_secret() -> String {
    std::env::var("ACCESS_TOKEN_SECRET")
        .unwrap_or_else(|_| DEFAULT_ACCESS_TOKEN_SECRET.to_string())
}

pub fn bind_addr() -> SocketAddr {
    bind_addr_from(std::env::var("BIND_ADDR").ok().as_deref())
}

fn bind_addr_from(value: Option<&str>) -> SocketAddr {
    match value {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(
                "Ignoring invalid BIND_ADDR {:?}, falling back to the default address",
                raw
            );
            SocketAddr::from(DEFAULT_BIND_ADDR)
        }),
        None => SocketAddr::from(DEFAULT_BIND_ADDR),
    }
}

pub fn sweep_interval() -> Duration {
    let secs = std::env::var("SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS);
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_parses_valid_values() {
        let addr = bind_addr_from(Some("127.0.0.1:8080"));
        assert_eq!(addr, SocketAddr::from(([127, 0, 0, 1], 8080)));
    }

    #[test]
    fn bind_addr_falls_back_on_missing_or_invalid_input() {
        let default = SocketAddr::from(DEFAULT_BIND_ADDR);
        assert_eq!(bind_addr_from(None), default);
        assert_eq!(bind_addr_from(Some("not-an-address")), default);
        assert_eq!(bind_addr_from(Some("256.0.0.1:99999")), default);
    }
}
