//! Relay configuration, read once from the environment at start

use std::env;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use axum::http::HeaderValue;
use tracing::warn;

use crate::error::{RelayError, RelayResult};

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_CLIENT_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Cross-origin policy for browser clients
#[derive(Clone, Debug, PartialEq)]
pub enum ClientOrigin {
    Any,
    Exact(HeaderValue),
}

impl FromStr for ClientOrigin {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value == "*" {
            return Ok(Self::Any);
        }
        HeaderValue::from_str(value)
            .map(Self::Exact)
            .map_err(|e| e.to_string())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RelayConfig {
    pub host: IpAddr,
    pub port: u16,
    pub client_origin: ClientOrigin,
    /// Frames buffered per connection before new ones are dropped
    pub queue_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            client_origin: ClientOrigin::Exact(HeaderValue::from_static(DEFAULT_CLIENT_ORIGIN)),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> RelayResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> RelayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            host: load(&lookup, "RELAY_HOST", defaults.host)?,
            port: load(&lookup, "RELAY_PORT", defaults.port)?,
            client_origin: load(&lookup, "RELAY_CLIENT_ORIGIN", defaults.client_origin)?,
            queue_capacity: load(&lookup, "RELAY_QUEUE_CAPACITY", defaults.queue_capacity)?,
        };

        if config.queue_capacity == 0 {
            return Err(RelayError::Config {
                key: "RELAY_QUEUE_CAPACITY",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn load<F, T>(lookup: &F, key: &'static str, default: T) -> RelayResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| RelayError::Config {
            key,
            reason: e.to_string(),
            value,
        }),
        None => {
            warn!("Environment variable {key} not found, using default");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = RelayConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, RelayConfig::default());
        assert_eq!(config.socket_addr().port(), 3001);
    }

    #[test]
    fn test_reads_overrides() {
        let config = RelayConfig::from_lookup(lookup_from(&[
            ("RELAY_HOST", "127.0.0.1"),
            ("RELAY_PORT", "4000"),
            ("RELAY_CLIENT_ORIGIN", "https://tribe.example"),
            ("RELAY_QUEUE_CAPACITY", "16"),
        ]))
        .unwrap();

        assert_eq!(config.socket_addr(), "127.0.0.1:4000".parse().unwrap());
        assert_eq!(
            config.client_origin,
            ClientOrigin::Exact(HeaderValue::from_static("https://tribe.example"))
        );
        assert_eq!(config.queue_capacity, 16);
    }

    #[test]
    fn test_wildcard_origin() {
        let config =
            RelayConfig::from_lookup(lookup_from(&[("RELAY_CLIENT_ORIGIN", "*")])).unwrap();
        assert_eq!(config.client_origin, ClientOrigin::Any);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = RelayConfig::from_lookup(lookup_from(&[("RELAY_PORT", "not-a-port")]))
            .unwrap_err();
        assert!(matches!(err, RelayError::Config { key: "RELAY_PORT", .. }));
    }

    #[test]
    fn test_zero_queue_capacity_is_rejected() {
        let err = RelayConfig::from_lookup(lookup_from(&[("RELAY_QUEUE_CAPACITY", "0")]))
            .unwrap_err();
        assert!(matches!(
            err,
            RelayError::Config {
                key: "RELAY_QUEUE_CAPACITY",
                ..
            }
        ));
    }
}
