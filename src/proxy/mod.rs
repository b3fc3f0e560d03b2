//! Proxy pool with health tracking
//!
//! Holds the static list of egress endpoints and hands out a random healthy
//! one per attempt. Endpoints that fail at the connection/proxy level, or
//! that were active when the service signalled blocking, are blacklisted for
//! the rest of the process run; the blacklist only grows.

use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::fmt;
use std::sync::Mutex;

use crate::error::ProxyError;

/// A single network egress endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyEndpoint {
    pub host: String,
    pub port: u16,
}

impl ProxyEndpoint {
    /// Parse a `host:port` string
    pub fn parse(s: &str) -> Option<Self> {
        let (host, port) = s.trim().rsplit_once(':')?;
        if host.is_empty() {
            return None;
        }
        Some(Self {
            host: host.to_string(),
            port: port.parse().ok()?,
        })
    }

    /// Proxy URL usable with `reqwest::Proxy::all`
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Pool of proxy endpoints with a monotonically growing blacklist
pub struct ProxyPool {
    endpoints: Vec<ProxyEndpoint>,
    blacklist: Mutex<HashSet<usize>>,
}

impl ProxyPool {
    /// Build a pool from `host:port` strings, skipping unparsable entries
    #[must_use]
    pub fn new(addrs: &[String]) -> Self {
        let endpoints = addrs
            .iter()
            .filter_map(|s| {
                let parsed = ProxyEndpoint::parse(s);
                if parsed.is_none() {
                    tracing::warn!(addr = %s, "Skipping unparsable proxy endpoint");
                }
                parsed
            })
            .collect();

        Self {
            endpoints,
            blacklist: Mutex::new(HashSet::new()),
        }
    }

    /// True when no endpoints are configured at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Number of endpoints still considered healthy
    #[must_use]
    pub fn healthy_count(&self) -> usize {
        let blacklist = self.blacklist.lock().unwrap();
        self.endpoints.len() - blacklist.len()
    }

    /// Hand out a uniformly-random healthy endpoint
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Exhausted`] once every endpoint has been
    /// blacklisted (or none were configured).
    pub fn acquire(&self) -> Result<ProxyEndpoint, ProxyError> {
        let blacklist = self.blacklist.lock().unwrap();
        let healthy: Vec<usize> = (0..self.endpoints.len())
            .filter(|i| !blacklist.contains(i))
            .collect();
        drop(blacklist);

        let idx = healthy
            .choose(&mut rand::thread_rng())
            .copied()
            .ok_or(ProxyError::Exhausted)?;

        Ok(self.endpoints[idx].clone())
    }

    /// Blacklist an endpoint; idempotent and irreversible within a run
    pub fn mark_bad(&self, endpoint: &ProxyEndpoint) {
        if let Some(idx) = self.endpoints.iter().position(|e| e == endpoint) {
            let mut blacklist = self.blacklist.lock().unwrap();
            if blacklist.insert(idx) {
                tracing::warn!(
                    proxy = %endpoint,
                    remaining = self.endpoints.len() - blacklist.len(),
                    "Proxy blacklisted"
                );
            }
        }
    }
}
