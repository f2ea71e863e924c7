// Host-header routing table, loaded once at startup
use std::collections::HashMap;

use crate::config::Route;

#[derive(Clone, PartialEq, Debug)]
pub struct BackendTarget {
    pub host: String,
    pub port: u16,
}

impl BackendTarget {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub struct Registry {
    routes: HashMap<String, BackendTarget>,
}

impl Registry {
    /// Build the lookup table from config. Malformed backend URLs are
    /// skipped with a warning; a bad entry never fails startup.
    pub fn from_config(routes: &HashMap<String, Route>) -> Self {
        let mut table = HashMap::new();
        for (host, route) in routes {
            match parse_backend_url(&route.backend) {
                Some(target) => {
                    table.insert(host.trim().to_lowercase(), target);
                }
                None => {
                    crate::log::warn(&format!(
                        "Invalid backend for host {host}: {}", route.backend
                    ));
                }
            }
        }
        crate::log::info(&format!("Loaded routing table: {} route(s)", table.len()));
        Registry { routes: table }
    }

    /// Resolve a Host header to a backend. The header value is trimmed,
    /// stripped of any `:port` suffix, and lowercased before lookup.
    pub fn resolve(&self, host_header: &str) -> Option<BackendTarget> {
        let mut host = host_header.trim();
        if let Some((h, _)) = host.split_once(':') {
            host = h;
        }
        self.routes.get(&host.to_lowercase()).cloned()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }
}

/// Parse a backend URL of the form `http://host:port` or `https://host:port`.
fn parse_backend_url(url: &str) -> Option<BackendTarget> {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))?;
    let (host, port) = rest.split_once(':')?;
    if host.is_empty() { return None; }
    let port: u16 = port.trim_end_matches('/').parse().ok()?;
    Some(BackendTarget { host: host.to_string(), port })
}
