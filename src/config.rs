// Configuration loading, validation, and default generation
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

#[derive(Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: Srv,
    #[serde(default)]
    pub routes: HashMap<String, Route>,
}

#[derive(Deserialize, Clone)]
pub struct Route {
    pub backend: String,
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct Srv {
    pub listen_addr: String,
    pub buffer_size: usize,
    pub connect_timeout: u64,
    pub read_timeout: u64,
    pub blocklist_file: String,
    pub blocklist_reload: u64,
    pub request_log: String,
    pub response_log: String,
    pub flush_threshold: usize,
    pub flush_interval: u64,
    pub log_level: String,
    pub logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config { server: Srv::default(), routes: HashMap::new() }
    }
}

impl Default for Srv {
    fn default() -> Self {
        Srv {
            listen_addr: "127.0.0.1:8080".to_string(),
            buffer_size: 65_536,
            connect_timeout: 10,
            read_timeout: 15,
            blocklist_file: "blocklist.json".to_string(),
            blocklist_reload: 30,
            request_log: "logs/requests.jsonl".to_string(),
            response_log: "logs/responses.jsonl".to_string(),
            flush_threshold: 100,
            flush_interval: 5,
            log_level: "info".to_string(),
            logging: true,
        }
    }
}

impl Srv {
    pub fn validate(&mut self) -> bool {
        let mut valid = true;

        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            crate::log::error(&format!("listen_addr '{}' is not a valid address (expected ip:port)", self.listen_addr));
            valid = false;
        }

        if self.buffer_size < 1024 {
            crate::log::warn(&format!("buffer_size too small ({}), using 1024", self.buffer_size));
            self.buffer_size = 1024;
        }
        if self.connect_timeout == 0 {
            crate::log::warn("connect_timeout is 0, using 10");
            self.connect_timeout = 10;
        }
        if self.read_timeout == 0 {
            crate::log::warn("read_timeout is 0, using 15");
            self.read_timeout = 15;
        }
        if self.blocklist_reload == 0 {
            crate::log::warn("blocklist_reload is 0, using 30");
            self.blocklist_reload = 30;
        }
        if self.flush_threshold == 0 {
            self.flush_threshold = 100;
        }
        if self.flush_interval == 0 {
            self.flush_interval = 5;
        }
        if self.blocklist_file.is_empty() {
            crate::log::error("blocklist_file must not be empty");
            valid = false;
        }
        if self.request_log.is_empty() || self.response_log.is_empty() {
            crate::log::error("request_log and response_log must not be empty");
            valid = false;
        }

        valid
    }
}

fn atomic_write(path: &str, content: &str) -> std::io::Result<()> {
    let tmp = format!("{path}.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn load_config() -> Config {
    let p = path();
    let mut cfg = match fs::read_to_string(&p) {
        Ok(txt) => match toml::from_str(&txt) {
            Ok(c) => {
                crate::log::info(&format!("Loaded {p}"));
                c
            }
            Err(e) => {
                crate::log::error(&format!("Parse error {p}: {e}"));
                crate::log::warn("Using defaults");
                Config::default()
            }
        },
        Err(_) => {
            let cfg = Config::default();
            let content = generate_config(&cfg);
            if atomic_write(&p, &content).is_ok() {
                crate::log::info(&format!("Generated {p}"));
            } else {
                crate::log::warn(&format!("No config at '{p}', using defaults"));
            }
            cfg
        }
    };
    if !cfg.server.validate() {
        if cfg.server.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            let fallback = "127.0.0.1:8080";
            crate::log::warn(&format!("listen_addr invalid, using {fallback}"));
            cfg.server.listen_addr = fallback.to_string();
        }
        let defaults = Srv::default();
        if cfg.server.blocklist_file.is_empty() {
            cfg.server.blocklist_file = defaults.blocklist_file;
        }
        if cfg.server.request_log.is_empty() {
            cfg.server.request_log = defaults.request_log;
        }
        if cfg.server.response_log.is_empty() {
            cfg.server.response_log = defaults.response_log;
        }
    }
    if cfg.routes.is_empty() {
        crate::log::warn("No [routes] configured; every request will get 502 No backend found");
    }
    cfg
}

fn generate_config(cfg: &Config) -> String {
    let mut doc = toml::Table::new();
    let mut srv = toml::Table::new();
    srv.insert("listen_addr".into(), toml::Value::String(cfg.server.listen_addr.clone()));
    srv.insert("buffer_size".into(), toml::Value::Integer(cfg.server.buffer_size as i64));
    srv.insert("connect_timeout".into(), toml::Value::Integer(cfg.server.connect_timeout as i64));
    srv.insert("read_timeout".into(), toml::Value::Integer(cfg.server.read_timeout as i64));
    srv.insert("blocklist_file".into(), toml::Value::String(cfg.server.blocklist_file.clone()));
    srv.insert("blocklist_reload".into(), toml::Value::Integer(cfg.server.blocklist_reload as i64));
    srv.insert("request_log".into(), toml::Value::String(cfg.server.request_log.clone()));
    srv.insert("response_log".into(), toml::Value::String(cfg.server.response_log.clone()));
    srv.insert("flush_threshold".into(), toml::Value::Integer(cfg.server.flush_threshold as i64));
    srv.insert("flush_interval".into(), toml::Value::Integer(cfg.server.flush_interval as i64));
    srv.insert("log_level".into(), toml::Value::String(cfg.server.log_level.clone()));
    srv.insert("logging".into(), toml::Value::Boolean(cfg.server.logging));
    doc.insert("server".into(), toml::Value::Table(srv));
    let mut routes = toml::Table::new();
    for (host, route) in &cfg.routes {
        let mut r = toml::Table::new();
        r.insert("backend".into(), toml::Value::String(route.backend.clone()));
        routes.insert(host.clone(), toml::Value::Table(r));
    }
    doc.insert("routes".into(), toml::Value::Table(routes));
    match toml::to_string_pretty(&doc) {
        Ok(s) => s,
        Err(e) => {
            crate::log::error(&format!("Config serialization failed: {e}"));
            String::new()
        }
    }
}

fn path() -> String {
    let args: Vec<String> = std::env::args().collect();
    args.windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| w[1].clone())
        .unwrap_or_else(|| "config.toml".to_string())
}
