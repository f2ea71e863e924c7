mod blocklist;
mod colors;
mod config;
mod http;
mod log;
mod metrics;
mod records;
mod registry;
mod server;
mod sink;

fn main() {
    let cfg = config::load_config();
    log::init(cfg.server.logging);
    log::set_level(&cfg.server.log_level);
    let registry = registry::Registry::from_config(&cfg.routes);
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error(&format!("Runtime build failed: {e}"));
            std::process::exit(1);
        }
    };
    let proxy = server::Proxy::new(cfg.server, registry);
    if let Err(e) = rt.block_on(proxy.run()) {
        log::error(&format!("Server failed: {e}"));
        std::process::exit(1);
    }
}
