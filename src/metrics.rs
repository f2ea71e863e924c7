// Lock-free counters for the connection pipeline
use std::sync::atomic::{AtomicU64, Ordering};

static CONNECTIONS_TOTAL: AtomicU64 = AtomicU64::new(0);
static REQUESTS_TOTAL: AtomicU64 = AtomicU64::new(0);
static BLOCKED_TOTAL: AtomicU64 = AtomicU64::new(0);
static TUNNELS_TOTAL: AtomicU64 = AtomicU64::new(0);
static BACKEND_ERRORS: AtomicU64 = AtomicU64::new(0);
static BYTES_IN: AtomicU64 = AtomicU64::new(0);
static BYTES_OUT: AtomicU64 = AtomicU64::new(0);

#[inline]
pub fn inc_connections() { CONNECTIONS_TOTAL.fetch_add(1, Ordering::Relaxed); }

#[inline]
pub fn inc_requests() { REQUESTS_TOTAL.fetch_add(1, Ordering::Relaxed); }

#[inline]
pub fn inc_blocked() { BLOCKED_TOTAL.fetch_add(1, Ordering::Relaxed); }

#[inline]
pub fn inc_tunnels() { TUNNELS_TOTAL.fetch_add(1, Ordering::Relaxed); }

#[inline]
pub fn inc_backend_errors() { BACKEND_ERRORS.fetch_add(1, Ordering::Relaxed); }

#[inline]
pub fn add_bytes_in(n: u64) { BYTES_IN.fetch_add(n, Ordering::Relaxed); }

#[inline]
pub fn add_bytes_out(n: u64) { BYTES_OUT.fetch_add(n, Ordering::Relaxed); }

pub fn connections_total() -> u64 { CONNECTIONS_TOTAL.load(Ordering::Relaxed) }
pub fn requests_total() -> u64 { REQUESTS_TOTAL.load(Ordering::Relaxed) }
pub fn blocked_total() -> u64 { BLOCKED_TOTAL.load(Ordering::Relaxed) }
pub fn bytes_in_total() -> u64 { BYTES_IN.load(Ordering::Relaxed) }
pub fn bytes_out_total() -> u64 { BYTES_OUT.load(Ordering::Relaxed) }

pub fn summary() -> String {
    format!(
        "connections={} requests={} blocked={} tunnels={} backend_errors={} bytes_in={} bytes_out={}",
        connections_total(),
        requests_total(),
        blocked_total(),
        TUNNELS_TOTAL.load(Ordering::Relaxed),
        BACKEND_ERRORS.load(Ordering::Relaxed),
        BYTES_IN.load(Ordering::Relaxed),
        BYTES_OUT.load(Ordering::Relaxed),
    )
}
