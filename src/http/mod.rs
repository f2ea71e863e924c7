// HTTP head parsing and serialization
mod request;
mod response;
pub use request::HttpRequest;
pub use response::HttpResponse;

pub fn find_hdr_end(d: &[u8]) -> Option<usize> {
    if d.len() < 4 { return None; }
    for i in 0..=(d.len() - 4) {
        if &d[i..i + 4] == b"\r\n\r\n" { return Some(i); }
    }
    None
}

/// Split a raw message at the first blank line. A message without the
/// blank-line boundary is all head and no body.
pub fn split_head(d: &[u8]) -> (&[u8], &[u8]) {
    match find_hdr_end(d) {
        Some(p) => (&d[..p], &d[p + 4..]),
        None => (d, &[]),
    }
}

/// First-wins, case-insensitive header lookup over an order-preserving list.
pub fn get_hdr<'a>(h: &'a [(String, String)], n: &str) -> Option<&'a str> {
    for (k, v) in h {
        if k.eq_ignore_ascii_case(n) { return Some(v.as_str()); }
    }
    None
}

pub fn parse_hdr_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<(String, String)> {
    let mut h = Vec::new();
    for ln in lines {
        if ln.is_empty() { continue; }
        if let Some((k, v)) = ln.split_once(':') {
            h.push((k.trim().to_string(), v.trim().to_string()));
        }
    }
    h
}

/// Case-insensitive substring scan for an `Upgrade: websocket` header,
/// run on the raw bytes before any parsing.
pub fn is_websocket_upgrade(raw: &[u8]) -> bool {
    let needle = b"upgrade: websocket";
    if raw.len() < needle.len() { return false; }
    raw.windows(needle.len())
        .any(|w| w.eq_ignore_ascii_case(needle))
}
