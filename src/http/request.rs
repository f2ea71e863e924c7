// HTTP request parsing, serialization, and header rewriting
use super::{get_hdr, parse_hdr_lines, split_head};

#[derive(Clone)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub version: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Parse a raw request head. Lenient on purpose: header lines without a
    /// colon are skipped, a missing blank-line boundary means an empty body,
    /// and a missing version token defaults to HTTP/1.1. Returns None only
    /// when there is no usable request line at all.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        let (head, body) = split_head(raw);
        let text = String::from_utf8_lossy(head);
        let mut lines = text.lines();
        let rl = lines.next()?;
        let mut p = rl.split_whitespace();
        let method = p.next()?.to_string();
        let path = p.next()?.to_string();
        let version = p.next().unwrap_or("HTTP/1.1").to_string();
        let headers = parse_hdr_lines(lines);
        Some(HttpRequest { method, path, version, headers, body: body.to_vec() })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut o = format!("{} {} {}\r\n", self.method, self.path, self.version);
        for (k, v) in &self.headers {
            o.push_str(k);
            o.push_str(": ");
            o.push_str(v);
            o.push_str("\r\n");
        }
        o.push_str("\r\n");
        let mut b = o.into_bytes();
        b.extend_from_slice(&self.body);
        b
    }

    pub fn get_header(&self, n: &str) -> Option<&str> {
        get_hdr(&self.headers, n)
    }

    /// Remove every occurrence of a header, case-insensitively.
    pub fn remove_header(&mut self, n: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(n));
    }

    /// Rewrite for the proxy-to-backend hop: drop the client-hop headers
    /// and install a single Host naming the backend.
    pub fn rewrite_for_backend(&mut self, backend_host: &str, backend_port: u16) {
        self.remove_header("Host");
        self.remove_header("Referer");
        self.remove_header("Origin");
        self.headers.insert(0, ("Host".to_string(), format!("{backend_host}:{backend_port}")));
    }
}
