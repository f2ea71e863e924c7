// HTTP response parsing and fixed proxy-generated replies
use super::{get_hdr, parse_hdr_lines, split_head};

#[derive(Clone)]
pub struct HttpResponse {
    pub status_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Parse a raw response head, as lenient as the request side. The status
    /// line is kept whole; it is recorded, never interpreted.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        let (head, body) = split_head(raw);
        let text = String::from_utf8_lossy(head);
        let mut lines = text.lines();
        let status_line = lines.next()?.to_string();
        if status_line.is_empty() { return None; }
        let headers = parse_hdr_lines(lines);
        Some(HttpResponse { status_line, headers, body: body.to_vec() })
    }

    pub fn get_header(&self, n: &str) -> Option<&str> {
        get_hdr(&self.headers, n)
    }

    /// One of the four fixed proxy-generated replies: a bare status line,
    /// blank line, and body. No headers.
    pub fn proxy_error(code: u16, body: &str) -> Vec<u8> {
        let reason = match code {
            403 => "Forbidden",
            502 => "Bad Gateway",
            504 => "Gateway Timeout",
            _ => "Error",
        };
        format!("HTTP/1.1 {code} {reason}\r\n\r\n{body}").into_bytes()
    }
}
