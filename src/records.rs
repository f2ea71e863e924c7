// Structured request/response records for the append-only logs
use serde::ser::{Serialize, SerializeMap, Serializer};
use uuid::Uuid;

use crate::http::{HttpRequest, HttpResponse};

/// Order-preserving header map. Serializes as a JSON object with entries
/// in arrival order, duplicates included.
pub struct HeaderMap(pub Vec<(String, String)>);

impl Serialize for HeaderMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[derive(serde::Serialize)]
pub struct RequestRecord {
    pub id: String,
    pub timestamp: String,
    pub client_ip: String,
    pub host: String,
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl RequestRecord {
    pub fn new(id: Uuid, client_ip: &str, req: &HttpRequest) -> Self {
        RequestRecord {
            id: id.to_string(),
            timestamp: crate::log::utc_now(),
            client_ip: client_ip.to_string(),
            host: req.get_header("Host").unwrap_or("").to_string(),
            method: req.method.clone(),
            path: req.path.clone(),
            headers: HeaderMap(req.headers.clone()),
            body: String::from_utf8_lossy(&req.body).into_owned(),
        }
    }
}

/// Response-side record: status line and headers only. The body is not
/// recorded; it may be arbitrarily large and is already on its way to
/// the client.
#[derive(serde::Serialize)]
pub struct ResponseRecord {
    pub id: String,
    pub timestamp: String,
    pub status_line: String,
    pub headers: HeaderMap,
}

impl ResponseRecord {
    pub fn new(id: Uuid, resp: &HttpResponse) -> Self {
        ResponseRecord {
            id: id.to_string(),
            timestamp: crate::log::utc_now(),
            status_line: resp.status_line.clone(),
            headers: HeaderMap(resp.headers.clone()),
        }
    }
}
