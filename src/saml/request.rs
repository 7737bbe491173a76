use http::{HeaderMap, header::HOST, request::Parts};

/// Source of the host of the request being served.
///
/// Lets the configuration resolver fall back to the current request when the
/// caller does not name a host.
pub trait RequestContext: Send + Sync {
    /// The request host as sent by the client, port included if present.
    fn host(&self) -> Option<String>;
}

impl RequestContext for HeaderMap {
    fn host(&self) -> Option<String> {
        self.get(HOST)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .map(String::from)
    }
}

impl RequestContext for Parts {
    /// Prefers the `Host` header, falling back to the URI authority (HTTP/2).
    fn host(&self) -> Option<String> {
        self.headers
            .host()
            .or_else(|| self.uri.authority().map(|a| a.as_str().to_string()))
    }
}
