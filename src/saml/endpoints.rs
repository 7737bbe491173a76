use url::Url;

/// Turns a raw endpoint reference from a tenant record into a callback URL.
pub trait EndpointResolver: Send + Sync {
    /// Resolve `raw`, adding the `key=value[&key=value]` pairs in `extra_query`.
    ///
    /// With `force_absolute` the result includes scheme and host; otherwise
    /// only path and query are returned.
    fn resolve(&self, raw: &str, extra_query: Option<&str>, force_absolute: bool) -> String;
}

#[derive(Debug, thiserror::Error)]
pub enum PageLinkError {
    #[error("Invalid base URL '{0}': {1}")]
    InvalidBaseUrl(String, url::ParseError),

    #[error("Base URL must use http or https: {0}")]
    UnsupportedScheme(String),
}

/// Builds callback URLs for page references against a site base URL.
///
/// Accepted references:
/// - a numeric page id (`"123"`) or a page link (`"t3://page?uid=123"`),
///   linked as `<base>?id=123`; other link parameters such as `L=1` follow
///   the id
/// - an absolute http(s) URL, kept as is
/// - anything else is joined to the base URL as a relative path
#[derive(Debug, Clone)]
pub struct PageLinkBuilder {
    base: Url,
}

impl PageLinkBuilder {
    pub fn new(base_url: &str) -> Result<Self, PageLinkError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| PageLinkError::InvalidBaseUrl(base_url.to_string(), e))?;

        if !matches!(base.scheme(), "http" | "https") || base.host_str().is_none() {
            return Err(PageLinkError::UnsupportedScheme(base_url.to_string()));
        }

        // Relative joins must stay below the base path
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self { base })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    fn target(&self, raw: &str) -> Option<Url> {
        if let Some(page) = page_link(raw) {
            let mut url = self.base.clone();
            {
                let mut pairs = url.query_pairs_mut();
                pairs.append_pair("id", &page.id.to_string());
                for (key, value) in &page.params {
                    pairs.append_pair(key, value);
                }
            }
            return Some(url);
        }

        if let Ok(url) = Url::parse(raw) {
            return matches!(url.scheme(), "http" | "https").then_some(url);
        }

        self.base.join(raw.trim_start_matches('/')).ok()
    }
}

impl EndpointResolver for PageLinkBuilder {
    fn resolve(&self, raw: &str, extra_query: Option<&str>, force_absolute: bool) -> String {
        let raw = raw.trim();

        let Some(mut url) = self.target(raw) else {
            tracing::warn!(reference = %raw, "Cannot build link for page reference, using it unresolved");
            return unresolved(raw, extra_query);
        };

        if let Some(extra) = extra_query {
            let mut pairs = url.query_pairs_mut();
            for pair in extra.split('&').filter(|p| !p.is_empty()) {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                pairs.append_pair(key, value);
            }
        }

        if force_absolute {
            url.to_string()
        } else {
            match url.query() {
                Some(query) => format!("{}?{}", url.path(), query),
                None => url.path().to_string(),
            }
        }
    }
}

/// Raw reference with the extra query appended, used when no link can be built.
pub(crate) fn unresolved(raw: &str, extra_query: Option<&str>) -> String {
    match extra_query {
        Some(extra) => format!("{}&{}", raw, extra),
        None => raw.to_string(),
    }
}

/// A page reference: the page id plus any other link parameters, in order.
struct PageLink {
    id: u64,
    params: Vec<(String, String)>,
}

/// Parse a numeric page id or a `t3://page?uid=N[&key=value...]` link.
fn page_link(raw: &str) -> Option<PageLink> {
    if let Ok(id) = raw.parse::<u64>() {
        return Some(PageLink {
            id,
            params: Vec::new(),
        });
    }

    let url = Url::parse(raw).ok()?;
    if url.scheme() != "t3" || url.host_str() != Some("page") {
        return None;
    }

    let mut id = None;
    let mut params = Vec::new();
    for (key, value) in url.query_pairs() {
        if key == "uid" {
            id = Some(value.parse().ok()?);
        } else {
            params.push((key.into_owned(), value.into_owned()));
        }
    }

    Some(PageLink { id: id?, params })
}
