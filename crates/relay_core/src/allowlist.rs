use url::Url;

/// Hosts the relay is willing to contact on behalf of a client.
///
/// Mirrors the fixed set of model/dataset mirrors the dashboard downloads
/// from. Matching is exact or by subdomain suffix, so `huggingface.co`
/// also admits `cdn-lfs.huggingface.co`.
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &[
    "huggingface.co",
    "cdn.huggingface.co",
    "cdn-lfs.huggingface.co",
    "cdn-lfs-us-1.huggingface.co",
    "cdn-lfs-eu-1.huggingface.co",
    "github.com",
    "raw.githubusercontent.com",
    "objects.githubusercontent.com",
    "storage.googleapis.com",
    "download.tensorflow.org",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    hosts: Vec<String>,
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_HOSTS.iter().map(|host| host.to_string()))
    }
}

impl AllowList {
    pub fn new(hosts: impl IntoIterator<Item = String>) -> Self {
        Self {
            hosts: hosts.into_iter().map(|h| h.to_ascii_lowercase()).collect(),
        }
    }

    /// Default hosts plus operator-configured extras.
    pub fn with_extra_hosts(extra: impl IntoIterator<Item = String>) -> Self {
        let mut list = Self::default();
        list.hosts
            .extend(extra.into_iter().map(|h| h.to_ascii_lowercase()));
        list
    }

    /// Checks a raw, possibly malformed URL string. Anything that does not
    /// parse is treated as disallowed.
    pub fn is_allowed(&self, raw: &str) -> bool {
        match Url::parse(raw.trim()) {
            Ok(url) => self.is_url_allowed(&url),
            Err(_) => false,
        }
    }

    pub fn is_url_allowed(&self, url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.hosts.iter().any(|allowed| {
            host == *allowed
                || host
                    .strip_suffix(allowed.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}
