use url::Url;
use zephyr_domain::{Result, ZephyrError};

/// Whether plain-HTTP targets may be contacted
///
/// `RequireHttps` is the default; `AllowInsecure` exists for local
/// development servers and test doubles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportPolicy {
    #[default]
    RequireHttps,
    AllowInsecure,
}

impl TransportPolicy {
    /// Reject `url` before any I/O when the policy forbids its scheme.
    ///
    /// # Errors
    /// Returns `ZephyrError::InsecureTransport` for a non-`https` URL under
    /// `RequireHttps`.
    pub fn check(self, url: &Url) -> Result<()> {
        match self {
            Self::AllowInsecure => Ok(()),
            Self::RequireHttps if url.scheme() == "https" => Ok(()),
            Self::RequireHttps => Err(ZephyrError::InsecureTransport(redacted(url))),
        }
    }
}

/// `scheme://host/path` without query or fragment, for errors and logs.
pub(crate) fn redacted(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    let _ = url.set_password(None);
    url.to_string()
}
