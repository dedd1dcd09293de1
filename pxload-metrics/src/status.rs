use std::fmt;

/// Label used for failures that never produced an HTTP status.
pub const TRANSPORT_ERROR_LABEL: &str = "request-timeout/error";

/// Key of the failure tally.
///
/// Ordering puts real status codes first (ascending) and the transport bucket last,
/// which is also the order reports render them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusKey {
    /// Transport succeeded but the status was outside 2xx.
    Http(u16),

    /// Connect failures, per-request timeouts, proxy rejections and similar errors.
    TransportError,
}

impl StatusKey {
    #[must_use]
    pub fn is_transport_error(self) -> bool {
        matches!(self, Self::TransportError)
    }

    #[must_use]
    pub fn status_code(self) -> Option<u16> {
        match self {
            Self::Http(code) => Some(code),
            Self::TransportError => None,
        }
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(code) => write!(f, "{code}"),
            Self::TransportError => f.write_str(TRANSPORT_ERROR_LABEL),
        }
    }
}
