#![forbid(unsafe_code)]

mod client;
mod error;
mod proxy;
mod session;
mod target;
mod tls;
mod tunnel;

pub use client::HttpClient;
pub use error::{Error, HttpTransportErrorKind, Result};
pub use proxy::{ProxyConfig, ProxyCredentials};
pub use session::{HttpResponse, HttpSession};
pub use target::{Scheme, Target};
