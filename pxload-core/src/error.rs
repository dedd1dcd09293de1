use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("transport setup failed: {0}")]
    Http(#[from] pxload_http::Error),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}
