use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("remote call failed: {0}")]
    Remote(Box<dyn std::error::Error + Send + Sync>),
    #[error("remote call timed out")]
    Timeout,
}

impl Error {
    pub fn remote(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Remote(Box::new(e))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
