use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("backend returned {0}")]
    Status(reqwest::StatusCode),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
