use thiserror::Error;

#[derive(Error, Debug)]
pub enum HetznerError {
    #[error("invalid api token")]
    InvalidToken,

    #[error("request to hetzner cloud failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("hetzner cloud returned {status}: {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
}
