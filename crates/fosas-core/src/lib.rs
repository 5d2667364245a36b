pub mod api;
pub mod filter;
pub mod record;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FosasError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected payload: {0}")]
    Decode(#[from] serde_json::Error),
}
