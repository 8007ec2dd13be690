//! Error type for `stemma-source-http`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("unexpected status {status} fetching person {id}")]
  Status {
    id:     stemma_core::PersonId,
    status: reqwest::StatusCode,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
