//! A reqwest-backed [`RelativesSource`] for JSON person endpoints.
//!
//! Expects a data source exposing `GET {base_url}/persons/{id}` with a
//! comma-separated `relations` query parameter naming the relation classes
//! to populate, returning a [`RawBundle`] as JSON. Auth, retry policy, and
//! rate limiting are the deployment's concern.

pub mod error;

use std::time::Duration;

use stemma_core::{
  person::PersonId,
  raw::RawBundle,
  richness::Richness,
  source::RelativesSource,
};

pub use error::Error;
use error::Result;

/// Connection settings for the person endpoint.
#[derive(Debug, Clone)]
pub struct SourceConfig {
  pub base_url: String,
  /// Per-request timeout; fetches hang on slow genealogy backends
  /// otherwise.
  pub timeout: Duration,
}

impl SourceConfig {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into(),
      timeout:  Duration::from_secs(30),
    }
  }
}

/// Async HTTP implementation of [`RelativesSource`].
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpSource {
  client: reqwest::Client,
  config: SourceConfig,
}

impl HttpSource {
  pub fn new(config: SourceConfig) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(config.timeout)
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, id: PersonId) -> String {
    format!(
      "{}/persons/{id}",
      self.config.base_url.trim_end_matches('/')
    )
  }

  /// The `relations` query value: the requested classes by name.
  fn relations_param(relations: Richness) -> String {
    let mut names = Vec::new();
    for (class, name) in [
      (Richness::PARENTS, "parents"),
      (Richness::SPOUSES, "spouses"),
      (Richness::CHILDREN, "children"),
      (Richness::SIBLINGS, "siblings"),
    ] {
      if relations.contains(class) {
        names.push(name);
      }
    }
    names.join(",")
  }
}

impl RelativesSource for HttpSource {
  type Error = Error;

  async fn fetch(
    &self,
    id: PersonId,
    relations: Richness,
  ) -> Result<RawBundle> {
    tracing::debug!(%id, %relations, "GET person");
    let resp = self
      .client
      .get(self.url(id))
      .query(&[("relations", Self::relations_param(relations))])
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(Error::Status { id, status: resp.status() });
    }
    Ok(resp.json().await?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn relations_param_names_requested_classes() {
    let param =
      HttpSource::relations_param(Richness::SPOUSES | Richness::CHILDREN);
    assert_eq!(param, "spouses,children");
    assert_eq!(HttpSource::relations_param(Richness::NONE), "");
  }
}
