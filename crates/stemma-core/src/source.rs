//! The `RelativesSource` trait — the injected fetch transport.
//!
//! Implemented by transport backends (e.g. `stemma-source-http`, or an
//! in-memory double in tests). The tree layer depends on this abstraction,
//! never on a concrete transport.

use std::future::Future;

use crate::{person::PersonId, raw::RawBundle, richness::Richness};

/// Abstraction over the remote genealogical data source.
///
/// A fetch asks for one person with a requested set of relation classes.
/// The response may additionally include inline sub-records for directly
/// related people; callers merge whatever arrives.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait RelativesSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch `id`, requesting at least the relation classes in `relations`.
  /// The transport may return more than asked for; never less without
  /// failing.
  fn fetch(
    &self,
    id: PersonId,
    relations: Richness,
  ) -> impl Future<Output = Result<RawBundle, Self::Error>> + Send + '_;
}
