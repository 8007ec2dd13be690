//! Error types shared across the Stemma crates.

use thiserror::Error;

use crate::person::PersonId;

#[derive(Debug, Error)]
pub enum Error {
  /// The transport failed while fetching data for a person. Recoverable;
  /// cache state is unaffected.
  #[error("fetch failed for person {id}: {source}")]
  Fetch {
    id:     PersonId,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// A person was found on their own ancestor (or descendant) path — a
  /// data-integrity error in the source, not ordinary pedigree collapse.
  #[error("cycle detected: person {0} is their own ancestor or descendant")]
  CycleDetected(PersonId),

  /// A mutating operation was requested in a state that does not permit it.
  /// Reported and logged; the target is left unchanged.
  #[error("invalid operation: {0}")]
  InvalidOperation(String),

  /// Expand was requested for a node whose in-focus person already has all
  /// displayable relation classes loaded.
  #[error("person {0} is already fully enriched")]
  AlreadyEnriched(PersonId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
