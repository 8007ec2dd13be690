//! Richness — which relation classes have been fetched for a person.
//!
//! A fetch response for a person may populate any subset of the four
//! relation classes. The cache uses richness both as "what do I already
//! have" and as "what does this call require", so a request is a value of
//! the same type as the recorded state.

use serde::{Deserialize, Serialize};

/// A set of relation classes, stored as four bits.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct Richness(u8);

impl Richness {
  pub const NONE: Richness = Richness(0);
  pub const SIBLINGS: Richness = Richness(1 << 0);
  pub const PARENTS: Richness = Richness(1 << 1);
  pub const SPOUSES: Richness = Richness(1 << 2);
  pub const CHILDREN: Richness = Richness(1 << 3);

  /// Parents, spouses, and children — everything a couple node and its
  /// dropdowns need. Siblings are deliberately not part of this threshold.
  pub const FULL: Richness =
    Richness(Self::PARENTS.0 | Self::SPOUSES.0 | Self::CHILDREN.0);

  pub fn contains(self, other: Richness) -> bool {
    self.0 & other.0 == other.0
  }

  /// True when `self` covers at least every class in `other`.
  /// Used to reject embedded sub-records poorer than the cached record.
  pub fn is_same_or_higher(self, other: Richness) -> bool {
    self.contains(other)
  }

  pub fn union(self, other: Richness) -> Richness {
    Richness(self.0 | other.0)
  }

  /// The classes in `other` that `self` is still missing.
  pub fn missing(self, other: Richness) -> Richness {
    Richness(other.0 & !self.0)
  }

  pub fn is_empty(self) -> bool {
    self.0 == 0
  }

  pub fn is_fully_enriched(self) -> bool {
    self.contains(Self::FULL)
  }
}

impl std::ops::BitOr for Richness {
  type Output = Richness;
  fn bitor(self, rhs: Richness) -> Richness {
    self.union(rhs)
  }
}

impl std::fmt::Display for Richness {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut names = Vec::new();
    for (bit, name) in [
      (Self::SIBLINGS, "siblings"),
      (Self::PARENTS, "parents"),
      (Self::SPOUSES, "spouses"),
      (Self::CHILDREN, "children"),
    ] {
      if self.contains(bit) {
        names.push(name);
      }
    }
    write!(f, "{{{}}}", names.join(","))
  }
}
