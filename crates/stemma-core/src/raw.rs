//! Raw fetch payloads as returned by a [`RelativesSource`] transport.
//!
//! `Option`-presence of a relation list is meaningful: `Some(vec![])` says
//! "loaded, and there are none", `None` says "this class was not part of
//! the response".
//!
//! [`RelativesSource`]: crate::source::RelativesSource

use serde::{Deserialize, Serialize};

use crate::{
  date::PartialDate,
  person::{Gender, PersonId},
  richness::Richness,
};

/// Father and mother, either possibly unknown. The wrapper being present
/// (even with both absent) means the parents class was loaded.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RawParents {
  pub father: Option<PersonId>,
  pub mother: Option<PersonId>,
}

/// One spouse entry, with the marriage facts recorded against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSpouse {
  pub id:                PersonId,
  pub marriage_date:     Option<PartialDate>,
  pub marriage_end_date: Option<PartialDate>,
  pub marriage_location: Option<String>,
}

/// One person as delivered by the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPerson {
  pub id:          PersonId,
  #[serde(default)]
  pub external_id: Option<String>,
  #[serde(default)]
  pub given_name:  Option<String>,
  #[serde(default)]
  pub family_name: Option<String>,
  #[serde(default)]
  pub gender:      Gender,
  #[serde(default)]
  pub birth:       Option<PartialDate>,
  #[serde(default)]
  pub death:       Option<PartialDate>,
  #[serde(default)]
  pub parents:     Option<RawParents>,
  #[serde(default)]
  pub spouses:     Option<Vec<RawSpouse>>,
  #[serde(default)]
  pub children:    Option<Vec<PersonId>>,
  #[serde(default)]
  pub siblings:    Option<Vec<PersonId>>,
}

impl RawPerson {
  /// The relation classes this payload actually carries.
  pub fn richness(&self) -> Richness {
    let mut r = Richness::NONE;
    if self.parents.is_some() {
      r = r | Richness::PARENTS;
    }
    if self.spouses.is_some() {
      r = r | Richness::SPOUSES;
    }
    if self.children.is_some() {
      r = r | Richness::CHILDREN;
    }
    if self.siblings.is_some() {
      r = r | Richness::SIBLINGS;
    }
    r
  }
}

/// A full fetch response: the requested person plus any related people the
/// response happened to include inline (spouse or child sub-records).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBundle {
  pub person:    RawPerson,
  #[serde(default)]
  pub relatives: Vec<RawPerson>,
}

impl RawBundle {
  pub fn new(person: RawPerson) -> Self {
    Self { person, relatives: Vec::new() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn absent_relation_classes_deserialize_as_unloaded() {
    let bundle: RawBundle = serde_json::from_str(
      r#"{
        "person": {
          "id": 7,
          "external_id": "p-7",
          "gender": "female",
          "parents": { "father": 3, "mother": null },
          "spouses": []
        }
      }"#,
    )
    .unwrap();

    let person = &bundle.person;
    assert_eq!(person.id, PersonId(7));
    assert_eq!(person.gender, Gender::Female);

    // `spouses: []` is loaded-and-empty; omitted classes are unloaded.
    assert_eq!(
      person.richness(),
      Richness::PARENTS | Richness::SPOUSES
    );
    assert_eq!(person.parents.unwrap().father, Some(PersonId(3)));
    assert_eq!(person.parents.unwrap().mother, None);
    assert!(person.children.is_none());
    assert!(bundle.relatives.is_empty());
  }
}
