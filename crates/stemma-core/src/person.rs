//! `PersonRecord` — the mutable, progressively-enriched record for one
//! individual.
//!
//! A record is created either by a fetch or as a bare stub when another
//! record's relation list mentions an id the cache has not seen. It is
//! upgraded in place as richer data arrives and never deleted during a
//! session; between re-layouts only generation/visibility metadata is reset.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
  date::PartialDate,
  raw::RawPerson,
  richness::Richness,
};

/// Stable integer identity assigned by the data source. Never reused for a
/// different individual within one cache.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct PersonId(pub i64);

impl std::fmt::Display for PersonId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
  Male,
  Female,
  #[default]
  Unknown,
}

/// Facts about one marriage, keyed by the spouse's id on the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarriageInfo {
  pub date:     PartialDate,
  pub end_date: PartialDate,
  pub location: Option<String>,
}

/// One individual and their known relationships, tagged with the richness
/// level the fetches so far have reached.
///
/// `children_ids` / `spouse_ids` / `sibling_ids` being `Some`, even if
/// empty, is the sole signal that that relation class has been loaded.
/// `None` means "not yet fetched", never "none exist".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRecord {
  pub id:          PersonId,
  /// The data source's external stable identifier (e.g. a site permalink
  /// token), used by highlight queries coming from the rendering layer.
  pub external_id: Option<String>,
  pub given_name:  Option<String>,
  pub family_name: Option<String>,
  pub gender:      Gender,
  pub birth:       PartialDate,
  pub death:       PartialDate,

  pub father_id: Option<PersonId>,
  pub mother_id: Option<PersonId>,

  pub children_ids: Option<Vec<PersonId>>,
  pub spouse_ids:   Option<Vec<PersonId>>,
  pub sibling_ids:  Option<Vec<PersonId>>,

  /// The spouse currently shown alongside this person, when the user has
  /// picked one explicitly. Defaults to the earliest marriage otherwise.
  pub preferred_spouse_id: Option<PersonId>,
  pub marriages:           HashMap<PersonId, MarriageInfo>,

  pub richness: Richness,

  /// Generation numbers at which this person currently occurs in the
  /// materialized tree. More than one entry means the person is a
  /// duplicate (pedigree collapse or remarriage).
  pub generations: Vec<i32>,

  /// How many further tree generations exist beyond this person — the
  /// subtree depth a collapsed node stands for. Recomputed per layout.
  pub nr_older_generations: i32,

  pub brick_wall:          bool,
  pub marked_as_duplicate: bool,
}

impl PersonRecord {
  /// A record holding nothing but its identity. Registered when another
  /// record's relation list mentions an id the cache has not seen yet.
  pub fn stub(id: PersonId) -> Self {
    Self {
      id,
      external_id: None,
      given_name: None,
      family_name: None,
      gender: Gender::default(),
      birth: PartialDate::blank(),
      death: PartialDate::blank(),
      father_id: None,
      mother_id: None,
      children_ids: None,
      spouse_ids: None,
      sibling_ids: None,
      preferred_spouse_id: None,
      marriages: HashMap::new(),
      richness: Richness::NONE,
      generations: Vec::new(),
      nr_older_generations: 0,
      brick_wall: false,
      marked_as_duplicate: false,
    }
  }

  pub fn is_fully_enriched(&self) -> bool {
    self.richness.is_fully_enriched()
  }

  /// Merge a fetch payload into this record.
  ///
  /// Only relation classes present in `raw` are touched, so richness is
  /// monotonically non-decreasing by construction: an absent class in the
  /// payload never clears previously-loaded data. Scalar fields are filled
  /// in whenever the payload carries them.
  pub fn merge_raw(&mut self, raw: &RawPerson) {
    debug_assert_eq!(self.id, raw.id, "merge across distinct identities");

    if let Some(ext) = &raw.external_id {
      self.external_id = Some(ext.clone());
    }
    if let Some(name) = &raw.given_name {
      self.given_name = Some(name.clone());
    }
    if let Some(name) = &raw.family_name {
      self.family_name = Some(name.clone());
    }
    if raw.gender != Gender::Unknown {
      self.gender = raw.gender;
    }
    if let Some(birth) = raw.birth {
      self.birth = birth;
    }
    if let Some(death) = raw.death {
      self.death = death;
    }

    if let Some(parents) = &raw.parents {
      self.father_id = parents.father;
      self.mother_id = parents.mother;
      self.richness = self.richness | Richness::PARENTS;
    }

    if let Some(spouses) = &raw.spouses {
      let mut ids = Vec::with_capacity(spouses.len());
      for spouse in spouses {
        ids.push(spouse.id);
        self.marriages.insert(spouse.id, MarriageInfo {
          date:     spouse.marriage_date.unwrap_or_default(),
          end_date: spouse.marriage_end_date.unwrap_or_default(),
          location: spouse.marriage_location.clone(),
        });
      }
      self.spouse_ids = Some(ids);
      self.richness = self.richness | Richness::SPOUSES;
    }

    if let Some(children) = &raw.children {
      self.children_ids = Some(children.clone());
      self.richness = self.richness | Richness::CHILDREN;
    }

    if let Some(siblings) = &raw.siblings {
      self.sibling_ids = Some(siblings.clone());
      self.richness = self.richness | Richness::SIBLINGS;
    }
  }

  /// The spouse to pair this person with when no partner was requested:
  /// the explicitly preferred spouse if set, else the earliest marriage.
  pub fn preferred_spouse(&self) -> Option<PersonId> {
    if let Some(preferred) = self.preferred_spouse_id {
      return Some(preferred);
    }
    let spouses = self.spouse_ids.as_deref()?;
    spouses
      .iter()
      .copied()
      .min_by_key(|id| {
        self
          .marriages
          .get(id)
          .map(|m| m.date)
          .unwrap_or_default()
      })
  }

  /// All ids this record references, for stub registration by the cache.
  pub fn referenced_ids(&self) -> Vec<PersonId> {
    let mut ids = Vec::new();
    ids.extend(self.father_id);
    ids.extend(self.mother_id);
    if let Some(spouses) = &self.spouse_ids {
      ids.extend(spouses.iter().copied());
    }
    if let Some(children) = &self.children_ids {
      ids.extend(children.iter().copied());
    }
    if let Some(siblings) = &self.sibling_ids {
      ids.extend(siblings.iter().copied());
    }
    ids
  }

  pub fn record_generation(&mut self, generation: i32) {
    self.generations.push(generation);
  }

  pub fn lowest_generation(&self) -> Option<i32> {
    self.generations.iter().copied().min()
  }

  /// Clear everything a re-layout recomputes. Fetched data is untouched.
  pub fn reset_layout_state(&mut self) {
    self.generations.clear();
    self.nr_older_generations = 0;
    self.brick_wall = false;
    self.marked_as_duplicate = false;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::raw::{RawParents, RawSpouse};

  fn raw(id: i64) -> RawPerson {
    RawPerson {
      id: PersonId(id),
      external_id: None,
      given_name: None,
      family_name: None,
      gender: Gender::Unknown,
      birth: None,
      death: None,
      parents: None,
      spouses: None,
      children: None,
      siblings: None,
    }
  }

  #[test]
  fn merge_is_monotonic() {
    let mut p = PersonRecord::stub(PersonId(1));

    let mut first = raw(1);
    first.parents = Some(RawParents {
      father: Some(PersonId(2)),
      mother: Some(PersonId(3)),
    });
    first.children = Some(vec![PersonId(4)]);
    p.merge_raw(&first);
    assert!(p.richness.contains(Richness::PARENTS | Richness::CHILDREN));

    // A later payload that omits parents and children must not clear them.
    let mut second = raw(1);
    second.spouses = Some(vec![]);
    p.merge_raw(&second);

    assert_eq!(p.father_id, Some(PersonId(2)));
    assert_eq!(p.children_ids.as_deref(), Some(&[PersonId(4)][..]));
    assert!(p.richness.contains(
      Richness::PARENTS | Richness::CHILDREN | Richness::SPOUSES
    ));
  }

  #[test]
  fn empty_spouse_list_counts_as_loaded() {
    let mut p = PersonRecord::stub(PersonId(1));
    let mut payload = raw(1);
    payload.spouses = Some(vec![]);
    p.merge_raw(&payload);

    assert_eq!(p.spouse_ids.as_deref(), Some(&[][..]));
    assert!(p.richness.contains(Richness::SPOUSES));
    assert_eq!(p.preferred_spouse(), None);
  }

  #[test]
  fn preferred_spouse_is_earliest_marriage() {
    let mut p = PersonRecord::stub(PersonId(1));
    let mut payload = raw(1);
    payload.spouses = Some(vec![
      RawSpouse {
        id: PersonId(10),
        marriage_date: Some(PartialDate {
          year: Some(1920),
          ..Default::default()
        }),
        marriage_end_date: None,
        marriage_location: None,
      },
      RawSpouse {
        id: PersonId(11),
        marriage_date: Some(PartialDate {
          year: Some(1902),
          ..Default::default()
        }),
        marriage_end_date: None,
        marriage_location: None,
      },
    ]);
    p.merge_raw(&payload);
    assert_eq!(p.preferred_spouse(), Some(PersonId(11)));

    // An explicit choice wins over the marriage-date default.
    p.preferred_spouse_id = Some(PersonId(10));
    assert_eq!(p.preferred_spouse(), Some(PersonId(10)));
  }

  #[test]
  fn reset_layout_state_keeps_fetched_data() {
    let mut p = PersonRecord::stub(PersonId(1));
    let mut payload = raw(1);
    payload.children = Some(vec![PersonId(2)]);
    p.merge_raw(&payload);

    p.record_generation(3);
    p.record_generation(5);
    p.marked_as_duplicate = true;
    p.reset_layout_state();

    assert!(p.generations.is_empty());
    assert!(!p.marked_as_duplicate);
    assert!(p.richness.contains(Richness::CHILDREN));
  }
}
