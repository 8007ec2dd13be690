//! [`Couple`] — a tree node pairing zero, one, or two person records.
//!
//! Many couples may reference the same [`PersonRecord`] (pedigree collapse,
//! remarriage); records never reference couples back. A couple owns the
//! collapse/expand state for its joint-child set and a focus flag naming
//! the member of primary interest.
//!
//! [`PersonRecord`]: stemma_core::person::PersonRecord

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use stemma_core::{
  Error, Result,
  person::{Gender, PersonId},
  richness::Richness,
  source::RelativesSource,
};

use crate::cache::PersonCache;

/// Which way the tree grows from its root.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  Ancestors,
  Descendants,
}

/// Names one of the two slots of a couple.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
  A,
  B,
}

impl Slot {
  pub fn other(self) -> Slot {
    match self {
      Slot::A => Slot::B,
      Slot::B => Slot::A,
    }
  }
}

/// What occupies a couple slot. "Unknown" and "known to be absent" are
/// distinct states, so a plain `Option<PersonId>` is not enough.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SlotRef {
  /// Nothing known about this slot yet.
  Empty,
  /// The other member is known to have no spouse here.
  NoSpouse,
  Person(PersonId),
}

impl SlotRef {
  pub fn person(self) -> Option<PersonId> {
    match self {
      SlotRef::Person(id) => Some(id),
      _ => None,
    }
  }

  /// Key fragment used in semantic/structural identifiers.
  fn key(self) -> String {
    match self {
      SlotRef::Empty => "-".to_string(),
      SlotRef::NoSpouse => "x".to_string(),
      SlotRef::Person(id) => id.to_string(),
    }
  }
}

/// A tree node. `structural_id` is unique per occurrence in the tree;
/// `semantic_id` is shared by every occurrence of the same pairing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Couple {
  slot_a:  SlotRef,
  slot_b:  SlotRef,
  focus:   Slot,
  is_root: bool,
  /// Structural id of the parent node; absent on the root. Kept so the
  /// structural id can be rebuilt when a slot changes.
  prefix:        Option<String>,
  structural_id: String,
  /// The couple's full joint-child set, in derivation order.
  children:  Vec<PersonId>,
  /// The currently-hidden subset of `children`. Everything in `children`
  /// but not in here is shown.
  collapsed: HashSet<PersonId>,
}

impl Couple {
  /// Build a tree root around `person`, with `partner` beside them.
  pub fn new_root<S: RelativesSource>(
    person: PersonId,
    partner: SlotRef,
    cache: &PersonCache<S>,
  ) -> Self {
    Self::build(None, SlotRef::Person(person), partner, Slot::A, true, cache)
  }

  /// Build a non-root node under the node identified by `prefix`.
  pub fn derived<S: RelativesSource>(
    prefix: &str,
    slot_a: SlotRef,
    slot_b: SlotRef,
    focus: Slot,
    cache: &PersonCache<S>,
  ) -> Self {
    Self::build(Some(prefix), slot_a, slot_b, focus, false, cache)
  }

  fn build<S: RelativesSource>(
    prefix: Option<&str>,
    slot_a: SlotRef,
    slot_b: SlotRef,
    focus: Slot,
    is_root: bool,
    cache: &PersonCache<S>,
  ) -> Self {
    let mut couple = Self {
      slot_a,
      slot_b,
      focus,
      is_root,
      prefix: prefix.map(str::to_string),
      structural_id: String::new(),
      children: Vec::new(),
      collapsed: HashSet::new(),
    };
    couple.canonicalize(cache);
    couple.rebuild_structural_id();
    couple.compute_joint_children(cache);
    couple
  }

  fn rebuild_structural_id(&mut self) {
    self.structural_id = match &self.prefix {
      Some(prefix) => format!("{prefix}/{}", self.semantic_id()),
      None => self.semantic_id(),
    };
  }

  /// Put a male occupant in slot A and a female occupant in slot B,
  /// swapping the focus flag along with the slots.
  fn canonicalize<S: RelativesSource>(&mut self, cache: &PersonCache<S>) {
    let gender = |slot: SlotRef| {
      slot
        .person()
        .and_then(|id| cache.get_if_present(id))
        .map(|r| r.gender)
        .unwrap_or(Gender::Unknown)
    };
    let a = gender(self.slot_a);
    let b = gender(self.slot_b);
    let swap = (b == Gender::Male && a != Gender::Male)
      || (a == Gender::Female && b != Gender::Female);
    if swap {
      std::mem::swap(&mut self.slot_a, &mut self.slot_b);
      self.focus = self.focus.other();
    }
  }

  // ── Accessors ─────────────────────────────────────────────────────────

  pub fn slot(&self, slot: Slot) -> SlotRef {
    match slot {
      Slot::A => self.slot_a,
      Slot::B => self.slot_b,
    }
  }

  pub fn slot_a(&self) -> SlotRef {
    self.slot_a
  }

  pub fn slot_b(&self) -> SlotRef {
    self.slot_b
  }

  pub fn focus(&self) -> Slot {
    self.focus
  }

  /// The person of primary interest, if that slot holds one.
  pub fn focus_person(&self) -> Option<PersonId> {
    self.slot(self.focus).person()
  }

  /// The occupant of the non-focus slot.
  pub fn partner_ref(&self) -> SlotRef {
    self.slot(self.focus.other())
  }

  pub fn is_root(&self) -> bool {
    self.is_root
  }

  pub fn structural_id(&self) -> &str {
    &self.structural_id
  }

  /// Identical for every occurrence of this pairing anywhere in the tree.
  pub fn semantic_id(&self) -> String {
    format!("{}:{}", self.slot_a.key(), self.slot_b.key())
  }

  /// The currently-shown joint children, in derivation order.
  pub fn joint_children(&self) -> Vec<PersonId> {
    self
      .children
      .iter()
      .copied()
      .filter(|id| !self.collapsed.contains(id))
      .collect()
  }

  /// The currently-hidden joint children, in derivation order.
  pub fn collapsed_children(&self) -> Vec<PersonId> {
    self
      .children
      .iter()
      .copied()
      .filter(|id| self.collapsed.contains(id))
      .collect()
  }

  pub fn all_children(&self) -> &[PersonId] {
    &self.children
  }

  // ── Joint children ────────────────────────────────────────────────────

  /// Recompute the joint-child set from the cache.
  ///
  /// Joint children are the focus slot's children restricted to those the
  /// other slot also has — unless the other slot is empty or flagged
  /// no-spouse (or its children are simply not loaded yet), in which case
  /// the focus slot's children stand alone. Prior collapse choices are
  /// retained for children that survive the recompute.
  pub fn compute_joint_children<S: RelativesSource>(
    &mut self,
    cache: &PersonCache<S>,
  ) {
    let focus_children = self
      .focus_person()
      .and_then(|id| cache.get_if_present(id))
      .and_then(|r| r.children_ids)
      .unwrap_or_default();

    let partner_children = self
      .partner_ref()
      .person()
      .and_then(|id| cache.get_if_present(id))
      .and_then(|r| r.children_ids);

    self.children = match partner_children {
      Some(partner_children) => {
        let partner_set: HashSet<_> =
          partner_children.into_iter().collect();
        focus_children
          .into_iter()
          .filter(|id| partner_set.contains(id))
          .collect()
      }
      None => focus_children,
    };

    self.collapsed.retain(|id| self.children.contains(id));
  }

  // ── Collapse / expand ─────────────────────────────────────────────────

  pub fn collapse_all(&mut self) {
    self.collapsed = self.children.iter().copied().collect();
  }

  pub fn expand_all(&mut self) {
    self.collapsed.clear();
  }

  pub fn collapse_one(&mut self, id: PersonId) {
    if self.children.contains(&id) {
      self.collapsed.insert(id);
    }
  }

  pub fn expand_one(&mut self, id: PersonId) {
    self.collapsed.remove(&id);
  }

  /// Re-apply the collapse choices of a previous rendering of this node,
  /// so a redraw does not silently re-expand what the user hid.
  pub fn collapse_to_match(&mut self, other_collapsed: &HashSet<PersonId>) {
    self.collapsed = self
      .children
      .iter()
      .copied()
      .filter(|id| other_collapsed.contains(id))
      .collect();
  }

  // ── Partner change ────────────────────────────────────────────────────

  /// Replace whichever slot does not hold `person` with `new_partner`.
  ///
  /// Only permitted when this couple is the tree root, or when the slot
  /// being replaced is not the in-focus slot. `new_partner` must be a
  /// recorded spouse of `person`. On success the preferred-spouse
  /// back-references are set symmetrically and the joint children are
  /// recomputed.
  pub fn change_partner<S: RelativesSource>(
    &mut self,
    person: PersonId,
    new_partner: PersonId,
    cache: &PersonCache<S>,
  ) -> Result<()> {
    let stable_slot = if self.slot_a.person() == Some(person) {
      Slot::A
    } else if self.slot_b.person() == Some(person) {
      Slot::B
    } else {
      return Err(Error::InvalidOperation(format!(
        "person {person} is not a member of couple {}",
        self.structural_id
      )));
    };

    let changed_slot = stable_slot.other();
    if !self.is_root && changed_slot == self.focus {
      return Err(Error::InvalidOperation(format!(
        "cannot replace the in-focus member of non-root couple {}",
        self.structural_id
      )));
    }

    let record = cache.get_if_present(person).ok_or_else(|| {
      Error::InvalidOperation(format!("person {person} is not cached"))
    })?;
    let is_spouse = record
      .spouse_ids
      .as_deref()
      .is_some_and(|spouses| spouses.contains(&new_partner));
    if !is_spouse {
      return Err(Error::InvalidOperation(format!(
        "person {new_partner} is not a recorded spouse of {person}"
      )));
    }

    match changed_slot {
      Slot::A => self.slot_a = SlotRef::Person(new_partner),
      Slot::B => self.slot_b = SlotRef::Person(new_partner),
    }
    self.canonicalize(cache);
    // The node's key encodes the pairing; re-derive it for the new one.
    self.rebuild_structural_id();

    // Symmetric back-reference: each member now prefers the other.
    cache.set_preferred_spouse(person, Some(new_partner));
    cache.set_preferred_spouse(new_partner, Some(person));

    self.compute_joint_children(cache);
    Ok(())
  }

  // ── Expandability ─────────────────────────────────────────────────────

  /// Whether this node can be expanded: no child nodes are materialized
  /// under it yet, and further data could still be pulled in.
  pub fn is_expandable<S: RelativesSource>(
    &self,
    direction: Direction,
    has_materialized_children: bool,
    cache: &PersonCache<S>,
  ) -> bool {
    if has_materialized_children {
      return false;
    }
    let occupants = [self.slot_a, self.slot_b]
      .into_iter()
      .filter_map(|slot| slot.person())
      .filter_map(|id| cache.get_if_present(id));

    match direction {
      Direction::Ancestors => occupants.into_iter().any(|r| {
        !r.richness.contains(Richness::PARENTS)
          || r.father_id.is_some()
          || r.mother_id.is_some()
      }),
      Direction::Descendants => occupants
        .into_iter()
        .any(|r| r.children_ids.is_none() || r.spouse_ids.is_none()),
    }
  }

  // ── Child-node derivation ─────────────────────────────────────────────

  /// Derive the next tier of tree nodes under this one — the same
  /// derivation the renderer, the descendant generation walk, and the
  /// path finder all use.
  ///
  /// Descendant direction: one node per shown joint child, paired with
  /// the child's preferred spouse (no-spouse when the child's loaded
  /// spouse list is empty). Ancestor direction: the parent couple of each
  /// slot occupant, focus slot first.
  pub fn derive_children<S: RelativesSource>(
    &self,
    direction: Direction,
    cache: &PersonCache<S>,
  ) -> Vec<Couple> {
    self.derive(direction, cache, false)
  }

  /// Same derivation over the full joint-child set, collapse state
  /// ignored. Generation assignment walks this, so collapsing stays a
  /// display-only filter and never changes the bookkeeping.
  pub fn derive_children_all<S: RelativesSource>(
    &self,
    direction: Direction,
    cache: &PersonCache<S>,
  ) -> Vec<Couple> {
    self.derive(direction, cache, true)
  }

  fn derive<S: RelativesSource>(
    &self,
    direction: Direction,
    cache: &PersonCache<S>,
    include_collapsed: bool,
  ) -> Vec<Couple> {
    match direction {
      Direction::Descendants => {
        let children = if include_collapsed {
          self.children.clone()
        } else {
          self.joint_children()
        };
        children
          .into_iter()
          .filter_map(|child_id| {
            let child = cache.get_if_present(child_id)?;
            let partner = match child.preferred_spouse() {
              Some(spouse) => SlotRef::Person(spouse),
              None
                if child
                  .spouse_ids
                  .as_deref()
                  .is_some_and(|s| s.is_empty()) =>
              {
                SlotRef::NoSpouse
              }
              None => SlotRef::Empty,
            };
            Some(Couple::derived(
              &self.structural_id,
              SlotRef::Person(child_id),
              partner,
              Slot::A,
              cache,
            ))
          })
          .collect()
      }
      Direction::Ancestors => {
        let mut parents = Vec::new();
        let slots =
          [self.slot(self.focus), self.slot(self.focus.other())];
        for occupant in slots {
          let Some(record) =
            occupant.person().and_then(|id| cache.get_if_present(id))
          else {
            continue;
          };
          if record.father_id.is_none() && record.mother_id.is_none() {
            continue;
          }
          let father = record
            .father_id
            .map(SlotRef::Person)
            .unwrap_or(SlotRef::Empty);
          let mother = record
            .mother_id
            .map(SlotRef::Person)
            .unwrap_or(SlotRef::Empty);
          let focus = if record.father_id.is_some() {
            Slot::A
          } else {
            Slot::B
          };
          parents.push(Couple::derived(
            &self.structural_id,
            father,
            mother,
            focus,
            cache,
          ));
        }
        parents
      }
    }
  }
}
