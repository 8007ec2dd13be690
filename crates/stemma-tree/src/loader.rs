//! [`EnrichmentLoader`] — decides which people must be fetched (and at what
//! richness) to make a couple node and its dropdown affordances
//! displayable, and issues those fetches without duplicating work.
//!
//! Fetch fan-out happens in two waves: the second wave depends on which
//! spouse the first wave resolved, so it never starts before the first has
//! fully settled. Within a wave, fetches are unordered and independent.

use std::collections::HashSet;

use stemma_core::{
  Error, Result,
  person::{PersonId, PersonRecord},
  richness::Richness,
  source::RelativesSource,
};
use tokio::task::JoinSet;

use crate::{
  cache::PersonCache,
  couple::{Couple, Direction, SlotRef},
};

/// Outcome of a rich-load: the refreshed primary record plus any relative
/// fetches that failed. Relative failures do not abort the load.
#[derive(Debug)]
pub struct LoadReport {
  pub person:   PersonRecord,
  pub failures: Vec<(PersonId, Error)>,
}

impl LoadReport {
  pub fn is_clean(&self) -> bool {
    self.failures.is_empty()
  }
}

/// Orchestrates cache loads for one viewer session.
pub struct EnrichmentLoader<S> {
  cache: PersonCache<S>,
}

impl<S: RelativesSource + 'static> EnrichmentLoader<S> {
  pub fn new(cache: PersonCache<S>) -> Self {
    Self { cache }
  }

  pub fn cache(&self) -> &PersonCache<S> {
    &self.cache
  }

  /// Ensure the cache holds enough data to display `id`'s couple node.
  ///
  /// Wave 1: the chosen partner at full richness, each of the person's
  /// parents at {spouses, children} (for alternate-spouse and sibling
  /// dropdowns), and — in descendant direction — each child lacking spouse
  /// data at {spouses}. Wave 2, once the partner is resolved: the
  /// partner's parents at {spouses, children} and, in descendant
  /// direction, each child's spouses at full richness.
  ///
  /// The primary person's own fetch failing is fatal; relative failures
  /// are collected into the report.
  pub async fn rich_load(
    &self,
    id: PersonId,
    partner: Option<PersonId>,
    direction: Direction,
  ) -> Result<LoadReport> {
    let person = self.cache.get_with_load(id, Richness::FULL).await?;
    let mut failures = Vec::new();

    let partner_id = partner.or_else(|| person.preferred_spouse());

    // ── Wave 1 ────────────────────────────────────────────────────────
    let mut wave = Vec::new();
    if let Some(partner_id) = partner_id {
      wave.push((partner_id, Richness::FULL));
    }
    for parent in [person.father_id, person.mother_id].into_iter().flatten()
    {
      wave.push((parent, Richness::SPOUSES | Richness::CHILDREN));
    }
    if direction == Direction::Descendants {
      for child in person.children_ids.iter().flatten() {
        let needs_spouses = self
          .cache
          .get_if_present(*child)
          .is_none_or(|r| !r.richness.contains(Richness::SPOUSES));
        if needs_spouses {
          wave.push((*child, Richness::SPOUSES));
        }
      }
    }
    self.run_wave(wave, &mut failures).await;

    // ── Wave 2 ────────────────────────────────────────────────────────
    let spouse = partner_id.and_then(|id| self.cache.get_if_present(id));
    let mut wave = Vec::new();
    if let Some(spouse) = &spouse {
      for parent in [spouse.father_id, spouse.mother_id].into_iter().flatten()
      {
        wave.push((parent, Richness::SPOUSES | Richness::CHILDREN));
      }
    }
    if direction == Direction::Descendants {
      for child in person.children_ids.iter().flatten() {
        let Some(child_record) = self.cache.get_if_present(*child) else {
          continue;
        };
        for child_spouse in child_record.spouse_ids.iter().flatten() {
          wave.push((*child_spouse, Richness::SPOUSES | Richness::CHILDREN));
        }
      }
    }
    self.run_wave(wave, &mut failures).await;

    if !failures.is_empty() {
      tracing::warn!(
        %id,
        failed = failures.len(),
        "rich load finished with partial failures"
      );
    }

    // The primary record may have gained data from relatives' responses.
    let person = self.cache.get_if_present(id).unwrap_or(person);
    Ok(LoadReport { person, failures })
  }

  /// Issue one wave of fetches concurrently and wait for all of them.
  /// Requests already satisfied by the cache resolve without a fetch.
  async fn run_wave(
    &self,
    targets: Vec<(PersonId, Richness)>,
    failures: &mut Vec<(PersonId, Error)>,
  ) {
    let mut seen = HashSet::new();
    let mut set = JoinSet::new();
    for (target, relations) in targets {
      if !seen.insert((target, relations)) {
        continue;
      }
      let cache = self.cache.clone();
      set.spawn(async move {
        (target, cache.get_with_load(target, relations).await)
      });
    }
    while let Some(joined) = set.join_next().await {
      match joined {
        Ok((_, Ok(_))) => {}
        Ok((target, Err(e))) => failures.push((target, e)),
        Err(e) => {
          tracing::warn!(error = %e, "fetch task aborted");
        }
      }
    }
  }

  /// Build a root couple for `id`, loading it (and its surroundings)
  /// first.
  pub async fn load_root(
    &self,
    id: PersonId,
    partner: Option<PersonId>,
    direction: Direction,
  ) -> Result<(Couple, LoadReport)> {
    let report = self.rich_load(id, partner, direction).await?;
    let partner_slot = match partner.or_else(|| report.person.preferred_spouse())
    {
      Some(partner) => SlotRef::Person(partner),
      None
        if report
          .person
          .spouse_ids
          .as_deref()
          .is_some_and(|s| s.is_empty()) =>
      {
        SlotRef::NoSpouse
      }
      None => SlotRef::Empty,
    };
    let root = Couple::new_root(id, partner_slot, &self.cache);
    Ok((root, report))
  }

  /// Pull in the data behind `couple` and refresh its joint children.
  ///
  /// Errors with [`Error::AlreadyEnriched`] if the in-focus person already
  /// has all displayable relation classes — expanding such a node is a
  /// caller bug. Callers follow a successful expand with a
  /// [`Generations::assign`](crate::generations::Generations::assign) pass.
  pub async fn expand(
    &self,
    couple: &mut Couple,
    direction: Direction,
  ) -> Result<LoadReport> {
    let focus = couple.focus_person().ok_or_else(|| {
      Error::InvalidOperation(format!(
        "couple {} has no in-focus person to expand",
        couple.structural_id()
      ))
    })?;

    if self
      .cache
      .get_if_present(focus)
      .is_some_and(|r| r.is_fully_enriched())
    {
      tracing::warn!(%focus, "attempted to expand an already-enriched node");
      return Err(Error::AlreadyEnriched(focus));
    }

    let partner = match couple.partner_ref() {
      SlotRef::Person(id) => Some(id),
      SlotRef::NoSpouse | SlotRef::Empty => None,
    };
    let report = self.rich_load(focus, partner, direction).await?;
    couple.compute_joint_children(&self.cache);
    Ok(report)
  }

  /// Swap in a different recorded spouse beside `person`: rich-load the
  /// new partner, then delegate the slot replacement to
  /// [`Couple::change_partner`]. Invalid requests are logged and leave the
  /// couple unchanged.
  pub async fn change_partner(
    &self,
    couple: &mut Couple,
    person: PersonId,
    new_partner: PersonId,
    direction: Direction,
  ) -> Result<LoadReport> {
    let report = self.rich_load(new_partner, Some(person), direction).await?;
    if let Err(e) = couple.change_partner(person, new_partner, &self.cache) {
      tracing::warn!(%person, %new_partner, error = %e, "partner change rejected");
      return Err(e);
    }
    Ok(report)
  }
}
