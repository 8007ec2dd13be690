//! [`PersonCache`] — the per-session identity map for person records.
//!
//! The cache is the only shared mutable state in the model. Every merge of
//! fetched data goes through it, which is the single point enforcing the
//! richness-monotonicity invariant. It is constructed once per viewer
//! session and passed by reference to all components; there is no static
//! registry.
//!
//! Cloning is cheap — the inner state is reference-counted.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
};

use stemma_core::{
  Error, Result,
  person::{PersonId, PersonRecord},
  raw::{RawBundle, RawPerson},
  richness::Richness,
  source::RelativesSource,
};
struct CacheInner<S> {
  source:  S,
  records: Mutex<HashMap<PersonId, PersonRecord>>,
  /// One async mutex per person id, serialising fetches for that id.
  /// Waiters re-check richness once they acquire the gate, so a fetch
  /// another caller completed is never repeated.
  fetch_gates: Mutex<HashMap<PersonId, Arc<tokio::sync::Mutex<()>>>>,
  /// Stable color indices for duplicates, assigned on first observation
  /// and kept for the rest of the session so repeated layout passes color
  /// a duplicate consistently.
  duplicate_indices: Mutex<HashMap<PersonId, usize>>,
}

/// Identity map from person id to [`PersonRecord`] with
/// create-or-merge and at-most-one-fetch-per-richness semantics.
pub struct PersonCache<S> {
  inner: Arc<CacheInner<S>>,
}

impl<S> Clone for PersonCache<S> {
  fn clone(&self) -> Self {
    Self { inner: Arc::clone(&self.inner) }
  }
}

impl<S: RelativesSource> PersonCache<S> {
  pub fn new(source: S) -> Self {
    Self {
      inner: Arc::new(CacheInner {
        source,
        records: Mutex::new(HashMap::new()),
        fetch_gates: Mutex::new(HashMap::new()),
        duplicate_indices: Mutex::new(HashMap::new()),
      }),
    }
  }

  /// The injected transport, e.g. for test doubles inspecting call
  /// counts.
  pub fn source(&self) -> &S {
    &self.inner.source
  }

  // ── Lookups ───────────────────────────────────────────────────────────

  /// Pure lookup; never fetches.
  pub fn get_if_present(&self, id: PersonId) -> Option<PersonRecord> {
    self.inner.records.lock().unwrap().get(&id).cloned()
  }

  pub fn len(&self) -> usize {
    self.inner.records.lock().unwrap().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// All records, sorted by id for deterministic iteration.
  pub fn records_snapshot(&self) -> Vec<PersonRecord> {
    let mut records: Vec<_> =
      self.inner.records.lock().unwrap().values().cloned().collect();
    records.sort_by_key(|r| r.id);
    records
  }

  /// Map the external stable id of `external_id` back to a person id.
  pub fn id_by_external(&self, external_id: &str) -> Option<PersonId> {
    self
      .inner
      .records
      .lock()
      .unwrap()
      .values()
      .find(|r| r.external_id.as_deref() == Some(external_id))
      .map(|r| r.id)
  }

  // ── Loading ───────────────────────────────────────────────────────────

  /// Return the cached record once its richness covers `required`,
  /// fetching at most once to get there.
  ///
  /// Concurrent callers for the same id are deduplicated: one of them
  /// performs the fetch, the rest wait and re-check. A record that exists
  /// but sits below `required` is not an error — it triggers the fetch.
  pub async fn get_with_load(
    &self,
    id: PersonId,
    required: Richness,
  ) -> Result<PersonRecord> {
    if let Some(record) = self.satisfied(id, required) {
      return Ok(record);
    }

    let gate = self.fetch_gate(id);
    let _guard = gate.lock().await;

    // A caller that held the gate before us may already have fetched
    // what we need.
    if let Some(record) = self.satisfied(id, required) {
      return Ok(record);
    }

    tracing::debug!(%id, %required, "fetching person");
    match self.inner.source.fetch(id, required).await {
      Ok(bundle) => Ok(self.merge_bundle(bundle)),
      Err(e) => Err(Error::Fetch { id, source: Box::new(e) }),
    }
  }

  fn satisfied(
    &self,
    id: PersonId,
    required: Richness,
  ) -> Option<PersonRecord> {
    self
      .get_if_present(id)
      .filter(|record| record.richness.contains(required))
  }

  fn fetch_gate(&self, id: PersonId) -> Arc<tokio::sync::Mutex<()>> {
    self
      .inner
      .fetch_gates
      .lock()
      .unwrap()
      .entry(id)
      .or_default()
      .clone()
  }

  /// Register data that arrived embedded inside another fetch response.
  ///
  /// Creates the record if absent. Merges only if the incoming payload is
  /// at the same or higher richness than the cached record — an embedded
  /// sub-record poorer than what we already hold is silently discarded.
  pub fn get_with_data(&self, raw: &RawPerson) -> PersonRecord {
    let record = {
      let mut records = self.inner.records.lock().unwrap();
      let entry = records
        .entry(raw.id)
        .or_insert_with(|| PersonRecord::stub(raw.id));
      if raw.richness().is_same_or_higher(entry.richness) {
        entry.merge_raw(raw);
      } else {
        tracing::debug!(
          id = %raw.id,
          cached = %entry.richness,
          incoming = %raw.richness(),
          "discarding embedded record poorer than cache"
        );
      }
      entry.clone()
    };
    self.register_stubs(&record);
    record
  }

  /// Merge a full fetch response: the primary person authoritatively, the
  /// inline relatives through the same-or-higher richness gate.
  fn merge_bundle(&self, bundle: RawBundle) -> PersonRecord {
    let primary = {
      let mut records = self.inner.records.lock().unwrap();
      let entry = records
        .entry(bundle.person.id)
        .or_insert_with(|| PersonRecord::stub(bundle.person.id));
      entry.merge_raw(&bundle.person);
      entry.clone()
    };
    self.register_stubs(&primary);

    for relative in &bundle.relatives {
      self.get_with_data(relative);
    }
    primary
  }

  /// Make sure every id `record` references exists at least as a stub.
  /// One level only; no recursive fetch.
  fn register_stubs(&self, record: &PersonRecord) {
    let mut records = self.inner.records.lock().unwrap();
    for id in record.referenced_ids() {
      records.entry(id).or_insert_with(|| PersonRecord::stub(id));
    }
  }

  // ── Layout metadata ───────────────────────────────────────────────────

  fn update<R>(
    &self,
    id: PersonId,
    f: impl FnOnce(&mut PersonRecord) -> R,
  ) -> Option<R> {
    self.inner.records.lock().unwrap().get_mut(&id).map(f)
  }

  /// Clear generation/visibility metadata on every record, ahead of a
  /// fresh assignment pass.
  pub fn reset_layout_state(&self) {
    for record in self.inner.records.lock().unwrap().values_mut() {
      record.reset_layout_state();
    }
  }

  pub fn record_generation(&self, id: PersonId, generation: i32) {
    self.update(id, |r| r.record_generation(generation));
  }

  /// Record how many further generations exist beyond this person. Kept as
  /// the maximum over the person's occurrences.
  pub fn record_older_generations(&self, id: PersonId, count: i32) {
    self.update(id, |r| {
      r.nr_older_generations = r.nr_older_generations.max(count)
    });
  }

  pub fn set_preferred_spouse(
    &self,
    id: PersonId,
    spouse: Option<PersonId>,
  ) {
    self.update(id, |r| r.preferred_spouse_id = spouse);
  }

  pub fn set_brick_wall(&self, id: PersonId, brick_wall: bool) {
    self.update(id, |r| r.brick_wall = brick_wall);
  }

  pub fn mark_duplicate(&self, id: PersonId) {
    self.update(id, |r| r.marked_as_duplicate = true);
  }

  /// The stable color index for a duplicate, allocated on first use.
  pub fn duplicate_index(&self, id: PersonId) -> usize {
    let mut indices = self.inner.duplicate_indices.lock().unwrap();
    let next = indices.len();
    *indices.entry(id).or_insert(next)
  }
}
