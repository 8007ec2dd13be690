//! Generation assignment and the tree-metadata snapshot.
//!
//! After every mutation of the materialized graph, a fresh pass walks the
//! tree from the root couple, assigns one generation number per occurrence
//! of every reachable person, detects true cycles in the source data, and
//! recomputes duplicate bookkeeping. The resulting [`TreeSnapshot`] is the
//! read model handed to the rendering layer — never stored, always derived.

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stemma_core::{
  Error, Result,
  person::{PersonId, PersonRecord},
  richness::Richness,
  source::RelativesSource,
};

use crate::{
  cache::PersonCache,
  couple::{Couple, Direction},
};

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// Everything the renderer needs to draw the current materialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSnapshot {
  pub root:      Couple,
  pub direction: Direction,
  /// Every cached record, by id — tree members and dropdown-only people
  /// (siblings, alternate spouses) alike.
  pub persons:        HashMap<PersonId, PersonRecord>,
  pub by_external_id: HashMap<String, PersonId>,
  /// How many materialized profiles sit at each generation.
  pub gen_counts: BTreeMap<i32, usize>,
  /// Duplicate person → stable color index.
  pub duplicates:     HashMap<PersonId, usize>,
  pub min_birth_year: Option<i32>,
  pub max_generation: i32,
  /// A person occurring in k tree positions counts k times.
  pub profile_count: usize,
  pub built_at:      DateTime<Utc>,
}

// ─── Assignment ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct AssignState {
  gen_counts:     BTreeMap<i32, usize>,
  min_birth_year: Option<i32>,
  max_generation: i32,
  profile_count:  usize,
}

impl AssignState {
  fn record<S: RelativesSource>(
    &mut self,
    cache: &PersonCache<S>,
    id: PersonId,
    generation: i32,
  ) {
    cache.record_generation(id, generation);
    *self.gen_counts.entry(generation).or_default() += 1;
    self.max_generation = self.max_generation.max(generation);
    self.profile_count += 1;
    if let Some(year) =
      cache.get_if_present(id).and_then(|r| r.birth.year)
    {
      self.min_birth_year =
        Some(self.min_birth_year.map_or(year, |m| m.min(year)));
    }
  }
}

/// The generation assigner. Stateless; every pass starts from a clean
/// slate on the cache's layout metadata.
pub struct Generations;

impl Generations {
  /// Walk the materialized graph from `root`, assign generations, and
  /// build the snapshot.
  ///
  /// Fails with [`Error::CycleDetected`] when a person is found on their
  /// own ancestor (or descendant) path — a data error, distinct from the
  /// expected revisiting of a person via a different path.
  pub fn assign<S: RelativesSource>(
    root: &Couple,
    direction: Direction,
    cache: &PersonCache<S>,
  ) -> Result<TreeSnapshot> {
    cache.reset_layout_state();

    let mut root = root.clone();
    root.compute_joint_children(cache);

    let mut state = AssignState::default();
    match direction {
      Direction::Ancestors => {
        let slots = [root.slot(root.focus()), root.slot(root.focus().other())];
        for occupant in slots {
          if let Some(id) = occupant.person() {
            let mut path = Vec::new();
            Self::visit_ancestor(id, 0, &mut path, cache, &mut state)?;
          }
        }
        Self::mark_brick_walls(cache);
      }
      Direction::Descendants => {
        Self::walk_descendants(&root, cache, &mut state)?;
        Self::assign_descendant_depths(cache, state.max_generation);
      }
    }

    let duplicates = Self::detect_duplicates(cache);

    let mut persons = HashMap::new();
    let mut by_external_id = HashMap::new();
    for record in cache.records_snapshot() {
      if let Some(ext) = &record.external_id {
        by_external_id.insert(ext.clone(), record.id);
      }
      persons.insert(record.id, record);
    }

    Ok(TreeSnapshot {
      root,
      direction,
      persons,
      by_external_id,
      gen_counts: state.gen_counts,
      duplicates,
      min_birth_year: state.min_birth_year,
      max_generation: state.max_generation,
      profile_count: state.profile_count,
      built_at: Utc::now(),
    })
  }

  /// Depth-first over father/mother edges. `path` holds the ids visited on
  /// the current path only (push/pop with restore on backtrack); meeting
  /// one of them again means the data records someone as their own
  /// ancestor. Returns the maximum generation reached in this branch.
  fn visit_ancestor<S: RelativesSource>(
    id: PersonId,
    generation: i32,
    path: &mut Vec<PersonId>,
    cache: &PersonCache<S>,
    state: &mut AssignState,
  ) -> Result<i32> {
    if path.contains(&id) {
      return Err(Error::CycleDetected(id));
    }

    state.record(cache, id, generation);

    let Some(record) = cache.get_if_present(id) else {
      return Ok(generation);
    };

    path.push(id);
    let mut max_below = generation;
    for parent in [record.father_id, record.mother_id].into_iter().flatten()
    {
      let branch_max =
        Self::visit_ancestor(parent, generation + 1, path, cache, state)?;
      max_below = max_below.max(branch_max);
    }
    path.pop();

    cache.record_older_generations(id, max_below - generation);
    Ok(max_below)
  }

  /// Breadth-first over derived couple nodes, collapse state ignored —
  /// collapsing a child only hides its subtree, the bookkeeping still
  /// covers it. Each entry carries the chain of lineage ids from the root
  /// occurrence; a child id re-appearing in its own chain means the data
  /// records someone as their own descendant.
  fn walk_descendants<S: RelativesSource>(
    root: &Couple,
    cache: &PersonCache<S>,
    state: &mut AssignState,
  ) -> Result<()> {
    let mut queue: VecDeque<(Couple, i32, Vec<PersonId>)> = VecDeque::new();
    queue.push_back((root.clone(), 0, Vec::new()));

    while let Some((couple, generation, chain)) = queue.pop_front() {
      for occupant in [couple.slot_a(), couple.slot_b()] {
        if let Some(id) = occupant.person() {
          state.record(cache, id, generation);
        }
      }

      let mut child_chain = chain;
      child_chain.extend(
        [couple.slot_a(), couple.slot_b()]
          .into_iter()
          .filter_map(|slot| slot.person()),
      );

      for child in couple.derive_children_all(Direction::Descendants, cache)
      {
        if let Some(child_id) = child.focus_person() {
          if child_chain.contains(&child_id) {
            return Err(Error::CycleDetected(child_id));
          }
        }
        queue.push_back((child, generation + 1, child_chain.clone()));
      }
    }
    Ok(())
  }

  /// Descendant-direction depth bookkeeping: the distance from the deepest
  /// observed generation up to each person's shallowest occurrence.
  fn assign_descendant_depths<S: RelativesSource>(
    cache: &PersonCache<S>,
    max_generation: i32,
  ) {
    for record in cache.records_snapshot() {
      if let Some(lowest) = record.lowest_generation() {
        cache.record_older_generations(record.id, max_generation - lowest);
      }
    }
  }

  /// A brick wall is a visited person whose parents are loaded and both
  /// unknown — the ancestor line ends there.
  fn mark_brick_walls<S: RelativesSource>(cache: &PersonCache<S>) {
    for record in cache.records_snapshot() {
      let ends_here = !record.generations.is_empty()
        && record.richness.contains(Richness::PARENTS)
        && record.father_id.is_none()
        && record.mother_id.is_none();
      if ends_here {
        cache.set_brick_wall(record.id, true);
      }
    }
  }

  /// A person occurring at more than one generation or tree position is a
  /// duplicate. Color indices are allocated on first observation and held
  /// stable by the cache across repeated passes.
  fn detect_duplicates<S: RelativesSource>(
    cache: &PersonCache<S>,
  ) -> HashMap<PersonId, usize> {
    let mut duplicates = HashMap::new();
    for record in cache.records_snapshot() {
      if record.generations.len() > 1 {
        cache.mark_duplicate(record.id);
        duplicates.insert(record.id, cache.duplicate_index(record.id));
      }
    }
    duplicates
  }
}
