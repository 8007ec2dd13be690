//! [`DuplicatePathFinder`] — enumerate every tree path from the root to an
//! occurrence of a person, so the renderer can highlight all of them.
//!
//! Classic depth-first search with explicit push/pop backtracking over the
//! currently materialized couple tree, using the same child derivation the
//! renderer uses. Not memoized: multiple paths to the same target are the
//! point.

use std::collections::HashSet;

use stemma_core::{person::PersonId, source::RelativesSource};

use crate::{
  cache::PersonCache,
  couple::{Couple, Direction},
};

/// An edge of the rendered tree, as (parent node id, child node id)
/// structural keys.
pub type EdgeKey = (String, String);

pub struct DuplicatePathFinder;

impl DuplicatePathFinder {
  /// All paths from `root` to any couple node containing the person with
  /// external stable id `target`. Each path is the sequence of structural
  /// node ids from the root to the hit, inclusive.
  ///
  /// `connector_mode` mirrors the renderer option that draws a node only
  /// once and connects later occurrences back to it: descent stops at a
  /// couple (by semantic id) already seen in this traversal.
  pub fn find_all_paths<S: RelativesSource>(
    root: &Couple,
    target: &str,
    direction: Direction,
    connector_mode: bool,
    cache: &PersonCache<S>,
  ) -> Vec<Vec<String>> {
    let target_id = cache.id_by_external(target);
    let mut paths = Vec::new();
    let mut current = Vec::new();
    let mut on_path = HashSet::new();
    let mut seen = HashSet::new();
    Self::search(
      root,
      target_id,
      direction,
      connector_mode,
      cache,
      &mut current,
      &mut on_path,
      &mut seen,
      &mut paths,
    );
    paths
  }

  #[allow(clippy::too_many_arguments)]
  fn search<S: RelativesSource>(
    node: &Couple,
    target: Option<PersonId>,
    direction: Direction,
    connector_mode: bool,
    cache: &PersonCache<S>,
    current: &mut Vec<String>,
    on_path: &mut HashSet<String>,
    seen: &mut HashSet<String>,
    paths: &mut Vec<Vec<String>>,
  ) {
    let semantic = node.semantic_id();
    if connector_mode && !seen.insert(semantic.clone()) {
      return;
    }
    // The same pairing re-appearing on its own path would mean cyclic
    // data; never descend into it.
    if !on_path.insert(semantic.clone()) {
      return;
    }
    current.push(node.structural_id().to_string());

    let hit = target.is_some()
      && (node.slot_a().person() == target
        || node.slot_b().person() == target);
    if hit {
      paths.push(current.clone());
    } else {
      for child in node.derive_children(direction, cache) {
        Self::search(
          &child,
          target,
          direction,
          connector_mode,
          cache,
          current,
          on_path,
          seen,
          paths,
        );
      }
    }

    current.pop();
    on_path.remove(&semantic);
  }

  /// Resolve several highlight targets at once and merge each found
  /// path's adjacent node pairs into a single edge set for the renderer.
  pub fn find_paths<S: RelativesSource>(
    root: &Couple,
    targets: &[String],
    direction: Direction,
    connector_mode: bool,
    cache: &PersonCache<S>,
  ) -> HashSet<EdgeKey> {
    let mut edges = HashSet::new();
    for target in targets {
      for path in
        Self::find_all_paths(root, target, direction, connector_mode, cache)
      {
        for pair in path.windows(2) {
          edges.insert((pair[0].clone(), pair[1].clone()));
        }
      }
    }
    edges
  }
}
