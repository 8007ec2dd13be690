//! The live, partially-materialized genealogical tree model.
//!
//! One [`PersonCache`] per viewer session holds the canonical record for
//! every person seen so far. [`Couple`] values are the tree nodes derived
//! from it; [`EnrichmentLoader`] pulls in the data a node needs before it
//! can be displayed; [`Generations`] recomputes generation numbers and
//! duplicate bookkeeping after every mutation; [`DuplicatePathFinder`]
//! answers highlight queries.
//!
//! The usual cycle for a UI action is:
//!
//! ```rust,ignore
//! let report = loader.expand(&mut couple, Direction::Ancestors).await?;
//! let snapshot = Generations::assign(&root, Direction::Ancestors, &cache)?;
//! ```
//!
//! Rendering, layout, and export live outside this crate; it only hands a
//! [`TreeSnapshot`] to whatever consumes it.

pub mod cache;
pub mod couple;
pub mod generations;
pub mod loader;
pub mod paths;

pub use cache::PersonCache;
pub use couple::{Couple, Direction, Slot, SlotRef};
pub use generations::{Generations, TreeSnapshot};
pub use loader::{EnrichmentLoader, LoadReport};
pub use paths::DuplicatePathFinder;
pub use stemma_core::{Error, Result};
