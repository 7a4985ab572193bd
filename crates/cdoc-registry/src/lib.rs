//! # cdoc-registry
//!
//! Build-scoped registry of every documented symbol and test.
//!
//! A build runs in two phases. [`build()`] parses each source group on its
//! own (in parallel), then registers the results in configured order into
//! a [`RegistryBuilder`], which rejects duplicate qualified names. The
//! builder freezes into a read-only [`Registry`], the only thing reference
//! resolution ever sees, so links and indexes do not depend on the order
//! files were parsed in.
//!
//! On top of the registry:
//! - [`index`] builds the per-group and global A–Z indexes
//! - [`catalog`] groups tests by a metadata field
//! - [`docs`] resolves every doc string through the markup converter

pub mod build;
pub mod catalog;
pub mod docs;
pub mod error;
pub mod index;
pub mod registry;

pub use build::{BuildOutput, GroupStats, SourceGroup, build, select_backend};
pub use catalog::{Catalog, CatalogBucket, CatalogEntry, FieldLevel, group_by};
pub use docs::{ResolvedDoc, resolve_docs};
pub use error::BuildError;
pub use index::{IndexBucket, IndexEntry};
pub use registry::{Registry, RegistryBuilder};
