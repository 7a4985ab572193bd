//! # cdoc-core
//!
//! Shared model for the cdoc extraction engine.
//!
//! This crate holds the types every other cdoc crate agrees on:
//! - [`Symbol`] and [`SymbolKind`] for documented C/C++ entities
//! - [`Test`] and [`Subtest`] for the test catalog
//! - [`Metadata`] with separator-insensitive field names
//! - anchor, slug, and A–Z sort helpers in [`naming`]
//! - the read-only [`SymbolLookup`] seam the markup converter resolves against

pub mod kind;
pub mod lookup;
pub mod metadata;
pub mod naming;
pub mod source;
pub mod symbol;
pub mod test_item;

pub use kind::SymbolKind;
pub use lookup::{SymbolLookup, Target};
pub use metadata::Metadata;
pub use source::{Language, SourceFile};
pub use symbol::{Location, Param, Symbol, TypeRef};
pub use test_item::{Step, Subtest, Test};
