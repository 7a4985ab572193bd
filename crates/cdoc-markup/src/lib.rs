//! # cdoc-markup
//!
//! Doc string conversion in two passes:
//!
//! 1. [`legacy::normalize`] rewrites gtk-doc markup into roles and
//!    `:param:`/`:returns:` directives. It needs no registry and runs at
//!    parse time.
//! 2. [`Converter`] resolves roles against a frozen
//!    [`SymbolLookup`](cdoc_core::SymbolLookup) and auto-links inline code.
//!
//! Unresolved references never fail a build. They render as literal code
//! and are reported as [`Warning`]s.

pub mod legacy;
pub mod linker;
pub mod role;
pub mod spans;
pub mod warning;
pub mod xref;

pub use legacy::normalize;
pub use linker::{AnchorLinker, Linker};
pub use role::Role;
pub use warning::{Warning, WarningKind};
pub use xref::{Converted, Converter, Resolution};
