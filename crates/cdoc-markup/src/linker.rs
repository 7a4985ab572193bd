//! How resolved targets become hrefs.

use cdoc_core::Target;

/// Turns a resolved target into a link destination.
///
/// The renderer owns page layout, so it decides how anchors map to URLs.
pub trait Linker {
    fn href(&self, target: &Target<'_>) -> String;
}

/// Links every target as an in-page `#anchor`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchorLinker;

impl Linker for AnchorLinker {
    fn href(&self, target: &Target<'_>) -> String {
        format!("#{}", target.anchor())
    }
}

impl<F> Linker for F
where
    F: Fn(&Target<'_>) -> String,
{
    fn href(&self, target: &Target<'_>) -> String {
        self(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdoc_core::{Location, Symbol, SymbolKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn anchor_and_function_linkers() {
        fn pages(t: &Target<'_>) -> String {
            format!("{}.md#{}", t.group(), t.anchor())
        }

        let symbol = Symbol::new(SymbolKind::Function, "engine_init", Location::new("e.c", 1))
            .in_group("core");
        let target = Target::Symbol(&symbol);

        assert_eq!(AnchorLinker.href(&target), "#func-core-engine_init");

        assert_eq!(pages.href(&target), "core.md#func-core-engine_init");
    }
}
