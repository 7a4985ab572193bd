use cdoc_core::Symbol;

use super::Project;
use crate::cli::{GlobalFlags, SymbolsArgs};
use crate::output::output;

/// Handle `cdoc symbols`.
pub fn handle(args: &SymbolsArgs, project: &Project, flags: &GlobalFlags) -> anyhow::Result<()> {
    let built = project.build()?;
    let symbols: Vec<&Symbol> = built
        .registry
        .symbols()
        .iter()
        .filter(|s| flags.group.as_deref().is_none_or(|g| s.group == g))
        .filter(|s| args.kind.as_deref().is_none_or(|k| s.kind.as_str() == k))
        .collect();
    output(&symbols, flags.compact)
}
