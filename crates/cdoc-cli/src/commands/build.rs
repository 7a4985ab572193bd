use cdoc_registry::{GroupStats, ResolvedDoc, resolve_docs};
use serde::Serialize;

use super::Project;
use crate::cli::{BuildArgs, GlobalFlags};
use crate::output::output;

#[derive(Debug, Serialize)]
struct BuildResponse {
    groups: Vec<GroupStats>,
    symbols: usize,
    tests: usize,
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    docs: Option<Vec<ResolvedDoc>>,
}

/// Handle `cdoc build`.
pub fn handle(args: &BuildArgs, project: &Project, flags: &GlobalFlags) -> anyhow::Result<()> {
    let built = project.build()?;
    let registry = &built.registry;

    let docs = resolve_docs(registry, project.config.build.auto_link);
    let mut warnings = built.warnings.clone();
    for doc in &docs {
        warnings.extend(doc.warnings.iter().map(|w| format!("{}: {w}", doc.anchor)));
    }
    for warning in &warnings {
        tracing::warn!("{warning}");
    }

    let in_group = |group: &str| flags.group.as_deref().is_none_or(|g| g == group);
    let response = BuildResponse {
        groups: built
            .stats
            .iter()
            .filter(|s| in_group(&s.group))
            .cloned()
            .collect(),
        symbols: registry.len(),
        tests: registry.tests().len(),
        warnings,
        docs: args.docs.then_some(docs),
    };
    output(&response, flags.compact)
}
