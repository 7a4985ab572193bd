use super::Project;
use crate::cli::GlobalFlags;
use crate::output::output;

/// Handle `cdoc index`.
pub fn handle(project: &Project, flags: &GlobalFlags) -> anyhow::Result<()> {
    let built = project.build()?;
    let index = match &flags.group {
        Some(group) => built.registry.group_index(group),
        None => built.registry.global_index(),
    };
    output(&index, flags.compact)
}
