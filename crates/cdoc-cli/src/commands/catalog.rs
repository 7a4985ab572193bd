use cdoc_config::TestMode;
use cdoc_core::Test;
use cdoc_registry::{Catalog, group_by};
use serde::Serialize;

use super::Project;
use crate::cli::{CatalogArgs, GlobalFlags};
use crate::output::output;

#[derive(Debug, Serialize)]
struct GroupCatalog {
    group: String,
    title: String,
    #[serde(flatten)]
    catalog: Catalog,
}

/// Handle `cdoc catalog`.
pub fn handle(args: &CatalogArgs, project: &Project, flags: &GlobalFlags) -> anyhow::Result<()> {
    let built = project.build()?;

    let mut catalogs = Vec::new();
    for source in &project.config.sources {
        let group = source.group_name();
        if source.test_mode != TestMode::Igt
            || flags.group.as_deref().is_some_and(|g| g != group)
        {
            continue;
        }
        let tests: Vec<&Test> = built.registry.group_tests(&group).collect();
        let fields = match &args.field {
            Some(field) => std::slice::from_ref(field),
            None => source.test_group_by.as_slice(),
        };
        if fields.is_empty() {
            tracing::warn!(group = %group, "no field to group by; pass --field or set test_group_by");
        }
        for field in fields {
            catalogs.push(GroupCatalog {
                group: group.clone(),
                title: source.title(),
                catalog: group_by(tests.iter().copied(), field),
            });
        }
    }
    output(&catalogs, flags.compact)
}
