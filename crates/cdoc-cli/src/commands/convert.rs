use std::io::Read;

use anyhow::Context;
use cdoc_markup::{Converter, Warning, normalize};
use serde::Serialize;

use super::Project;
use crate::cli::{ConvertArgs, GlobalFlags};
use crate::output::output;

#[derive(Debug, Serialize)]
struct ConvertResponse {
    text: String,
    warnings: Vec<Warning>,
}

/// Handle `cdoc convert`.
pub fn handle(args: &ConvertArgs, project: &Project, flags: &GlobalFlags) -> anyhow::Result<()> {
    let input = match &args.text {
        Some(text) => text.clone(),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            text
        }
    };
    let input = if args.legacy { normalize(&input) } else { input };

    let built = project.build()?;
    let mut converter =
        Converter::new(&built.registry).auto_link(project.config.build.auto_link);
    if let Some(group) = flags.group.as_deref() {
        converter = converter.in_group(group);
    }
    let converted = converter.convert(&input);
    output(
        &ConvertResponse {
            text: converted.text,
            warnings: converted.warnings,
        },
        flags.compact,
    )
}
