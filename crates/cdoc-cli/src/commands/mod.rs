use std::path::{Path, PathBuf};

use anyhow::Context;
use cdoc_config::CdocConfig;
use cdoc_registry::{BuildOutput, SourceGroup};

use crate::cli::{Commands, GlobalFlags};
use crate::scan::collect_group;

pub mod build;
pub mod catalog;
pub mod convert;
pub mod index;
pub mod symbols;

/// Loaded configuration and the directory source roots resolve against.
#[derive(Debug)]
pub struct Project {
    pub config: CdocConfig,
    pub base: PathBuf,
}

impl Project {
    /// Load and validate the configuration.
    ///
    /// With `--config`, roots are relative to that file's directory;
    /// otherwise to the working directory.
    pub fn load(flags: &GlobalFlags) -> anyhow::Result<Self> {
        let (config, base) = match &flags.config {
            Some(path) => {
                anyhow::ensure!(path.is_file(), "config file '{}' not found", path.display());
                let config = CdocConfig::load_from(path)
                    .with_context(|| format!("failed to load {}", path.display()))?;
                let base = path
                    .parent()
                    .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
                (config, base)
            }
            None => {
                let config = CdocConfig::load_with_dotenv().context("failed to load cdoc.toml")?;
                let base = std::env::current_dir().context("failed to read current directory")?;
                (config, base)
            }
        };
        config.validate().context("invalid configuration")?;

        if let Some(group) = &flags.group {
            anyhow::ensure!(
                config.sources.iter().any(|s| &s.group_name() == group),
                "unknown group '{group}'"
            );
        }
        Ok(Self { config, base })
    }

    /// Scan every configured group and run the build.
    pub fn build(&self) -> anyhow::Result<BuildOutput> {
        let groups = self
            .config
            .sources
            .iter()
            .map(|source| {
                collect_group(source, &self.base)
                    .map(|files| SourceGroup::from_config(source, files))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        cdoc_registry::build(&self.config.build, &groups).context("build failed")
    }
}

pub fn dispatch(command: Commands, flags: &GlobalFlags) -> anyhow::Result<()> {
    let project = Project::load(flags)?;
    match command {
        Commands::Build(args) => build::handle(&args, &project, flags),
        Commands::Symbols(args) => symbols::handle(&args, &project, flags),
        Commands::Index => index::handle(&project, flags),
        Commands::Catalog(args) => catalog::handle(&args, &project, flags),
        Commands::Convert(args) => convert::handle(&args, &project, flags),
    }
}
