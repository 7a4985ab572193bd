use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI parser for the `cdoc` binary.
#[derive(Debug, Parser)]
#[command(
    name = "cdoc",
    version,
    about = "Extract, index and cross-reference C/C++ doc comments"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project config file (defaults to ./cdoc.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Restrict output to one source group
    #[arg(short, long, global = true)]
    pub group: Option<String>,

    /// Single-line JSON instead of pretty-printed
    #[arg(long, global = true)]
    pub compact: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            config: self.config.clone(),
            group: self.group.clone(),
            compact: self.compact,
        }
    }
}

/// Flags every command handler sees.
#[derive(Clone, Debug)]
pub struct GlobalFlags {
    pub config: Option<PathBuf>,
    pub group: Option<String>,
    pub compact: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Parse every source group and report counts and warnings
    Build(BuildArgs),
    /// List registered symbols
    Symbols(SymbolsArgs),
    /// A–Z index of one group, or of every group
    Index,
    /// Tests grouped by a metadata field
    Catalog(CatalogArgs),
    /// Resolve references in a doc string against the built registry
    Convert(ConvertArgs),
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Include every resolved doc string in the output
    #[arg(long)]
    pub docs: bool,
}

#[derive(Debug, Args)]
pub struct SymbolsArgs {
    /// Only symbols of this kind (function, struct, macro, ...)
    #[arg(short, long)]
    pub kind: Option<String>,
}

#[derive(Debug, Args)]
pub struct CatalogArgs {
    /// Field to group by; defaults to each group's `test_group_by`
    #[arg(short, long)]
    pub field: Option<String>,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Text to convert; reads stdin when omitted
    pub text: Option<String>,

    /// Rewrite gtk-doc markup before resolving
    #[arg(long)]
    pub legacy: bool,
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["cdoc", "index", "--group", "core", "--verbose"])
            .expect("cli should parse");
        assert!(cli.verbose);
        assert_eq!(cli.global_flags().group.as_deref(), Some("core"));
        assert!(matches!(cli.command, Commands::Index));
    }

    #[test]
    fn catalog_field_and_convert_text() {
        let cli = Cli::try_parse_from(["cdoc", "catalog", "--field", "mega_feature"])
            .expect("cli should parse");
        let Commands::Catalog(args) = cli.command else {
            panic!("expected catalog");
        };
        assert_eq!(args.field.as_deref(), Some("mega_feature"));

        let cli = Cli::try_parse_from(["cdoc", "convert", "--legacy", "See foo()."])
            .expect("cli should parse");
        let Commands::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert!(args.legacy);
        assert_eq!(args.text.as_deref(), Some("See foo()."));
    }
}
