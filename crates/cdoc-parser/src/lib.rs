//! # cdoc-parser
//!
//! Doc-comment extraction for C and C++ sources.
//!
//! - [`extract`] walks a file and pairs each `/** */` block with the
//!   declaration after it
//! - [`backend`] turns those units into [`Symbol`]s, with a tree-sitter
//!   backend and a regex fallback
//! - [`directives`] lifts `:param:`/`:returns:` out of descriptions
//! - [`igt`] merges test metadata from comment blocks and test macros

pub mod backend;
pub mod comment;
pub mod directives;
pub mod error;
pub mod extract;
pub mod igt;
mod members;
pub mod steps;

use std::path::Path;

use cdoc_core::{Language, SourceFile, Symbol};

pub use backend::{AccurateBackend, Backend, ParserBackend, PatternBackend};
pub use comment::clean_comment;
pub use error::{ParseFailure, ParserError};
pub use extract::{CommentUnit, comment_units, doc_blocks};
pub use igt::{TestScan, scan_tests};

/// Symbols parsed from one file, before group assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSymbols {
    pub symbols: Vec<Symbol>,
    /// Units no backend could turn into a symbol.
    pub skipped: usize,
    /// Units the fallback backend parsed after the primary gave up.
    pub fallbacks: usize,
}

/// Parse every documented declaration in `file`.
///
/// Units the backend cannot classify are skipped. When the backend reports
/// itself unavailable for a unit, `fallback` parses that unit instead; with
/// no fallback the unit is skipped.
#[must_use]
pub fn parse_file(
    file: &SourceFile,
    backend: &Backend,
    fallback: Option<&PatternBackend>,
) -> FileSymbols {
    let mut out = FileSymbols::default();

    for unit in comment_units(&file.content, file.language) {
        if unit.declaration.trim().is_empty() {
            continue;
        }
        let parsed = match backend.parse(&unit) {
            Err(ParseFailure::BackendUnavailable(reason)) => match fallback {
                Some(pattern) => {
                    tracing::debug!(
                        file = %file.rel_path,
                        line = unit.decl_line,
                        %reason,
                        "falling back to pattern backend"
                    );
                    out.fallbacks += 1;
                    pattern.parse(&unit)
                }
                None => Err(ParseFailure::BackendUnavailable(reason)),
            },
            other => other,
        };

        match parsed {
            Ok(mut symbol) => {
                symbol.description = clean_comment(unit.comment);
                set_file(&mut symbol, &file.rel_path);
                out.symbols.push(symbol);
            }
            Err(err) => {
                tracing::debug!(
                    file = %file.rel_path,
                    line = unit.decl_line,
                    backend = backend.name(),
                    %err,
                    "skipping comment unit"
                );
                out.skipped += 1;
            }
        }
    }
    out
}

fn set_file(symbol: &mut Symbol, rel_path: &str) {
    rel_path.clone_into(&mut symbol.location.file);
    for member in &mut symbol.members {
        set_file(member, rel_path);
    }
}

/// Read `path` as a source file named `rel_path` within its group.
///
/// # Errors
/// [`ParserError::UnsupportedFile`] when the extension is not C or C++,
/// [`ParserError::Read`] when the file cannot be read as UTF-8 text.
pub fn read_source(path: &Path, rel_path: &str) -> Result<SourceFile, ParserError> {
    if Language::from_path(rel_path).is_none() {
        return Err(ParserError::UnsupportedFile(rel_path.to_string()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| ParserError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(SourceFile::new(rel_path, content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdoc_core::SymbolKind;
    use pretty_assertions::assert_eq;

    const UART: &str = include_str!("../tests/fixtures/uart.c");

    #[test]
    fn pattern_parse_sets_file_and_descriptions() {
        let file = SourceFile::new("drivers/uart.c", UART);
        let parsed = parse_file(&file, &Backend::pattern(), None);

        let names: Vec<_> = parsed
            .symbols
            .iter()
            .map(|s| (s.kind, s.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                (SymbolKind::Macro, "UART_FIFO_DEPTH"),
                (SymbolKind::Struct, "uart_port"),
                (SymbolKind::Function, "uart_open"),
                (SymbolKind::Function, "__uart_flush"),
            ]
        );
        let port = &parsed.symbols[1];
        assert_eq!(port.description, "A serial port.");
        assert!(port.members.iter().all(|m| m.location.file == "drivers/uart.c"));
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.fallbacks, 0);
    }

    #[test]
    fn read_source_rejects_other_extensions() {
        let err = read_source(Path::new("README.md"), "README.md").unwrap_err();
        assert!(matches!(err, ParserError::UnsupportedFile(_)));
    }

    #[test]
    fn read_source_reports_missing_files() {
        let err = read_source(Path::new("/nonexistent/uart.c"), "uart.c").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/uart.c"));
    }
}
