//! Doc comment cleaning.

/// Strip comment decoration from a `/** ... */` block.
///
/// Removes the delimiters (including the `/**<` member form), the leading
/// `*` of each line, blank or ruler lines at either end, and the common
/// indentation of what remains.
#[must_use]
pub fn clean_comment(raw: &str) -> String {
    let body = raw.trim();
    let body = body.strip_prefix("/**").unwrap_or(body);
    let body = body.strip_prefix('<').unwrap_or(body);
    let body = body.strip_suffix("*/").unwrap_or(body);

    let lines: Vec<&str> = body.lines().map(strip_decoration).collect();

    let is_junk = |line: &&str| {
        let t = line.trim();
        t.is_empty() || t.chars().all(|c| matches!(c, '*' | '/' | '=' | '-'))
    };
    let start = lines.iter().position(|l| !is_junk(l)).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !is_junk(l)).map_or(start, |i| i + 1);
    let kept = &lines[start..end];

    let indent = kept
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    kept.iter()
        .map(|l| {
            if l.trim().is_empty() {
                ""
            } else {
                l.get(indent..).unwrap_or(l).trim_end()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remove the ` * ` gutter from one comment line.
fn strip_decoration(line: &str) -> &str {
    let trimmed = line.trim_start();
    match trimmed.strip_prefix('*') {
        Some(rest) if !rest.starts_with('/') => rest.strip_prefix(' ').unwrap_or(rest),
        _ => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn one_liner() {
        assert_eq!(clean_comment("/** Start the engine. */"), "Start the engine.");
        assert_eq!(clean_comment("/**< trailing member doc */"), "trailing member doc");
    }

    #[test]
    fn gutter_and_blank_edges_are_removed() {
        let raw = "/**\n * engine_run:\n * @engine: the engine\n *\n * Runs it.\n */";
        assert_eq!(
            clean_comment(raw),
            "engine_run:\n@engine: the engine\n\nRuns it."
        );
    }

    #[test]
    fn code_indentation_survives_dedent() {
        let raw = "/**\n * Example:\n *\n *     int x = 1;\n *     run(x);\n */";
        assert_eq!(
            clean_comment(raw),
            "Example:\n\n    int x = 1;\n    run(x);"
        );
    }

    #[test]
    fn undecorated_lines_are_dedented() {
        let raw = "/**\n    TEST: kms_addfb\n    Category: Display\n*/";
        assert_eq!(clean_comment(raw), "TEST: kms_addfb\nCategory: Display");
    }

    #[test]
    fn ruler_lines_are_dropped() {
        let raw = "/**\n * ==========\n * Title\n * ==========\n */";
        assert_eq!(clean_comment(raw), "Title");
    }
}
