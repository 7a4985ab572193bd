//! Tree-sitter backed backend.
//!
//! Each declaration is parsed on its own with the C or C++ grammar from
//! `ast-grep-language`. The grammar is the "external front-end": when the
//! `accurate` feature is off, [`AccurateBackend::new`] reports it missing.
//! A declaration the grammar cannot parse cleanly is reported as
//! [`ParseFailure::BackendUnavailable`] so the caller can fall back for
//! that unit.

use cdoc_core::Symbol;

use super::ParserBackend;
use crate::error::ParseFailure;
use crate::extract::CommentUnit;

#[derive(Debug, Clone, Copy)]
pub struct AccurateBackend {
    _probe: (),
}

impl AccurateBackend {
    /// Probe the front-end.
    ///
    /// # Errors
    /// [`ParseFailure::BackendUnavailable`] when the grammar is not compiled
    /// in or cannot parse a trivial declaration.
    pub fn new() -> Result<Self, ParseFailure> {
        front::probe().map(|()| Self { _probe: () })
    }
}

impl ParserBackend for AccurateBackend {
    fn name(&self) -> &'static str {
        "accurate"
    }

    fn parse(&self, unit: &CommentUnit<'_>) -> Result<Symbol, ParseFailure> {
        front::parse(unit)
    }
}

#[cfg(not(feature = "accurate"))]
mod front {
    use cdoc_core::Symbol;

    use crate::error::ParseFailure;
    use crate::extract::CommentUnit;

    fn missing() -> ParseFailure {
        ParseFailure::BackendUnavailable("accurate backend not compiled in".to_string())
    }

    pub(super) fn probe() -> Result<(), ParseFailure> {
        Err(missing())
    }

    pub(super) fn parse(_unit: &CommentUnit<'_>) -> Result<Symbol, ParseFailure> {
        Err(missing())
    }
}

#[cfg(feature = "accurate")]
mod front {
    use ast_grep_core::Node;
    use ast_grep_language::{LanguageExt, SupportLang};
    use cdoc_core::{Language, Location, Param, Symbol, SymbolKind, TypeRef};

    use crate::backend::{
        collapse_ws, last_identifier, normalize_type, return_type, signature_text,
    };
    use crate::comment::clean_comment;
    use crate::error::ParseFailure;
    use crate::extract::CommentUnit;

    const fn grammar(language: Language) -> SupportLang {
        match language {
            Language::C => SupportLang::C,
            Language::Cpp => SupportLang::Cpp,
        }
    }

    pub(super) fn probe() -> Result<(), ParseFailure> {
        let root = SupportLang::C.ast_grep("int probe;");
        let tu = root.root();
        if tu.kind().as_ref() == "translation_unit" && !has_error(&tu) {
            Ok(())
        } else {
            Err(ParseFailure::BackendUnavailable(
                "C grammar failed to parse a trivial declaration".to_string(),
            ))
        }
    }

    pub(super) fn parse(unit: &CommentUnit<'_>) -> Result<Symbol, ParseFailure> {
        let decl = unit.declaration.trim();
        if decl.is_empty() {
            return Err(ParseFailure::Unclassified);
        }
        let mut text = decl.to_string();
        if text.starts_with('#') {
            text.push('\n');
        } else if !text.ends_with(';') && !text.ends_with('}') {
            // Function definitions arrive as their head only.
            text.push(';');
        }

        let root = grammar(unit.language).ast_grep(&text);
        let tu = root.root();
        if has_error(&tu) {
            return Err(ParseFailure::BackendUnavailable(format!(
                "front-end could not parse declaration at line {}",
                unit.decl_line
            )));
        }
        let node = tu
            .children()
            .find(|c| c.kind().as_ref() != "comment")
            .ok_or(ParseFailure::Unclassified)?;

        let ctx = Ctx {
            base_line: unit.decl_line,
            signature: signature_text(decl),
        };
        ctx.symbol(&node)
    }

    fn has_error<D: ast_grep_core::Doc>(node: &Node<D>) -> bool {
        node.kind().as_ref() == "ERROR" || node.children().any(|c| has_error(&c))
    }

    /// Per-unit state shared by the node handlers.
    struct Ctx {
        base_line: u32,
        signature: String,
    }

    impl Ctx {
        fn line<D: ast_grep_core::Doc>(&self, node: &Node<D>) -> u32 {
            self.base_line + u32::try_from(node.start_pos().line()).unwrap_or(0)
        }

        fn new_symbol<D: ast_grep_core::Doc>(
            &self,
            kind: SymbolKind,
            name: &str,
            node: &Node<D>,
        ) -> Symbol {
            Symbol::new(kind, name, Location::new("", self.line(node)))
                .with_signature(self.signature.clone())
        }

        fn symbol<D: ast_grep_core::Doc>(&self, node: &Node<D>) -> Result<Symbol, ParseFailure> {
            match node.kind().as_ref() {
                "preproc_def" | "preproc_function_def" => self.define(node),
                "declaration" | "field_declaration" | "function_definition" => {
                    self.declaration(node)
                }
                "type_definition" => self.typedef(node),
                "struct_specifier" | "union_specifier" | "enum_specifier" | "class_specifier" => {
                    self.aggregate(node).ok_or(ParseFailure::Unclassified)
                }
                "template_declaration" => node
                    .children()
                    .find(|c| {
                        matches!(
                            c.kind().as_ref(),
                            "declaration"
                                | "function_definition"
                                | "class_specifier"
                                | "struct_specifier"
                                | "type_definition"
                        )
                    })
                    .ok_or(ParseFailure::Unclassified)
                    .and_then(|inner| self.symbol(&inner)),
                _ => Err(ParseFailure::Unclassified),
            }
        }

        fn define<D: ast_grep_core::Doc>(&self, node: &Node<D>) -> Result<Symbol, ParseFailure> {
            let name = node.field("name").ok_or(ParseFailure::Unclassified)?;
            let mut symbol = self.new_symbol(SymbolKind::Macro, &name.text(), node);
            if let Some(params) = node.field("parameters") {
                symbol.params = params
                    .children()
                    .filter(|c| c.kind().as_ref() == "identifier" || c.text() == "...")
                    .map(|c| Param::new(c.text().to_string(), None))
                    .collect();
            }
            Ok(symbol)
        }

        fn declaration<D: ast_grep_core::Doc>(
            &self,
            node: &Node<D>,
        ) -> Result<Symbol, ParseFailure> {
            let ty = node.field("type");
            let Some(declarator) = node.field("declarator") else {
                // `struct engine;` or `struct engine { ... };`
                return ty
                    .and_then(|t| self.aggregate(&t))
                    .ok_or(ParseFailure::Unclassified);
            };

            // A tagged aggregate with a body is documented as the type.
            if let Some(t) = &ty
                && is_aggregate(t)
                && t.field("name").is_some()
                && t.field("body").is_some()
                && let Some(symbol) = self.aggregate(t)
            {
                return Ok(symbol);
            }

            let decl = Declarator::unwrap(declarator);
            if decl.name.is_empty() {
                return Err(ParseFailure::Unclassified);
            }
            match (&decl.function, decl.fn_pointer) {
                (Some(func), false) => {
                    let mut symbol = self.new_symbol(SymbolKind::Function, &decl.name, node);
                    symbol.params = params(func);
                    symbol.return_type = ty
                        .as_ref()
                        .and_then(|t| return_type_of(node, t, decl.pointers));
                    Ok(symbol)
                }
                (Some(_), true) => Ok(self.new_symbol(SymbolKind::Variable, &decl.name, node)),
                (None, _) => {
                    let is_const = node
                        .children()
                        .any(|c| c.kind().as_ref() == "type_qualifier" && c.text() == "const");
                    let kind = if is_const && decl.pointers == 0 {
                        SymbolKind::Constant
                    } else {
                        SymbolKind::Variable
                    };
                    Ok(self.new_symbol(kind, &decl.name, node))
                }
            }
        }

        fn typedef<D: ast_grep_core::Doc>(&self, node: &Node<D>) -> Result<Symbol, ParseFailure> {
            let declarator = node.field("declarator").ok_or(ParseFailure::Unclassified)?;
            let decl = Declarator::unwrap(declarator);
            if decl.name.is_empty() {
                return Err(ParseFailure::Unclassified);
            }
            let mut symbol = self.new_symbol(SymbolKind::Typedef, &decl.name, node);
            let ty = node.field("type");
            if let (Some(func), true) = (&decl.function, decl.fn_pointer) {
                symbol.params = params(func);
                symbol.return_type = ty.as_ref().and_then(|t| return_type_of(node, t, 0));
            } else if let Some(t) = &ty
                && let Some(body) = t.field("body")
            {
                symbol.members = self.members(&body, t.kind().as_ref(), &decl.name);
            }
            Ok(symbol)
        }

        fn aggregate<D: ast_grep_core::Doc>(&self, node: &Node<D>) -> Option<Symbol> {
            let kind = match node.kind().as_ref() {
                "struct_specifier" => SymbolKind::Struct,
                "union_specifier" => SymbolKind::Union,
                "enum_specifier" => SymbolKind::Enum,
                "class_specifier" => SymbolKind::Class,
                _ => return None,
            };
            let name = node.field("name")?.text().to_string();
            let mut symbol = self.new_symbol(kind, &name, node);
            if let Some(body) = node.field("body") {
                symbol.members = self.members(&body, node.kind().as_ref(), &name);
            }
            Some(symbol)
        }

        fn members<D: ast_grep_core::Doc>(
            &self,
            body: &Node<D>,
            specifier: &str,
            owner: &str,
        ) -> Vec<Symbol> {
            let mut items = Vec::new();
            flatten_body(body, &mut items);

            let enum_body = specifier == "enum_specifier";
            let mut members: Vec<Symbol> = Vec::new();
            let mut pending: Option<String> = None;
            // Members emitted by the previous item and the line it ended on.
            let mut previous: Option<(usize, u32)> = None;

            for item in &items {
                let kind = item.kind();
                if kind.as_ref() == "comment" {
                    let text = item.text();
                    if !text.starts_with("/**") || text.starts_with("/**/") {
                        continue;
                    }
                    let doc = clean_comment(&text);
                    match previous {
                        Some((from, end_line))
                            if text.starts_with("/**<") || self.line(item) == end_line =>
                        {
                            for m in &mut members[from..] {
                                m.description.clone_from(&doc);
                            }
                        }
                        _ => pending = Some(doc),
                    }
                    continue;
                }

                let from = members.len();
                if enum_body {
                    if kind.as_ref() != "enumerator" {
                        continue;
                    }
                    let Some(name) = item.field("name") else {
                        continue;
                    };
                    let mut m = self.new_symbol(SymbolKind::Constant, &name.text(), item);
                    m.signature = collapse_ws(&item.text());
                    members.push(m);
                } else if matches!(
                    kind.as_ref(),
                    "field_declaration" | "declaration" | "function_definition"
                ) {
                    self.fields(item, owner, &mut members);
                } else {
                    continue;
                }

                let inner_doc = inner_doc(item);
                let doc = inner_doc.or_else(|| pending.take());
                for m in &mut members[from..] {
                    m.owner.get_or_insert_with(|| owner.to_string());
                    if m.description.is_empty()
                        && let Some(doc) = &doc
                    {
                        m.description.clone_from(doc);
                    }
                }
                let end_line =
                    self.base_line + u32::try_from(item.end_pos().line()).unwrap_or(0);
                previous = Some((from, end_line));
            }
            for m in &mut members {
                m.owner.get_or_insert_with(|| owner.to_string());
            }
            members
        }

        fn fields<D: ast_grep_core::Doc>(
            &self,
            item: &Node<D>,
            owner: &str,
            members: &mut Vec<Symbol>,
        ) {
            let declarators: Vec<_> = item
                .children()
                .filter(|c| is_declarator(c.kind().as_ref()))
                .collect();
            if declarators.is_empty() {
                // Anonymous struct/union: its members belong to the owner.
                if let Some(t) = item.field("type")
                    && is_aggregate(&t)
                    && let Some(body) = t.field("body")
                {
                    members.extend(self.members(&body, t.kind().as_ref(), owner));
                }
                return;
            }
            let signature = signature_text(&item.text());
            for declarator in declarators {
                let decl = Declarator::unwrap(declarator);
                if decl.name.is_empty() {
                    continue;
                }
                let mut m = self.new_symbol(SymbolKind::Member, &decl.name, item);
                m.signature.clone_from(&signature);
                members.push(m);
            }
        }
    }

    /// Body children, with preprocessor conditionals opened up.
    fn flatten_body<'r, D: ast_grep_core::Doc>(node: &Node<'r, D>, out: &mut Vec<Node<'r, D>>) {
        for child in node.children() {
            if child.kind().as_ref().starts_with("preproc_if")
                || matches!(child.kind().as_ref(), "preproc_else" | "preproc_elif")
            {
                flatten_body(&child, out);
            } else {
                out.push(child);
            }
        }
    }

    /// A doc comment inside one member declaration.
    fn inner_doc<D: ast_grep_core::Doc>(item: &Node<D>) -> Option<String> {
        item.children()
            .find(|c| c.kind().as_ref() == "comment" && c.text().starts_with("/**"))
            .map(|c| clean_comment(&c.text()))
    }

    fn is_aggregate<D: ast_grep_core::Doc>(node: &Node<D>) -> bool {
        matches!(
            node.kind().as_ref(),
            "struct_specifier" | "union_specifier" | "enum_specifier" | "class_specifier"
        )
    }

    fn is_declarator(kind: &str) -> bool {
        matches!(
            kind,
            "identifier"
                | "field_identifier"
                | "pointer_declarator"
                | "array_declarator"
                | "function_declarator"
                | "parenthesized_declarator"
                | "init_declarator"
                | "attributed_declarator"
                | "reference_declarator"
        )
    }

    /// A declarator chain reduced to what the symbol needs.
    struct Declarator<'r, D: ast_grep_core::Doc> {
        name: String,
        pointers: u8,
        function: Option<Node<'r, D>>,
        fn_pointer: bool,
    }

    impl<'r, D: ast_grep_core::Doc> Declarator<'r, D> {
        fn unwrap(node: Node<'r, D>) -> Self {
            let mut pointers = 0u8;
            let mut cur = node;
            loop {
                let next = match cur.kind().as_ref() {
                    "pointer_declarator" => {
                        pointers = pointers.saturating_add(1);
                        cur.field("declarator")
                    }
                    "init_declarator" | "array_declarator" | "attributed_declarator"
                    | "reference_declarator" => cur
                        .field("declarator")
                        .or_else(|| cur.children().find(|c| is_declarator(c.kind().as_ref()))),
                    "parenthesized_declarator" => {
                        cur.children().find(|c| is_declarator(c.kind().as_ref()))
                    }
                    "function_declarator" => {
                        let inner = cur.field("declarator");
                        let fn_pointer = inner
                            .as_ref()
                            .is_some_and(|i| i.kind().as_ref() == "parenthesized_declarator");
                        let name = inner.map_or_else(String::new, |i| {
                            if fn_pointer {
                                Self::unwrap(i).name
                            } else {
                                ident_of(&i.text())
                            }
                        });
                        return Self {
                            name,
                            pointers,
                            function: Some(cur),
                            fn_pointer,
                        };
                    }
                    _ => None,
                };
                match next {
                    Some(n) => cur = n,
                    None => {
                        return Self {
                            name: ident_of(&cur.text()),
                            pointers,
                            function: None,
                            fn_pointer: false,
                        };
                    }
                }
            }
        }
    }

    fn ident_of(text: &str) -> String {
        last_identifier(text).map_or_else(String::new, |(s, e)| text[s..e].to_string())
    }

    /// Return type from the declaration's qualifiers, type node and pointer depth.
    fn return_type_of<D: ast_grep_core::Doc>(
        node: &Node<D>,
        ty: &Node<D>,
        pointers: u8,
    ) -> Option<TypeRef> {
        let mut text: Vec<String> = node
            .children()
            .filter(|c| c.kind().as_ref() == "type_qualifier")
            .map(|c| c.text().to_string())
            .collect();
        text.push(ty.text().to_string());
        let mut joined = text.join(" ");
        for _ in 0..pointers {
            joined.push_str(" *");
        }
        return_type(&joined)
    }

    /// Parameters from a `function_declarator`.
    fn params<D: ast_grep_core::Doc>(func: &Node<D>) -> Vec<Param> {
        let Some(list) = func.field("parameters") else {
            return Vec::new();
        };
        let decls: Vec<_> = list
            .children()
            .filter(|c| {
                matches!(
                    c.kind().as_ref(),
                    "parameter_declaration"
                        | "optional_parameter_declaration"
                        | "variadic_parameter"
                        | "variadic_parameter_declaration"
                )
            })
            .collect();
        if decls.len() == 1 && collapse_ws(&decls[0].text()) == "void" {
            return Vec::new();
        }
        decls.iter().map(param).collect()
    }

    fn param<D: ast_grep_core::Doc>(node: &Node<D>) -> Param {
        if node.kind().as_ref() == "variadic_parameter" || node.text() == "..." {
            return Param::new("...", None);
        }
        let text = node.text().to_string();
        let Some(name_node) = node.field("declarator").and_then(|d| innermost_identifier(&d))
        else {
            return Param::new("", Some(normalize_type(&text)));
        };
        let base = node.range().start;
        let range = name_node.range();
        let (start, end) = (range.start - base, range.end - base);
        let ty = format!("{}{}", &text[..start], &text[end..]);
        let is_fn_pointer = ty.contains("(*");
        let ty = if is_fn_pointer {
            collapse_ws(&ty)
        } else {
            normalize_type(&ty).replace(" [", "[")
        };
        Param::new(name_node.text().to_string(), Some(ty))
    }

    fn innermost_identifier<'r, D: ast_grep_core::Doc>(node: &Node<'r, D>) -> Option<Node<'r, D>> {
        if node.kind().as_ref() == "identifier" {
            return Some(node.clone());
        }
        let next = node
            .field("declarator")
            .or_else(|| node.children().find(|c| is_declarator(c.kind().as_ref())))?;
        innermost_identifier(&next)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::backend::{ParserBackend, PatternBackend};
        use pretty_assertions::assert_eq;
        use rstest::rstest;

        fn unit(declaration: &str) -> CommentUnit<'_> {
            CommentUnit {
                comment: "/** doc */",
                declaration,
                line: 1,
                decl_line: 5,
                language: Language::C,
            }
        }

        #[test]
        fn probe_succeeds() {
            assert!(probe().is_ok());
        }

        #[rstest]
        #[case("int engine_run(struct engine *e);")]
        #[case("static inline char *engine_name(const struct engine *e)")]
        #[case("struct engine *engine_new(void);")]
        #[case("struct engine_config {\n int threads;\n};")]
        #[case("union value { int i; float f; };")]
        #[case("enum engine_status { ENGINE_OK, ENGINE_ERR };")]
        #[case("typedef struct engine engine_t;")]
        #[case("typedef struct { int a; } pair_t;")]
        #[case("typedef int (*engine_cb)(void *ctx, int code);")]
        #[case("#define ENGINE_MAX 16")]
        #[case("#define ENGINE_MIN(a, b) ((a) < (b) ? (a) : (b))")]
        #[case("extern int engine_debug;")]
        #[case("static const int engine_limit = 4;")]
        #[case("void (*engine_hook)(int);")]
        #[case("struct engine;")]
        #[case("struct { int x; } engine_origin;")]
        fn agrees_with_pattern_backend(#[case] decl: &str) {
            let accurate = parse(&unit(decl)).expect("accurate parse");
            let pattern = PatternBackend::new().parse(&unit(decl)).expect("pattern parse");
            assert_eq!(
                (accurate.kind, accurate.name.as_str()),
                (pattern.kind, pattern.name.as_str())
            );
        }

        #[test]
        fn exact_param_types_and_return() {
            let symbol = parse(&unit("const char **engine_tags(struct engine *e, size_t *count);"))
                .unwrap();
            assert_eq!(symbol.kind, SymbolKind::Function);
            let ret = symbol.return_type.expect("return type");
            assert_eq!((ret.base.as_str(), ret.pointers), ("const char", 2));
            let params: Vec<_> = symbol
                .params
                .iter()
                .map(|p| (p.name.as_str(), p.type_text.as_deref()))
                .collect();
            assert_eq!(
                params,
                vec![("e", Some("struct engine *")), ("count", Some("size_t *"))]
            );
            assert_eq!(symbol.location.line, 5);
        }

        #[test]
        fn members_carry_docs_and_lines() {
            let decl = "struct engine_config {\n    /** Worker count. */\n    int threads;\n    const char *name; /**< Display name. */\n};";
            let symbol = parse(&unit(decl)).unwrap();
            let members: Vec<_> = symbol
                .members
                .iter()
                .map(|m| (m.name.as_str(), m.description.as_str(), m.location.line))
                .collect();
            assert_eq!(
                members,
                vec![("threads", "Worker count.", 7), ("name", "Display name.", 8)]
            );
        }

        #[test]
        fn enumerators_are_constants() {
            let symbol = parse(&unit(
                "enum engine_status {\n    ENGINE_OK = 0, /**< Fine. */\n    ENGINE_ERR\n};",
            ))
            .unwrap();
            let names: Vec<_> = symbol
                .members
                .iter()
                .map(|m| (m.kind, m.name.as_str(), m.description.as_str()))
                .collect();
            assert_eq!(
                names,
                vec![
                    (SymbolKind::Constant, "ENGINE_OK", "Fine."),
                    (SymbolKind::Constant, "ENGINE_ERR", ""),
                ]
            );
        }

        #[test]
        fn broken_declaration_is_unavailable() {
            let err = parse(&unit("int ) engine_run ( struct ;")).unwrap_err();
            assert!(matches!(err, ParseFailure::BackendUnavailable(_)));
        }
    }
}
