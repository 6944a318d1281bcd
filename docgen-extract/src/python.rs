//! Grammar-aware extraction for Python sources
//!
//! Parses with tree-sitter and walks the concrete syntax tree. Any syntax
//! error in the file rejects the whole file.

use crate::error::ExtractError;
use crate::strategy::{ExtractedFacts, SourceExtractor};
use docgen_core::{ClassInfo, FunctionInfo};
use tree_sitter::{Language, Node, Parser};

#[derive(Debug, Default, Clone, Copy)]
pub struct PythonExtractor;

impl SourceExtractor for PythonExtractor {
    fn extract(&self, content: &str) -> Result<ExtractedFacts, ExtractError> {
        let language: Language = tree_sitter_python::LANGUAGE.into();
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| ExtractError::Grammar(e.to_string()))?;

        let tree = parser.parse(content, None).ok_or(ExtractError::NoTree)?;
        let root = tree.root_node();

        if root.has_error() {
            let position = first_error(root)
                .map(|node| node.start_position())
                .unwrap_or_else(|| root.start_position());
            return Err(ExtractError::Syntax {
                line: position.row + 1,
                column: position.column + 1,
            });
        }

        let source = content.as_bytes();
        let mut facts = ExtractedFacts::default();

        // Pre-order walk with an explicit stack; deeply nested code must not
        // exhaust the thread stack.
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match node.kind() {
                "function_definition" => facts.functions.push(function_info(node, source)),
                "class_definition" => facts.classes.push(class_info(node, source)),
                "import_statement" => facts.imports.extend(plain_imports(node, source)),
                "import_from_statement" => facts.imports.extend(from_imports(node, source)),
                _ => {}
            }

            let mut cursor = node.walk();
            let children: Vec<Node> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }

        Ok(facts)
    }
}

fn text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or_default()
}

fn first_error(root: Node) -> Option<Node> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<Node> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    None
}

fn function_info(node: Node, source: &[u8]) -> FunctionInfo {
    FunctionInfo {
        name: node
            .child_by_field_name("name")
            .map(|name| text(name, source).to_string())
            .unwrap_or_default(),
        params: node
            .child_by_field_name("parameters")
            .map(|params| parameter_names(params, source))
            .unwrap_or_default(),
        docstring: docstring(node.child_by_field_name("body"), source),
        return_type: return_type(node, source),
        body: None,
    }
}

fn class_info(node: Node, source: &[u8]) -> ClassInfo {
    let body = node.child_by_field_name("body");
    let mut methods = Vec::new();

    if let Some(body) = body {
        let mut cursor = body.walk();
        for statement in body.named_children(&mut cursor) {
            let definition = match statement.kind() {
                "function_definition" => Some(statement),
                "decorated_definition" => statement
                    .child_by_field_name("definition")
                    .filter(|inner| inner.kind() == "function_definition"),
                _ => None,
            };
            if let Some(definition) = definition {
                methods.push(function_info(definition, source));
            }
        }
    }

    ClassInfo {
        name: node
            .child_by_field_name("name")
            .map(|name| text(name, source).to_string())
            .unwrap_or_default(),
        docstring: docstring(body, source),
        methods,
    }
}

/// Names of the positional-or-keyword parameters, up to the first `*`.
/// Positional-only parameters before `/` are not included.
fn parameter_names(params: Node, source: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = params.walk();

    for param in params.named_children(&mut cursor) {
        let name = match param.kind() {
            "identifier" => Some(param),
            "typed_parameter" => match param.named_child(0) {
                Some(inner) if inner.kind() == "identifier" => Some(inner),
                _ => break,
            },
            "default_parameter" | "typed_default_parameter" => {
                param.child_by_field_name("name")
            }
            "positional_separator" => {
                names.clear();
                None
            }
            "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => break,
            _ => None,
        };
        if let Some(name) = name {
            names.push(text(name, source).to_string());
        }
    }

    names
}

/// A plain name or a single-level subscript of plain names; anything else
/// yields no hint
fn return_type(node: Node, source: &[u8]) -> Option<String> {
    let annotation = node.child_by_field_name("return_type")?;
    simple_annotation(unwrap_type(annotation)?, source)
}

fn unwrap_type(node: Node) -> Option<Node> {
    if node.kind() == "type" {
        node.named_child(0)
    } else {
        Some(node)
    }
}

fn simple_annotation(node: Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" => Some(text(node, source).to_string()),
        "generic_type" => {
            let base = node.named_child(0).filter(|n| n.kind() == "identifier")?;
            let parameters = node
                .named_child(1)
                .filter(|n| n.kind() == "type_parameter")?;
            if parameters.named_child_count() != 1 {
                return None;
            }
            let argument = unwrap_type(parameters.named_child(0)?)?;
            (argument.kind() == "identifier")
                .then(|| format!("{}[{}]", text(base, source), text(argument, source)))
        }
        "subscript" => {
            let value = node
                .child_by_field_name("value")
                .filter(|n| n.kind() == "identifier")?;
            let mut cursor = node.walk();
            let subscripts: Vec<Node> = node
                .children_by_field_name("subscript", &mut cursor)
                .collect();
            match subscripts.as_slice() {
                [only] if only.kind() == "identifier" => Some(format!(
                    "{}[{}]",
                    text(value, source),
                    text(*only, source)
                )),
                _ => None,
            }
        }
        _ => None,
    }
}

/// First statement of a body when it is a string literal
fn docstring(body: Option<Node>, source: &[u8]) -> Option<String> {
    let body = body?;
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|statement| statement.kind() != "comment")?;

    if first.kind() != "expression_statement" {
        return None;
    }
    let literal = first.named_child(0)?;
    if literal.kind() != "string" {
        return None;
    }

    Some(clean_docstring(strip_string_quotes(text(literal, source))))
}

fn strip_string_quotes(literal: &str) -> &str {
    let unprefixed = literal.trim_start_matches(|c: char| "rRuUbB".contains(c));
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if unprefixed.len() >= quote.len() * 2
            && unprefixed.starts_with(quote)
            && unprefixed.ends_with(quote)
        {
            return &unprefixed[quote.len()..unprefixed.len() - quote.len()];
        }
    }
    unprefixed
}

/// Remove the common indentation of continuation lines and surrounding blank
/// lines
fn clean_docstring(raw: &str) -> String {
    let mut lines = raw.lines();
    let first = lines.next().unwrap_or_default().trim().to_string();
    let rest: Vec<&str> = lines.collect();

    let indent = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<String> = std::iter::once(first)
        .chain(rest.iter().map(|line| {
            line.get(indent..)
                .unwrap_or_else(|| line.trim_start())
                .trim_end()
                .to_string()
        }))
        .collect();

    while cleaned.last().is_some_and(|line| line.is_empty()) {
        cleaned.pop();
    }
    while cleaned.first().is_some_and(|line| line.is_empty()) {
        cleaned.remove(0);
    }

    cleaned.join("\n")
}

/// `import a.b, c as d` yields `a.b` and `c`
fn plain_imports(node: Node, source: &[u8]) -> Vec<String> {
    let mut cursor = node.walk();
    node.children_by_field_name("name", &mut cursor)
        .filter_map(|name| imported_name(name, source))
        .collect()
}

/// `from m import x, y` yields `m.x` and `m.y`; relative modules keep their dots
fn from_imports(node: Node, source: &[u8]) -> Vec<String> {
    let module = node
        .child_by_field_name("module_name")
        .map(|module| text(module, source).to_string())
        .unwrap_or_default();

    let join = |name: &str| {
        if module.is_empty() || module.ends_with('.') {
            format!("{}{}", module, name)
        } else {
            format!("{}.{}", module, name)
        }
    };

    let mut cursor = node.walk();
    let mut imports: Vec<String> = node
        .children_by_field_name("name", &mut cursor)
        .filter_map(|name| imported_name(name, source))
        .map(|name| join(&name))
        .collect();

    let mut cursor = node.walk();
    let has_wildcard = node
        .named_children(&mut cursor)
        .any(|child| child.kind() == "wildcard_import");
    if has_wildcard {
        imports.push(join("*"));
    }

    imports
}

fn imported_name(node: Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "dotted_name" | "identifier" => Some(text(node, source).to_string()),
        "aliased_import" => node
            .child_by_field_name("name")
            .map(|name| text(name, source).to_string()),
        _ => None,
    }
}
