//! Pattern-based extraction for JavaScript and TypeScript
//!
//! Approximate by construction: function and method bodies end at the first
//! closing brace, so nested blocks cut them short, and constructs split across
//! unusual brace placement can be merged or missed. Class bodies are delimited
//! by counting braces without regard to strings or comments. Bodies are kept
//! as raw text and never re-parsed.

use crate::error::ExtractError;
use crate::strategy::{ExtractedFacts, SourceExtractor};
use docgen_core::{ClassInfo, FunctionInfo};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static FUNCTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bfunction\b\s*\*?\s*(\w+)\s*(?:<[^>]*>)?\s*\(([^)]*)\)\s*(?::\s*([^{;]+?)\s*)?\{([^}]*)\}",
    )
    .unwrap()
});

static ARROW_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:const|let|var)\s+(\w+)\s*(?::[^=]+)?=\s*(?:async\s+)?\(([^)]*)\)\s*(?::\s*([^={;]+?)\s*)?=>\s*\{([^}]*)\}",
    )
    .unwrap()
});

static CLASS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bclass\s+(\w+)(?:\s*<[^>{]*>)?(?:\s+extends\s+[\w.]+(?:<[^>{]*>)?)?(?:\s+implements\s+[^{]+?)?\s*\{",
    )
    .unwrap()
});

static METHOD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s*(?:(?:public|private|protected|static|async|readonly|override|get|set)\s+)*\*?\s*(\w+)\s*(?:<[^>]*>)?\s*\(([^)]*)\)\s*(?::\s*([^{;]+?)\s*)?\{([^}]*)\}",
    )
    .unwrap()
});

static IMPORT_FROM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\bimport\s+(?:type\s+)?(?:\{[^}]*\}|\*\s+as\s+\w+|\w+(?:\s*,\s*(?:\{[^}]*\}|\*\s+as\s+\w+))?)\s+from\s+['"]([^'"]+)['"]"#,
    )
    .unwrap()
});

static IMPORT_BARE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bimport\s+['"]([^'"]+)['"]"#).unwrap());

static REQUIRE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());

/// Words the method pattern would otherwise take for method names
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "with", "return", "function",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptPatternExtractor;

impl SourceExtractor for ScriptPatternExtractor {
    fn extract(&self, content: &str) -> Result<ExtractedFacts, ExtractError> {
        let mut functions: Vec<(usize, FunctionInfo)> = FUNCTION_PATTERN
            .captures_iter(content)
            .chain(ARROW_PATTERN.captures_iter(content))
            .filter_map(|caps| Some((caps.get(0)?.start(), function_from(&caps))))
            .collect();
        functions.sort_by_key(|(offset, _)| *offset);

        let classes = CLASS_PATTERN
            .captures_iter(content)
            .filter_map(|caps| {
                let header = caps.get(0)?;
                let body = brace_block(content, header.end());
                Some(ClassInfo {
                    name: caps[1].to_string(),
                    docstring: None,
                    methods: methods_in(body),
                })
            })
            .collect();

        let mut imports: Vec<(usize, String)> = IMPORT_FROM_PATTERN
            .captures_iter(content)
            .chain(IMPORT_BARE_PATTERN.captures_iter(content))
            .chain(REQUIRE_PATTERN.captures_iter(content))
            .filter_map(|caps| Some((caps.get(0)?.start(), caps.get(1)?.as_str().to_string())))
            .collect();
        imports.sort_by_key(|(offset, _)| *offset);

        Ok(ExtractedFacts {
            functions: functions.into_iter().map(|(_, function)| function).collect(),
            classes,
            imports: imports.into_iter().map(|(_, module)| module).collect(),
        })
    }
}

/// Groups: 1 name, 2 parameter list, 3 optional return annotation, 4 body
fn function_from(caps: &Captures) -> FunctionInfo {
    FunctionInfo {
        name: caps[1].to_string(),
        params: parameter_names(&caps[2]),
        docstring: None,
        return_type: caps.get(3).map(|ty| ty.as_str().trim().to_string()),
        body: Some(caps[4].trim().to_string()),
    }
}

fn methods_in(class_body: &str) -> Vec<FunctionInfo> {
    METHOD_PATTERN
        .captures_iter(class_body)
        .filter(|caps| !CONTROL_KEYWORDS.contains(&&caps[1]))
        .map(|caps| function_from(&caps))
        .collect()
}

/// Text from `start` up to the brace closing the one just before it, or to
/// the end of input when it never closes
fn brace_block(content: &str, start: usize) -> &str {
    let mut depth = 1usize;
    for (offset, ch) in content[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return &content[start..start + offset];
                }
            }
            _ => {}
        }
    }
    &content[start..]
}

/// Parameter names without type annotations, defaults or rest dots
fn parameter_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|param| {
            let name = param
                .trim()
                .trim_start_matches("...")
                .split([':', '='])
                .next()
                .unwrap_or_default()
                .trim()
                .trim_end_matches('?');
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
import React, { useState } from 'react';
import * as path from "path";
import './styles.css';
const fs = require('fs');

export function add(a: number, b = 2): number {
  return a + b;
}

const greet = async (name) => {
  console.log(name);
};

class Service extends Base {
  constructor(client) {
    this.client = client;
  }

  async fetch(id, ...rest) {
    if (id) {
      return this.client.get(id);
    }
  }
}
"#;

    #[test]
    fn test_functions_in_source_order() {
        let facts = ScriptPatternExtractor.extract(SAMPLE).unwrap();

        let names: Vec<&str> = facts.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["add", "greet"]);

        let add = &facts.functions[0];
        assert_eq!(add.params, vec!["a", "b"]);
        assert_eq!(add.return_type.as_deref(), Some("number"));
        assert_eq!(add.body.as_deref(), Some("return a + b;"));

        assert_eq!(facts.functions[1].params, vec!["name"]);
    }

    #[test]
    fn test_class_methods() {
        let facts = ScriptPatternExtractor.extract(SAMPLE).unwrap();

        assert_eq!(facts.classes.len(), 1);
        let service = &facts.classes[0];
        assert_eq!(service.name, "Service");

        let methods: Vec<&str> = service.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["constructor", "fetch"]);
        assert_eq!(service.methods[1].params, vec!["id", "rest"]);
    }

    #[test]
    fn test_imports_and_requires() {
        let facts = ScriptPatternExtractor.extract(SAMPLE).unwrap();
        assert_eq!(facts.imports, vec!["react", "path", "./styles.css", "fs"]);
    }

    #[test]
    fn test_malformed_source_is_tolerated() {
        let facts = ScriptPatternExtractor
            .extract("function broken( {\nclass Open {\n  method() {")
            .unwrap();
        assert!(facts.functions.is_empty());
        assert_eq!(facts.classes.len(), 1);
        assert!(facts.classes[0].methods.is_empty());
    }

    #[test]
    fn test_parameter_names() {
        assert_eq!(
            parameter_names(" a , b?: string, ...rest: number[], c = {}"),
            vec!["a", "b", "rest", "c"]
        );
        assert!(parameter_names("").is_empty());
    }
}
