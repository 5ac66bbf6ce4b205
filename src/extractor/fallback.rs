//! Regex/indentation fallback extraction for Python.
//!
//! Used when no grammar path is usable (or when explicitly forced), this
//! extractor implements the same contract as the grammar-backed one from
//! line-oriented heuristics. Output is best-effort: nested functions are not
//! distinguished from top-level ones, multi-line signatures and default
//! values containing parentheses truncate the captured parameter text, and
//! only triple-double-quoted docstrings are recognized. Callers needing full
//! fidelity should prefer the grammar path.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::classify::{self, Candidate, ClassRange, Placement};
use crate::docstring;
use crate::error::Result;
use crate::extractor::StructuralExtractor;
use crate::language::Language;
use crate::model::{Class, Function, Module};

static FUNCTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"def\s+([a-zA-Z_][a-zA-Z0-9_]*)\s*(\([^)]*\))(?:\s*->\s*[^:]+)?\s*:").unwrap()
});

static CLASS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"class\s+([a-zA-Z_][a-zA-Z0-9_]*)\s*(?:\([^)]*\))?\s*:").unwrap());

static DOCSTRING_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?s)"""(.*?)""""#).unwrap());

/// Regex-based structural extractor for Python
#[derive(Debug)]
pub struct FallbackExtractor;

impl FallbackExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FallbackExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuralExtractor for FallbackExtractor {
    fn extract(&self, path: &str, source: &str) -> Result<Module> {
        let mut module = Module::new(path, Language::Python, source);
        let lines: Vec<&str> = source.lines().collect();

        // Module docstring: the first triple-quoted string near the start
        if let Some(m) = DOCSTRING_PATTERN.captures(source) {
            if m.get(0).map(|g| g.start()).unwrap_or(usize::MAX) < 100 {
                module.docstring = Some(docstring::clean(&m[1]));
            }
        }

        // First pass: the class-range table, so indentation heuristics have
        // something to compare against
        let mut ranges: Vec<ClassRange> = Vec::new();
        for (idx, line) in lines.iter().enumerate() {
            let Some(caps) = CLASS_PATTERN.captures(line) else {
                continue;
            };
            let indent = classify::line_indent(line);
            let start_line = idx + 1;
            let end_line = classify::block_end_line(&lines, start_line, indent);

            let body = lines[start_line..end_line.max(start_line)].join("\n");
            let docstring = DOCSTRING_PATTERN
                .captures(&body)
                .map(|m| docstring::clean(&m[1]));

            module.classes.push(Class {
                name: caps[1].to_string(),
                docstring,
                start_line,
                end_line,
                methods: Vec::new(),
            });
            ranges.push(ClassRange {
                name: caps[1].to_string(),
                start_line,
                end_line,
                indent,
            });
        }

        // Second pass: functions, classified with the shared heuristics
        for (idx, line) in lines.iter().enumerate() {
            let Some(caps) = FUNCTION_PATTERN.captures(line) else {
                continue;
            };
            let name = caps[1].to_string();
            let params = caps[2].to_string();
            let indent = classify::line_indent(line);
            let start_line = idx + 1;
            let end_line = classify::block_end_line(&lines, start_line, indent);

            let body = lines[start_line..end_line.max(start_line)].join("\n");
            let docstring = DOCSTRING_PATTERN
                .captures(&body)
                .map(|m| docstring::clean(&m[1]));

            let (has_method_decorator, is_classmethod) = decorator_evidence(&lines, idx);

            let candidate = Candidate {
                name: &name,
                params: &params,
                start_line,
                indent,
                has_method_decorator,
                is_classmethod,
                ancestor_class: None,
            };
            let declares = |class: &str, method: &str| {
                module
                    .class(class)
                    .is_some_and(|c| c.methods.iter().any(|m| m.name == method))
            };
            let placement = classify::classify(&candidate, &ranges, &declares);

            let function = Function {
                name,
                params: classify::normalize_method_params(
                    &params,
                    is_classmethod && matches!(placement, Placement::Method { .. }),
                ),
                body,
                docstring,
                start_line,
                end_line,
                language: Language::Python,
                parent: match &placement {
                    Placement::Method { class } => Some(class.clone()),
                    _ => None,
                },
            };

            match placement {
                Placement::Method { class } => {
                    if let Some(class) = module.classes.iter_mut().find(|c| c.name == class) {
                        class.methods.push(function);
                    }
                }
                Placement::Function => module.functions.push(function),
                Placement::Discarded => {}
            }
        }

        Ok(module)
    }
}

/// Scan the decorator lines directly above a `def` for method markers
fn decorator_evidence(lines: &[&str], def_idx: usize) -> (bool, bool) {
    let mut has_method_decorator = false;
    let mut is_classmethod = false;
    let mut idx = def_idx;
    while idx > 0 {
        let previous = lines[idx - 1].trim();
        if !previous.starts_with('@') {
            break;
        }
        if previous.contains("staticmethod") {
            has_method_decorator = true;
        }
        if previous.contains("classmethod") {
            has_method_decorator = true;
            is_classmethod = true;
        }
        idx -= 1;
    }
    (has_method_decorator, is_classmethod)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(source: &str) -> Module {
        FallbackExtractor::new().extract("<string>", source).unwrap()
    }

    #[test]
    fn test_simple_function() {
        let module = extract("def foo(x, y):\n    \"\"\"doc\"\"\"\n    return x+y\n");
        assert_eq!(module.functions.len(), 1);

        let func = &module.functions[0];
        assert_eq!(func.name, "foo");
        assert_eq!(func.params, "(x, y)");
        assert_eq!(func.docstring.as_deref(), Some("doc"));
    }

    #[test]
    fn test_method_classified_into_class() {
        let module = extract("class A:\n    def method(self, x):\n        pass\n");
        assert_eq!(module.functions.len(), 0);
        assert_eq!(module.classes.len(), 1);

        let class = &module.classes[0];
        assert_eq!(class.name, "A");
        assert_eq!(class.start_line, 1);
        assert_eq!(class.end_line, 3);
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].name, "method");
        assert!(class.start_line < class.methods[0].start_line);
    }

    #[test]
    fn test_module_docstring_near_start() {
        let module = extract("\"\"\"Module doc.\"\"\"\n\ndef f():\n    pass\n");
        assert_eq!(module.docstring.as_deref(), Some("Module doc."));
    }

    #[test]
    fn test_function_after_class_is_standalone() {
        let source = "\
class A:
    def m(self):
        pass

def after(x):
    return x
";
        let module = extract(source);
        assert_eq!(module.functions.len(), 1);
        assert_eq!(module.functions[0].name, "after");
        assert_eq!(module.classes[0].methods.len(), 1);
    }

    #[test]
    fn test_class_docstring() {
        let source = "class A:\n    \"\"\"A thing.\"\"\"\n    def m(self):\n        pass\n";
        let module = extract(source);
        assert_eq!(module.classes[0].docstring.as_deref(), Some("A thing."));
    }

    #[test]
    fn test_decorated_classmethod() {
        let source = "\
class Tool:
    @classmethod
    def create(cls, n):
        pass
";
        let module = extract(source);
        let class = &module.classes[0];
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].name, "create");
        assert_eq!(class.methods[0].params, "(cls, n)");
    }

    #[test]
    fn test_agrees_with_grammar_extractor() {
        use crate::backend::ParserBackend;
        use crate::extractor::grammar::GrammarExtractor;

        let source = "def foo(x, y):\n    \"\"\"doc\"\"\"\n    return x+y\n";
        let backend = ParserBackend::with_fallback_forced(false);
        let grammar_module = GrammarExtractor::new(&backend, Language::Python)
            .unwrap()
            .extract("<string>", source)
            .unwrap();
        let fallback_module = extract(source);

        assert_eq!(grammar_module.functions.len(), 1);
        assert_eq!(fallback_module.functions.len(), 1);

        let g = &grammar_module.functions[0];
        let f = &fallback_module.functions[0];
        assert_eq!(g.name, f.name);
        assert_eq!(g.params, f.params);
        assert_eq!(g.docstring, f.docstring);
    }
}
