//! Grammar-backed structural extraction on tree-sitter.
//!
//! Extraction order mirrors the contract: module docstring, classes (with
//! the Python indentation-based `end_line` tightening), the dedicated Python
//! method pass, then the general function pass whose leftovers go through
//! the shared classification heuristics.

use std::collections::{HashMap, HashSet};

use log::debug;
use tree_sitter::{Language as Grammar, Node, Parser, QueryCursor, StreamingIterator};

use crate::backend::ParserBackend;
use crate::classify::{self, Candidate, ClassRange, Placement};
use crate::docstring;
use crate::error::{Error, Result};
use crate::extractor::StructuralExtractor;
use crate::language::Language;
use crate::model::{Class, Function, Module};
use crate::queries::{self, CaptureKind, StructureQuery};

/// Structural extractor backed by a tree-sitter grammar
#[derive(Debug)]
pub struct GrammarExtractor {
    language: Language,
    grammar: Grammar,
}

/// What encloses a function definition, ignoring blocks and decorator
/// wrappers on the way up
enum Enclosing {
    TopLevel,
    Class(String),
    Function,
}

/// Captures of one function or method definition, merged across the plain
/// and decorated query alternations
struct FnCapture<'t> {
    def: Node<'t>,
    name: Option<Node<'t>>,
    params: Option<Node<'t>>,
    body: Option<Node<'t>>,
    decorators: Vec<Node<'t>>,
}

impl GrammarExtractor {
    pub fn new(backend: &ParserBackend, language: Language) -> Result<Self> {
        let grammar = backend
            .grammar(language)
            .ok_or_else(|| Error::GrammarUnavailable {
                language: language.name().to_string(),
            })?;
        Ok(Self { language, grammar })
    }

    fn extract_classes(
        &self,
        query: &StructureQuery,
        root: Node,
        source: &str,
        lines: &[&str],
        module: &mut Module,
    ) {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query.query(), root, source.as_bytes());
        let mut seen = HashSet::new();

        while let Some(m) = matches.next() {
            let mut def = None;
            let mut name = None;
            let mut body = None;
            for capture in m.captures {
                match query.kind_of(capture.index) {
                    Some(CaptureKind::ClassDef) => def = Some(capture.node),
                    Some(CaptureKind::Name) => name = Some(capture.node),
                    Some(CaptureKind::Body) => body = Some(capture.node),
                    Some(CaptureKind::FunctionDef)
                    | Some(CaptureKind::Decorator)
                    | Some(CaptureKind::Params)
                    | None => {}
                }
            }

            let (Some(def), Some(name)) = (def, name) else {
                continue;
            };
            // Plain and decorated alternations both capture the inner
            // class_definition node
            if !seen.insert(def.id()) {
                continue;
            }

            let start_line = def.start_position().row + 1;
            let mut end_line = def.end_position().row + 1;
            if self.language == Language::Python {
                // The syntax-tree span can include a trailing orphan blank
                // region; tighten from indentation instead
                let header_indent = lines
                    .get(start_line - 1)
                    .map(|l| classify::line_indent(l))
                    .unwrap_or(0);
                end_line = classify::block_end_line(lines, start_line, header_indent);
            }

            module.classes.push(Class {
                name: node_text(name, source).to_string(),
                docstring: body.and_then(|b| extract_docstring(b, source)),
                start_line,
                end_line,
                methods: Vec::new(),
            });
        }

        module.classes.sort_by_key(|c| c.start_line);
    }

    /// The dedicated Python method pass: function definitions sitting
    /// directly inside a class body are methods, no heuristics involved.
    fn extract_methods(
        &self,
        query: &StructureQuery,
        root: Node,
        source: &str,
        module: &mut Module,
        method_nodes: &mut HashSet<usize>,
    ) {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query.query(), root, source.as_bytes());

        while let Some(m) = matches.next() {
            let Some(capture) = group_fn_captures(query, m.captures) else {
                continue;
            };
            if !method_nodes.insert(capture.def.id()) {
                continue;
            }

            let Enclosing::Class(class_name) = enclosing_definition(capture.def, source) else {
                debug!("Method capture without class ancestor; skipping");
                continue;
            };

            let is_classmethod = decorators_contain(&capture.decorators, source, "classmethod");
            let function = self.build_function(&capture, source, Some(class_name.clone()), is_classmethod);

            match module.classes.iter_mut().find(|c| c.name == class_name) {
                Some(class) => class.methods.push(function),
                None => debug!("No class '{}' recorded for method '{}'", class_name, function.name),
            }
        }
    }

    /// The general function pass. Candidates already placed by the method
    /// pass are skipped; the rest go through the shared heuristics.
    fn extract_functions(
        &self,
        query: &StructureQuery,
        root: Node,
        source: &str,
        lines: &[&str],
        method_nodes: &HashSet<usize>,
        module: &mut Module,
    ) {
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query.query(), root, source.as_bytes());

        // Merge the plain and decorated alternations by definition node
        let mut candidates: HashMap<usize, FnCapture> = HashMap::new();
        while let Some(m) = matches.next() {
            let Some(capture) = group_fn_captures(query, m.captures) else {
                continue;
            };
            candidates
                .entry(capture.def.id())
                .and_modify(|existing| {
                    existing.decorators.extend(capture.decorators.iter().copied());
                })
                .or_insert(capture);
        }

        let mut ordered: Vec<FnCapture> = candidates.into_values().collect();
        ordered.sort_by_key(|c| c.def.start_position().row);

        let class_ranges: Vec<ClassRange> = module
            .classes
            .iter()
            .map(|class| ClassRange {
                name: class.name.clone(),
                start_line: class.start_line,
                end_line: class.end_line,
                indent: lines
                    .get(class.start_line - 1)
                    .map(|l| classify::line_indent(l))
                    .unwrap_or(0),
            })
            .collect();

        for capture in ordered {
            if method_nodes.contains(&capture.def.id()) {
                continue;
            }
            let Some(name_node) = capture.name else {
                continue;
            };

            let ancestor_class = match enclosing_definition(capture.def, source) {
                Enclosing::Class(name) => Some(name),
                Enclosing::TopLevel => None,
                Enclosing::Function => {
                    // Nested functions and closures are out of scope
                    debug!(
                        "Skipping nested function '{}'",
                        node_text(name_node, source)
                    );
                    continue;
                }
            };

            let name = node_text(name_node, source);
            let params = capture.params.map(|p| node_text(p, source)).unwrap_or("");
            let start_line = capture.def.start_position().row + 1;
            let indent = lines
                .get(start_line - 1)
                .map(|l| classify::line_indent(l))
                .unwrap_or(0);
            let has_method_decorator = decorators_contain(&capture.decorators, source, "staticmethod")
                || decorators_contain(&capture.decorators, source, "classmethod");
            let is_classmethod = decorators_contain(&capture.decorators, source, "classmethod");

            let candidate = Candidate {
                name,
                params,
                start_line,
                indent,
                has_method_decorator,
                is_classmethod,
                ancestor_class,
            };

            let declares = |class: &str, method: &str| {
                module
                    .class(class)
                    .is_some_and(|c| c.methods.iter().any(|m| m.name == method))
            };
            let placement = classify::classify(&candidate, &class_ranges, &declares);

            match placement {
                Placement::Method { class } => {
                    let function =
                        self.build_function(&capture, source, Some(class.clone()), is_classmethod);
                    match module.classes.iter_mut().find(|c| c.name == class) {
                        Some(class) => {
                            let duplicate = class
                                .methods
                                .iter()
                                .any(|m| m.name == function.name && m.start_line == function.start_line);
                            if !duplicate {
                                class.methods.push(function);
                            }
                        }
                        None => {
                            debug!("Class '{}' not recorded; keeping '{}' standalone", class, function.name);
                            let mut function = function;
                            function.parent = None;
                            module.functions.push(function);
                        }
                    }
                }
                Placement::Function => {
                    let function = self.build_function(&capture, source, None, false);
                    module.functions.push(function);
                }
                Placement::Discarded => {}
            }
        }
    }

    fn build_function(
        &self,
        capture: &FnCapture,
        source: &str,
        parent: Option<String>,
        is_classmethod: bool,
    ) -> Function {
        let params = capture.params.map(|p| node_text(p, source)).unwrap_or("");
        Function {
            name: capture
                .name
                .map(|n| node_text(n, source).to_string())
                .unwrap_or_default(),
            params: classify::normalize_method_params(params, is_classmethod && parent.is_some()),
            body: capture
                .body
                .map(|b| node_text(b, source).to_string())
                .unwrap_or_default(),
            docstring: capture.body.and_then(|b| extract_docstring(b, source)),
            start_line: capture.def.start_position().row + 1,
            end_line: capture.def.end_position().row + 1,
            language: self.language,
            parent,
        }
    }
}

impl StructuralExtractor for GrammarExtractor {
    fn extract(&self, path: &str, source: &str) -> Result<Module> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.grammar)
            .map_err(|e| Error::parse_failure(path, format!("failed to set language: {e}")))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| Error::parse_failure(path, "parser produced no tree"))?;
        let root = tree.root_node();

        let mut module = Module::new(path, self.language, source);
        if self.language == Language::Python {
            module.docstring = module_docstring(root, source);
        }

        let Some(query_set) = queries::query_set(&self.grammar, self.language) else {
            // Grammar but no structure patterns: docstring-only module
            return Ok(module);
        };

        let lines: Vec<&str> = source.lines().collect();

        self.extract_classes(&query_set.class, root, source, &lines, &mut module);

        let mut method_nodes = HashSet::new();
        if let Some(method_query) = &query_set.method {
            self.extract_methods(method_query, root, source, &mut module, &mut method_nodes);
        }

        self.extract_functions(
            &query_set.function,
            root,
            source,
            &lines,
            &method_nodes,
            &mut module,
        );

        Ok(module)
    }
}

/// Group one query match's captures into a function candidate
fn group_fn_captures<'t>(
    query: &StructureQuery,
    captures: &[tree_sitter::QueryCapture<'t>],
) -> Option<FnCapture<'t>> {
    let mut def = None;
    let mut name = None;
    let mut params = None;
    let mut body = None;
    let mut decorators = Vec::new();

    for capture in captures {
        match query.kind_of(capture.index) {
            Some(CaptureKind::FunctionDef) => def = Some(capture.node),
            Some(CaptureKind::Name) => name = Some(capture.node),
            Some(CaptureKind::Params) => params = Some(capture.node),
            Some(CaptureKind::Body) => body = Some(capture.node),
            Some(CaptureKind::Decorator) => decorators.push(capture.node),
            Some(CaptureKind::ClassDef) | None => {}
        }
    }

    Some(FnCapture {
        def: def?,
        name,
        params,
        body,
        decorators,
    })
}

/// Module docstring: the first top-level expression-statement whose value is
/// a bare string literal, accepted only at or before line 2.
fn module_docstring(root: Node, source: &str) -> Option<String> {
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        if child.kind() != "expression_statement" {
            if child.kind() == "comment" {
                continue;
            }
            return None;
        }
        let mut inner = child.walk();
        for grandchild in child.named_children(&mut inner) {
            if grandchild.kind() == "string" && child.start_position().row <= 1 {
                return Some(docstring::clean(node_text(grandchild, source)));
            }
        }
        return None;
    }
    None
}

/// Docstring of a definition: the first statement in the body, when it is a
/// bare string literal. Comments before it are ignored.
fn extract_docstring(body: Node, source: &str) -> Option<String> {
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        match child.kind() {
            "comment" => continue,
            "expression_statement" => {
                let mut inner = child.walk();
                for grandchild in child.named_children(&mut inner) {
                    if grandchild.kind() == "string" {
                        return Some(docstring::clean(node_text(grandchild, source)));
                    }
                }
                return None;
            }
            "string" => return Some(docstring::clean(node_text(child, source))),
            _ => return None,
        }
    }
    None
}

/// Walk ancestors of a definition, skipping body blocks and decorator
/// wrappers, and report what ultimately encloses it
fn enclosing_definition(node: Node, source: &str) -> Enclosing {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        match ancestor.kind() {
            "block" | "decorated_definition" => current = ancestor.parent(),
            "class_definition" => {
                return match ancestor.child_by_field_name("name") {
                    Some(name) => Enclosing::Class(node_text(name, source).to_string()),
                    None => Enclosing::TopLevel,
                };
            }
            "function_definition" => return Enclosing::Function,
            _ => return Enclosing::TopLevel,
        }
    }
    Enclosing::TopLevel
}

/// Whether any decorator's text mentions a marker such as `classmethod`
fn decorators_contain(decorators: &[Node], source: &str, marker: &str) -> bool {
    decorators
        .iter()
        .any(|node| node_text(*node, source).contains(marker))
}

/// Slice the source text covered by a node
fn node_text<'s>(node: Node, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract_python(source: &str) -> Module {
        let backend = ParserBackend::with_fallback_forced(false);
        let extractor = GrammarExtractor::new(&backend, Language::Python).unwrap();
        extractor.extract("<string>", source).unwrap()
    }

    #[test]
    fn test_simple_function() {
        let module = extract_python("def foo(x, y):\n    \"\"\"doc\"\"\"\n    return x+y\n");
        assert_eq!(module.functions.len(), 1);
        assert_eq!(module.classes.len(), 0);

        let func = &module.functions[0];
        assert_eq!(func.name, "foo");
        assert_eq!(func.params, "(x, y)");
        assert_eq!(func.docstring.as_deref(), Some("doc"));
        assert_eq!(func.start_line, 1);
        assert_eq!(func.end_line, 3);
    }

    #[test]
    fn test_method_never_standalone() {
        let module = extract_python("class A:\n    def method(self, x):\n        pass\n");
        assert_eq!(module.functions.len(), 0);
        assert_eq!(module.classes.len(), 1);

        let class = &module.classes[0];
        assert_eq!(class.name, "A");
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].name, "method");
        assert_eq!(class.methods[0].params, "(self, x)");
        assert_eq!(class.methods[0].parent.as_deref(), Some("A"));
    }

    #[test]
    fn test_module_docstring_on_first_line() {
        let module = extract_python("\"\"\"Module doc.\"\"\"\n\ndef f():\n    pass\n");
        assert_eq!(module.docstring.as_deref(), Some("Module doc."));
    }

    #[test]
    fn test_late_string_is_not_module_docstring() {
        let module = extract_python("x = 1\n\n\"\"\"not a docstring\"\"\"\n");
        assert_eq!(module.docstring, None);
    }

    #[test]
    fn test_class_end_line_tightened() {
        // The trailing function must not be inside the class extent
        let source = "\
class A:
    def m(self):
        pass


def after():
    pass
";
        let module = extract_python(source);
        let class = &module.classes[0];
        assert_eq!(class.start_line, 1);
        assert_eq!(class.end_line, 3);
        assert!(class.start_line <= class.end_line);

        for method in &class.methods {
            assert!(class.start_line < method.start_line);
            assert!(method.start_line <= method.end_line);
            assert!(method.end_line <= class.end_line);
        }

        assert_eq!(module.functions.len(), 1);
        assert_eq!(module.functions[0].name, "after");
    }

    #[test]
    fn test_decorated_function_not_duplicated() {
        let source = "\
@lru_cache
def cached(n):
    return n
";
        let module = extract_python(source);
        assert_eq!(module.functions.len(), 1);
        assert_eq!(module.functions[0].name, "cached");
        // start_line points at the def, not the decorator
        assert_eq!(module.functions[0].start_line, 2);
    }

    #[test]
    fn test_static_and_class_methods() {
        let source = "\
class Tool:
    @staticmethod
    def build():
        pass

    @classmethod
    def create(cls, n):
        pass
";
        let module = extract_python(source);
        assert_eq!(module.functions.len(), 0);
        let class = &module.classes[0];
        let names: Vec<&str> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert!(names.contains(&"build"));
        assert!(names.contains(&"create"));
    }

    #[test]
    fn test_every_def_exactly_once() {
        let source = "\
def top():
    pass

class A:
    def m1(self):
        pass

    def m2(self):
        pass

def bottom():
    pass
";
        let module = extract_python(source);
        let mut all: Vec<&str> = module.functions.iter().map(|f| f.name.as_str()).collect();
        for class in &module.classes {
            all.extend(class.methods.iter().map(|m| m.name.as_str()));
        }
        all.sort_unstable();
        assert_eq!(all, vec!["bottom", "m1", "m2", "top"]);
    }

    #[test]
    fn test_nested_function_skipped() {
        let source = "\
def outer():
    def inner():
        pass
    return inner
";
        let module = extract_python(source);
        assert_eq!(module.functions.len(), 1);
        assert_eq!(module.functions[0].name, "outer");
    }

    #[test]
    fn test_javascript_structures() {
        let backend = ParserBackend::with_fallback_forced(false);
        let extractor = GrammarExtractor::new(&backend, Language::JavaScript).unwrap();
        let source = "\
function greet(name) {
    return `hi ${name}`;
}

class Widget {
}
";
        let module = extractor.extract("<string>", source).unwrap();
        assert_eq!(module.functions.len(), 1);
        assert_eq!(module.functions[0].name, "greet");
        assert_eq!(module.functions[0].params, "(name)");
        assert_eq!(module.classes.len(), 1);
        assert_eq!(module.classes[0].name, "Widget");
    }

}
