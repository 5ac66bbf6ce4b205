//! Declarative query-pattern sets for the grammar-backed extractor.
//!
//! Each supported language gets a fixed set of tree-sitter queries for
//! functions, classes and (for Python) methods. Capture names are mapped once
//! at compile time onto the closed [`CaptureKind`] set, so match processing
//! dispatches on an enum instead of capture-name strings.

use log::error;
use tree_sitter::{Language as Grammar, Query};

use crate::language::Language;

/// Python structure queries
const PYTHON_FUNCTION_QUERY: &str = r#"
(function_definition
  name: (identifier) @function.name
  parameters: (parameters) @function.params
  body: (block) @function.body) @function.def

(decorated_definition
  (decorator) @function.decorator
  definition: (function_definition
    name: (identifier) @function.name
    parameters: (parameters) @function.params
    body: (block) @function.body) @function.def)
"#;

const PYTHON_CLASS_QUERY: &str = r#"
(class_definition
  name: (identifier) @class.name
  body: (block) @class.body) @class.def

(decorated_definition
  definition: (class_definition
    name: (identifier) @class.name
    body: (block) @class.body) @class.def)
"#;

/// Matches only function definitions sitting directly inside a class body
/// block, producing method candidates without going through the heuristics.
const PYTHON_METHOD_QUERY: &str = r#"
(class_definition
  body: (block
    (function_definition
      name: (identifier) @function.name
      parameters: (parameters) @function.params
      body: (block) @function.body) @function.def))

(class_definition
  body: (block
    (decorated_definition
      (decorator) @function.decorator
      definition: (function_definition
        name: (identifier) @function.name
        parameters: (parameters) @function.params
        body: (block) @function.body) @function.def)))
"#;

/// JavaScript structure queries
const JAVASCRIPT_FUNCTION_QUERY: &str = r#"
(function_declaration
  name: (identifier) @function.name
  parameters: (formal_parameters) @function.params
  body: (statement_block) @function.body) @function.def
"#;

const JAVASCRIPT_CLASS_QUERY: &str = r#"
(class_declaration
  name: (identifier) @class.name
  body: (class_body) @class.body) @class.def
"#;

/// Closed set of node roles a structure query can capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    /// The whole class definition node
    ClassDef,
    /// The whole function definition node
    FunctionDef,
    /// A decorator attached to a definition
    Decorator,
    /// The body block of a definition
    Body,
    /// The identifier naming a definition
    Name,
    /// The parameter list of a function
    Params,
}

impl CaptureKind {
    /// Map a `category.part` capture name onto a kind
    fn from_capture_name(name: &str) -> Option<Self> {
        let (category, part) = name.split_once('.')?;
        match (category, part) {
            ("class", "def") => Some(Self::ClassDef),
            ("function", "def") => Some(Self::FunctionDef),
            (_, "decorator") => Some(Self::Decorator),
            (_, "body") => Some(Self::Body),
            (_, "name") => Some(Self::Name),
            (_, "params") => Some(Self::Params),
            _ => None,
        }
    }
}

/// A compiled structure query with its capture-index → kind table
pub struct StructureQuery {
    query: Query,
    kinds: Vec<Option<CaptureKind>>,
}

impl StructureQuery {
    /// Compile a query against a grammar. Returns `None` (and logs) if the
    /// pattern does not compile; the pattern texts are fixed, so this only
    /// fires on a grammar/pattern version mismatch.
    fn compile(grammar: &Grammar, source: &str) -> Option<Self> {
        let query = match Query::new(grammar, source) {
            Ok(query) => query,
            Err(e) => {
                error!("Error compiling structure query: {}", e);
                return None;
            }
        };

        let kinds = query
            .capture_names()
            .iter()
            .map(|name| CaptureKind::from_capture_name(name))
            .collect();

        Some(Self { query, kinds })
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    /// The kind of a capture by index, if the capture name is recognized
    pub fn kind_of(&self, capture_index: u32) -> Option<CaptureKind> {
        self.kinds.get(capture_index as usize).copied().flatten()
    }
}

/// The query-pattern set for one language
pub struct QuerySet {
    pub function: StructureQuery,
    pub class: StructureQuery,
    /// Python only: direct method capture, ahead of the heuristics
    pub method: Option<StructureQuery>,
}

/// Build the query set for a language, or `None` when the language has a
/// grammar but no structure patterns (such files still yield a module with
/// a docstring and nothing else).
pub fn query_set(grammar: &Grammar, language: Language) -> Option<QuerySet> {
    match language {
        Language::Python => Some(QuerySet {
            function: StructureQuery::compile(grammar, PYTHON_FUNCTION_QUERY)?,
            class: StructureQuery::compile(grammar, PYTHON_CLASS_QUERY)?,
            method: Some(StructureQuery::compile(grammar, PYTHON_METHOD_QUERY)?),
        }),
        Language::JavaScript => Some(QuerySet {
            function: StructureQuery::compile(grammar, JAVASCRIPT_FUNCTION_QUERY)?,
            class: StructureQuery::compile(grammar, JAVASCRIPT_CLASS_QUERY)?,
            method: None,
        }),
        _ => None,
    }
}
