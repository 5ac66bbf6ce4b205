//! Structural model shared by all extractors.
//!
//! A [`Module`] is produced per parsed file or snippet, fully populated by
//! extraction end and not mutated afterwards. The `*Record` types are the
//! stable, serializable shapes handed to the documentation layer; they carry
//! no parser objects.

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// A function or method discovered in source code
#[derive(Debug, Clone)]
pub struct Function {
    /// The function name
    pub name: String,
    /// Raw parameter-list text, parentheses included (e.g. `(self, x)`)
    pub params: String,
    /// Raw body text
    pub body: String,
    /// Normalized docstring, if any
    pub docstring: Option<String>,
    /// First line of the definition (1-based)
    pub start_line: usize,
    /// Last line of the definition (1-based)
    pub end_line: usize,
    /// Language the function was parsed from
    pub language: Language,
    /// Name of the owning class for methods; non-owning reference
    pub parent: Option<String>,
}

/// A class discovered in source code, owning its methods
#[derive(Debug, Clone)]
pub struct Class {
    pub name: String,
    pub docstring: Option<String>,
    /// First line of the definition (1-based)
    pub start_line: usize,
    /// Last line of the class body (1-based). For Python this is tightened
    /// by an indentation scan rather than taken from the syntax-tree span,
    /// which can include a trailing orphan blank region.
    pub end_line: usize,
    pub methods: Vec<Function>,
}

/// A parsed file or snippet
#[derive(Debug, Clone)]
pub struct Module {
    /// File path, or `<string>` for snippets
    pub path: String,
    pub language: Language,
    pub docstring: Option<String>,
    pub functions: Vec<Function>,
    pub classes: Vec<Class>,
    /// The full source the module was extracted from
    pub source_text: String,
}

impl Module {
    /// Create an empty module for `source_text`; extraction fills it in
    pub fn new(path: impl Into<String>, language: Language, source_text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            language,
            docstring: None,
            functions: Vec::new(),
            classes: Vec::new(),
            source_text: source_text.into(),
        }
    }

    /// Look up a class by name
    pub fn class(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.name == name)
    }
}

/// Serializable function entry of a [`ModuleRecord`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,
    pub params: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
}

/// Serializable class entry of a [`ModuleRecord`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
    pub methods: Vec<FunctionRecord>,
}

/// Serializable structure of a parsed file, as returned by the public
/// entry points
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub path: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_docstring: Option<String>,
    pub functions: Vec<FunctionRecord>,
    pub classes: Vec<ClassRecord>,
}

impl From<&Function> for FunctionRecord {
    fn from(func: &Function) -> Self {
        Self {
            name: func.name.clone(),
            params: func.params.clone(),
            docstring: func.docstring.clone(),
            start_line: func.start_line,
            end_line: func.end_line,
        }
    }
}

impl From<&Class> for ClassRecord {
    fn from(class: &Class) -> Self {
        Self {
            name: class.name.clone(),
            docstring: class.docstring.clone(),
            start_line: class.start_line,
            end_line: class.end_line,
            methods: class.methods.iter().map(FunctionRecord::from).collect(),
        }
    }
}

impl From<&Module> for ModuleRecord {
    fn from(module: &Module) -> Self {
        Self {
            path: module.path.clone(),
            language: module.language.name().to_string(),
            module_docstring: module.docstring.clone(),
            functions: module.functions.iter().map(FunctionRecord::from).collect(),
            classes: module.classes.iter().map(ClassRecord::from).collect(),
        }
    }
}
