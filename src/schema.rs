//! Pydantic schema field extraction.
//!
//! An independent AST pass over class bodies: every top-level statement of
//! the form `name: Type = value` or `name = value` becomes a field
//! descriptor. `Field(...)` assignments are inspected for defaults, an
//! explicit `required=` override and a `description=`. The DTO-vs-ORM
//! decision ([`is_data_model`]) is the caller's filter, driven by the base
//! classes and the `__tablename__` marker recorded on each candidate.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tree_sitter::{Language as Grammar, Node, Parser};

use crate::docstring;
use crate::error::{Error, Result};

/// Base classes that mark a class as a data model
const MODEL_BASES: [&str; 5] = ["BaseModel", "Model", "Schema", "Serializer", "Entity"];

/// Path fragments conventionally holding data models
const MODEL_PATH_HINTS: [&str; 4] = ["models/", "schemas/", "dtos/", "entities/"];

/// A typed field of a schema class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Unparsed annotation text; serialized as `type`
    #[serde(rename = "type")]
    pub type_name: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A data-transfer schema recovered from a model class.
///
/// Derived, read-only snapshot; recomputed on every extraction call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<Field>,
    /// Names of the required fields, in declaration order
    pub required: Vec<String>,
    pub source_file: String,
    pub source_line: usize,
}

/// A class seen by the schema pass, before the DTO filter
#[derive(Debug, Clone)]
pub struct ClassSchema {
    pub schema: Schema,
    /// Base classes named in the class header
    pub bases: Vec<String>,
    /// The class body assigns `__tablename__` (ORM table mapping)
    pub has_tablename: bool,
}

/// Extracts schema candidates from Python source
pub struct SchemaExtractor {
    grammar: Grammar,
}

impl SchemaExtractor {
    pub fn new() -> Self {
        Self {
            grammar: tree_sitter_python::LANGUAGE.into(),
        }
    }

    /// Extract a schema candidate for every class in a Python file
    pub fn extract_file(&self, file_path: &str, source: &str) -> Result<Vec<ClassSchema>> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.grammar)
            .map_err(|e| Error::parse_failure(file_path, format!("failed to set language: {e}")))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| Error::parse_failure(file_path, "parser produced no tree"))?;

        let mut classes = Vec::new();
        collect_classes(tree.root_node(), &mut classes);

        let mut candidates = Vec::new();
        for class in classes {
            let Some(name_node) = class.child_by_field_name("name") else {
                continue;
            };
            let name = node_text(name_node, source).to_string();
            let Some(body) = class.child_by_field_name("body") else {
                continue;
            };

            let bases = base_classes(class, source);
            let (fields, required, has_tablename) = extract_fields(body, source);
            debug!("Parsed class '{}': {} fields", name, fields.len());

            candidates.push(ClassSchema {
                schema: Schema {
                    name,
                    description: class_docstring(body, source),
                    fields,
                    required,
                    source_file: file_path.to_string(),
                    source_line: class.start_position().row + 1,
                },
                bases,
                has_tablename,
            });
        }

        Ok(candidates)
    }
}

impl Default for SchemaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// DTO filter applied by callers before a candidate becomes documentation:
/// ORM table mappings (`__tablename__`) are never schemas; otherwise a
/// model base class or a model-directory path qualifies the class.
pub fn is_data_model(candidate: &ClassSchema) -> bool {
    if candidate.has_tablename {
        debug!(
            "Class '{}' has __tablename__; treating as ORM mapping, not a schema",
            candidate.schema.name
        );
        return false;
    }
    if candidate
        .bases
        .iter()
        .any(|base| MODEL_BASES.iter().any(|known| base == known))
    {
        return true;
    }
    let path = candidate.schema.source_file.to_lowercase();
    if MODEL_PATH_HINTS.iter().any(|hint| path.contains(hint)) {
        return true;
    }
    debug!(
        "Class '{}' in {} not identified as a data model",
        candidate.schema.name, candidate.schema.source_file
    );
    false
}

/// Walk every field statement of one class body.
///
/// Returns the fields, the required-name list and whether `__tablename__`
/// was assigned. A statement that cannot be interpreted is skipped, never
/// fatal.
fn extract_fields(body: Node, source: &str) -> (Vec<Field>, Vec<String>, bool) {
    let mut fields = Vec::new();
    let mut required = Vec::new();
    let mut has_tablename = false;

    let mut cursor = body.walk();
    for statement in body.named_children(&mut cursor) {
        if statement.kind() != "expression_statement" {
            continue;
        }
        let Some(assignment) = statement.named_child(0) else {
            continue;
        };
        if assignment.kind() != "assignment" {
            continue;
        }
        let Some(left) = assignment.child_by_field_name("left") else {
            continue;
        };
        if left.kind() != "identifier" {
            debug!("Skipping non-identifier assignment target in class body");
            continue;
        }

        let name = node_text(left, source).to_string();
        if name == "__tablename__" {
            has_tablename = true;
        }

        let annotation = assignment.child_by_field_name("type");
        let value = assignment.child_by_field_name("right");

        // Plain `name = value` assignments carry no annotation
        if annotation.is_none() && value.is_none() {
            continue;
        }

        let type_name = annotation
            .map(|node| node_text(node, source).trim().to_string())
            .unwrap_or_else(|| "Any".to_string());

        // Required unless a value is assigned or the annotation is optional
        let mut is_required = true;
        if type_name.starts_with("Optional[")
            || (type_name.starts_with("Union[") && type_name.contains("None"))
        {
            is_required = false;
        }

        let mut default = None;
        let mut description = None;
        if let Some(value) = value {
            is_required = false;
            default = Some(node_text(value, source).trim().to_string());

            if let Some(field_call) = as_field_call(value, source) {
                let inspection = inspect_field_call(field_call, source);
                if let Some(explicit) = inspection.required_override {
                    is_required = explicit;
                }
                description = inspection.description;
            }
        }

        if is_required {
            required.push(name.clone());
        }
        fields.push(Field {
            name,
            type_name,
            required: is_required,
            default,
            description,
        });
    }

    (fields, required, has_tablename)
}

/// What a `Field(...)` call contributes to a field descriptor
struct FieldCallInspection {
    required_override: Option<bool>,
    description: Option<String>,
}

/// The argument list of a `Field(...)` call, if the value is one
fn as_field_call<'t>(value: Node<'t>, source: &str) -> Option<Node<'t>> {
    if value.kind() != "call" {
        return None;
    }
    let function = value.child_by_field_name("function")?;
    if function.kind() != "identifier" || node_text(function, source) != "Field" {
        return None;
    }
    value.child_by_field_name("arguments")
}

/// Inspect `Field(...)` arguments: `default`/`default_factory` and a bare
/// positional default force non-required, an explicit `required=` keyword
/// overrides every other signal, and `description=` becomes the field
/// description.
fn inspect_field_call(arguments: Node, source: &str) -> FieldCallInspection {
    let mut inspection = FieldCallInspection {
        required_override: None,
        description: None,
    };

    let mut cursor = arguments.walk();
    for child in arguments.named_children(&mut cursor) {
        if child.kind() != "keyword_argument" {
            continue;
        }
        let Some(kw_name) = child.child_by_field_name("name") else {
            continue;
        };
        let Some(value) = child.child_by_field_name("value") else {
            continue;
        };
        match node_text(kw_name, source) {
            "required" => match node_text(value, source) {
                "True" => inspection.required_override = Some(true),
                "False" => inspection.required_override = Some(false),
                other => warn!("Unrecognized required= value in Field(): {}", other),
            },
            "description" => {
                if value.kind() == "string" {
                    inspection.description = Some(docstring::clean(node_text(value, source)));
                }
            }
            _ => {}
        }
    }

    inspection
}

/// Base classes from a class header's superclass list, keyword arguments
/// (such as `metaclass=`) excluded
fn base_classes(class: Node, source: &str) -> Vec<String> {
    let Some(superclasses) = class.child_by_field_name("superclasses") else {
        return Vec::new();
    };
    let mut cursor = superclasses.walk();
    superclasses
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "keyword_argument" && child.kind() != "comment")
        .map(|child| node_text(child, source).to_string())
        .collect()
}

/// Class docstring: first statement of the body when it is a bare string
fn class_docstring(body: Node, source: &str) -> Option<String> {
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
            _ => return None,
        }
    }
    None
}

/// Collect every class definition, at any depth
fn collect_classes<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    if node.kind() == "class_definition" {
        out.push(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_classes(child, out);
    }
}

/// Slice the source text covered by a node
fn node_text<'s>(node: Node, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or("")
}
