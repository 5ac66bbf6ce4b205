//! FastAPI endpoint extraction.
//!
//! A dedicated AST pass, independent of the structural extractor: the source
//! is re-parsed with the Python grammar and every decorated function is
//! checked for a route decorator (`@app.get("/path", ...)`,
//! `@router.post(...)`, any receiver name). Recognized routes yield
//! [`Endpoint`] records; everything else yields `None`. A malformed
//! decorator or parameter skips that endpoint with a warning and never
//! aborts the rest of the file.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tree_sitter::{Language as Grammar, Node, Parser};

use crate::docstring;
use crate::error::{Error, Result};

/// HTTP methods recognized in route decorators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
}

impl HttpMethod {
    /// Parse a decorator verb such as `get` or `post`
    pub fn from_verb(verb: &str) -> Option<Self> {
        match verb.to_lowercase().as_str() {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "delete" => Some(Self::Delete),
            "patch" => Some(Self::Patch),
            "options" => Some(Self::Options),
            "head" => Some(Self::Head),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Trace => "TRACE",
        }
    }
}

/// Where a parameter value comes from in the HTTP request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Body,
    Header,
}

/// A single endpoint parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Request location; serialized as `in`
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    pub required: bool,
    /// Effective type text, with `Optional`/`Union[..., None]` unwrapped;
    /// serialized as `type`
    #[serde(rename = "type")]
    pub type_name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Media entry of a response; the key in the surrounding map is the
/// content type (`application/json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaObject {
    pub schema_name: String,
}

/// One entry of the per-status `responses` map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseDesc {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaObject>>,
}

/// Request-body summary consumed by the documentation renderers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBodyDetails {
    pub description: String,
    pub required: bool,
    pub schema_name: String,
}

/// A single HTTP route recovered from a FastAPI decorator.
///
/// Derived, read-only snapshot: recomputed on every extraction call, never
/// mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    pub path: String,
    pub method: HttpMethod,
    /// Handler function name (operation-id candidate)
    pub name: String,
    pub summary: String,
    pub description: String,
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_model: Option<String>,
    pub status_code: u16,
    pub responses: BTreeMap<String, ResponseDesc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body_details: Option<RequestBodyDetails>,
    pub tags: Vec<String>,
    pub source_file: String,
    pub source_line: usize,
}

/// Extracts FastAPI endpoints from Python source
pub struct EndpointExtractor {
    grammar: Grammar,
}

/// A recognized route decorator
struct RouteDecorator<'t> {
    method: HttpMethod,
    /// The decorator's call arguments, absent for bare `@app.get` attributes
    arguments: Option<Node<'t>>,
}

impl EndpointExtractor {
    pub fn new() -> Self {
        Self {
            grammar: tree_sitter_python::LANGUAGE.into(),
        }
    }

    /// Extract every endpoint declared in a Python file
    pub fn extract_file(&self, file_path: &str, source: &str) -> Result<Vec<Endpoint>> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.grammar)
            .map_err(|e| Error::parse_failure(file_path, format!("failed to set language: {e}")))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| Error::parse_failure(file_path, "parser produced no tree"))?;

        let mut decorated = Vec::new();
        collect_decorated(tree.root_node(), &mut decorated);

        let mut endpoints = Vec::new();
        for node in decorated {
            if let Some(endpoint) = self.extract_function(node, file_path, source) {
                endpoints.push(endpoint);
            }
        }

        info!(
            "Found {} endpoints in {}",
            endpoints.len(),
            file_path
        );
        Ok(endpoints)
    }

    /// Extract an endpoint from one `decorated_definition`, or `None` when
    /// no route decorator is present
    pub fn extract_function(
        &self,
        decorated: Node,
        file_path: &str,
        source: &str,
    ) -> Option<Endpoint> {
        let def = decorated.child_by_field_name("definition")?;
        if def.kind() != "function_definition" {
            return None;
        }
        let name = node_text(def.child_by_field_name("name")?, source).to_string();

        let route = find_route_decorator(decorated, source)?;
        debug!("Found route decorator for function '{}'", name);

        // Path from the first positional argument, else synthesized from the
        // function name
        let mut path = route
            .arguments
            .and_then(|args| first_positional(args))
            .map(|node| literal_text(node, source));
        if path.is_none() {
            path = synthesize_path(&name);
            match &path {
                Some(path) => debug!("Guessed route path '{}' for '{}'", path, name),
                None => {
                    warn!("Failed to determine route path for '{}'", name);
                    return None;
                }
            }
        }
        let path = path?;

        // Decorator keywords
        let mut response_model = None;
        let mut status_code: u16 = 200;
        let mut tags = Vec::new();
        if let Some(args) = route.arguments {
            let mut cursor = args.walk();
            for child in args.named_children(&mut cursor) {
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
                    "response_model" => {
                        response_model = Some(node_text(value, source).to_string());
                    }
                    "status_code" => {
                        if let Some(code) = parse_status_code(value, source) {
                            status_code = code;
                        }
                    }
                    "tags" => tags = parse_tags(value, source),
                    _ => {}
                }
            }
        }

        // Docstring-derived summary/description and parameter descriptions
        let raw_docstring = function_docstring(def, source).unwrap_or_default();
        let (mut summary, description) = docstring::split_summary(&raw_docstring);
        if summary.is_empty() {
            summary = name.clone();
        }
        let param_docs = docstring::parse_params(&raw_docstring);

        // Parameters
        let mut parameters = Vec::new();
        let mut request_model = None;
        let mut request_body_details = None;
        if let Some(params_node) = def.child_by_field_name("parameters") {
            let mut cursor = params_node.walk();
            for param in params_node.named_children(&mut cursor) {
                let Some(extracted) = extract_parameter(param, source, &param_docs) else {
                    continue;
                };
                if extracted.location == ParameterLocation::Body {
                    request_model = Some(extracted.type_name.clone());
                    request_body_details = Some(RequestBodyDetails {
                        description: extracted.description.clone(),
                        required: extracted.required,
                        schema_name: extracted.type_name.clone(),
                    });
                } else {
                    parameters.push(extracted);
                }
            }
        }

        // Success response entry; gains a content block once a response
        // model is known
        let mut responses = BTreeMap::new();
        let mut success = ResponseDesc {
            description: "Successful Response".to_string(),
            content: None,
        };
        if let Some(model) = &response_model {
            let mut content = BTreeMap::new();
            content.insert(
                "application/json".to_string(),
                MediaObject {
                    schema_name: model.clone(),
                },
            );
            success.content = Some(content);
        }
        responses.insert(status_code.to_string(), success);

        info!("Successfully parsed endpoint '{}' in {}", name, file_path);
        Some(Endpoint {
            path,
            method: route.method,
            name,
            summary,
            description,
            parameters,
            request_model,
            response_model,
            status_code,
            responses,
            request_body_details,
            tags,
            source_file: file_path.to_string(),
            source_line: def.start_position().row + 1,
        })
    }
}

impl Default for EndpointExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect every `decorated_definition` wrapping a function, at any depth
fn collect_decorated<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    if node.kind() == "decorated_definition" {
        let is_function = node
            .child_by_field_name("definition")
            .is_some_and(|def| def.kind() == "function_definition");
        if is_function {
            out.push(node);
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_decorated(child, out);
    }
}

/// Scan a definition's decorators for the first `<name>.<verb>` route form
fn find_route_decorator<'t>(decorated: Node<'t>, source: &str) -> Option<RouteDecorator<'t>> {
    let mut cursor = decorated.walk();
    for child in decorated.children(&mut cursor) {
        if child.kind() != "decorator" {
            continue;
        }
        let Some(expression) = child.named_child(0) else {
            continue;
        };
        match expression.kind() {
            "call" => {
                // Non-route call decorators (e.g. `@lru_cache()`) fall
                // through to the next decorator
                if let Some(function) = expression.child_by_field_name("function") {
                    if let Some(method) = route_verb(function, source) {
                        return Some(RouteDecorator {
                            method,
                            arguments: expression.child_by_field_name("arguments"),
                        });
                    }
                }
            }
            "attribute" => {
                if let Some(method) = route_verb(expression, source) {
                    return Some(RouteDecorator {
                        method,
                        arguments: None,
                    });
                }
            }
            _ => {}
        }
    }
    None
}

/// The HTTP verb of an `<anything>.<verb>` attribute expression
fn route_verb(node: Node, source: &str) -> Option<HttpMethod> {
    if node.kind() != "attribute" {
        return None;
    }
    let attribute = node.child_by_field_name("attribute")?;
    HttpMethod::from_verb(node_text(attribute, source))
}

/// Best-effort path from a handler name when the decorator has no path
/// argument: `get_items` becomes `/items`
fn synthesize_path(name: &str) -> Option<String> {
    for prefix in ["get_", "create_", "update_", "delete_"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            if !rest.is_empty() {
                return Some(format!("/{}", rest));
            }
        }
    }
    None
}

/// First positional (non-keyword) argument of an argument list
fn first_positional(arguments: Node) -> Option<Node> {
    let mut cursor = arguments.walk();
    let result = arguments
        .named_children(&mut cursor)
        .find(|child| child.kind() != "keyword_argument" && child.kind() != "comment");
    result
}

/// Literal evaluation, best effort: strings are unquoted, everything else is
/// kept as its unparsed source text
fn literal_text(node: Node, source: &str) -> String {
    match node.kind() {
        "string" => docstring::clean(node_text(node, source)),
        _ => node_text(node, source).to_string(),
    }
}

/// Resolve a `status_code=` value: integer literal, or a
/// `status.HTTP_201_CREATED`-style name reduced to its embedded number
fn parse_status_code(value: Node, source: &str) -> Option<u16> {
    let text = node_text(value, source);
    if let Ok(code) = text.parse::<u16>() {
        return Some(code);
    }
    if text.contains("status.") {
        for segment in text.split('_') {
            if let Ok(code) = segment.parse::<u16>() {
                return Some(code);
            }
        }
    }
    debug!("Unrecognized status_code value: {}", text);
    None
}

/// Flatten a `tags=[...]` list; string elements are unquoted, anything else
/// keeps its source text
fn parse_tags(value: Node, source: &str) -> Vec<String> {
    if value.kind() != "list" && value.kind() != "tuple" {
        return vec![node_text(value, source).to_string()];
    }
    let mut cursor = value.walk();
    value
        .named_children(&mut cursor)
        .map(|element| literal_text(element, source))
        .collect()
}

/// Docstring of a function definition, cleaned
fn function_docstring(def: Node, source: &str) -> Option<String> {
    let body = def.child_by_field_name("body")?;
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

/// One signature parameter, decomposed
struct SignatureParam<'t> {
    name: String,
    annotation: Option<Node<'t>>,
    default: Option<Node<'t>>,
}

/// Decompose a parameter node, skipping `*args`/`**kwargs` and separators
fn signature_param<'t>(param: Node<'t>, source: &str) -> Option<SignatureParam<'t>> {
    match param.kind() {
        "identifier" => Some(SignatureParam {
            name: node_text(param, source).to_string(),
            annotation: None,
            default: None,
        }),
        "typed_parameter" => Some(SignatureParam {
            name: node_text(param.named_child(0)?, source).to_string(),
            annotation: param.child_by_field_name("type"),
            default: None,
        }),
        "default_parameter" => Some(SignatureParam {
            name: node_text(param.child_by_field_name("name")?, source).to_string(),
            annotation: None,
            default: param.child_by_field_name("value"),
        }),
        "typed_default_parameter" => Some(SignatureParam {
            name: node_text(param.child_by_field_name("name")?, source).to_string(),
            annotation: param.child_by_field_name("type"),
            default: param.child_by_field_name("value"),
        }),
        _ => None,
    }
}

/// Analyze one handler parameter into a [`Parameter`].
///
/// Only annotated parameters are considered. Body parameters come back with
/// `location == Body`; the caller routes them into the request-body fields
/// instead of the parameter list.
fn extract_parameter(
    param: Node,
    source: &str,
    param_docs: &std::collections::HashMap<String, String>,
) -> Option<Parameter> {
    let sig = signature_param(param, source)?;
    if sig.name == "self" || sig.name == "cls" || sig.name.starts_with('*') {
        return None;
    }
    let annotation = sig.annotation?;

    let type_text = node_text(annotation, source).to_string();
    let (effective_type, is_optional) = unwrap_optional(&type_text);

    // Path(...)/Query(...)/Body(...)/Header(...) wrappers, either as the
    // default value or (unusually) as the annotation itself
    let mut location = ParameterLocation::Query;
    let mut wrapper_description = None;
    let mut wrapper_default = None;
    for candidate in [Some(annotation), sig.default].into_iter().flatten() {
        let Some((wrapper_location, description, default)) = parse_wrapper_call(candidate, source)
        else {
            continue;
        };
        // A name appearing in the route's {..} template does not override
        // the location; only an explicit Path(...) wrapper does
        location = wrapper_location;
        wrapper_description = description;
        wrapper_default = default;
        break;
    }

    // Default precedence: wrapper default, then the plain signature default
    let mut default = wrapper_default;
    if default.is_none() {
        if let Some(value) = sig.default {
            if value.kind() != "none" && parse_wrapper_call(value, source).is_none() {
                default = Some(literal_text(value, source));
            }
        }
    }

    let required = default.is_none() && !is_optional;

    // Wrapper-provided descriptions always win over docstring-derived ones
    let description = wrapper_description
        .or_else(|| param_docs.get(&sig.name).cloned())
        .unwrap_or_default();

    Some(Parameter {
        name: sig.name,
        location,
        required,
        type_name: effective_type,
        description,
        default,
    })
}

/// Inspect a `Path(...)`/`Query(...)`/`Body(...)`/`Header(...)` call.
///
/// Returns the location plus `description=` and the resolved default, where
/// the default comes from an explicit `default=` keyword first and the first
/// positional argument second. A literal `None` counts as "no default".
fn parse_wrapper_call(
    node: Node,
    source: &str,
) -> Option<(ParameterLocation, Option<String>, Option<String>)> {
    if node.kind() != "call" {
        return None;
    }
    let function = node.child_by_field_name("function")?;
    if function.kind() != "identifier" {
        return None;
    }
    let location = match node_text(function, source) {
        "Path" => ParameterLocation::Path,
        "Query" => ParameterLocation::Query,
        "Body" => ParameterLocation::Body,
        "Header" => ParameterLocation::Header,
        _ => return None,
    };

    let mut description = None;
    let mut default = None;
    if let Some(arguments) = node.child_by_field_name("arguments") {
        let mut cursor = arguments.walk();
        for child in arguments.named_children(&mut cursor) {
            if child.kind() == "keyword_argument" {
                let Some(kw_name) = child.child_by_field_name("name") else {
                    continue;
                };
                let Some(value) = child.child_by_field_name("value") else {
                    continue;
                };
                match node_text(kw_name, source) {
                    "description" => {
                        if value.kind() == "string" {
                            description = Some(literal_text(value, source));
                        }
                    }
                    "default" => {
                        if value.kind() != "none" {
                            default = Some(literal_text(value, source));
                        }
                    }
                    _ => {}
                }
            }
        }
        if default.is_none() {
            if let Some(positional) = first_positional(arguments) {
                if positional.kind() != "none" {
                    default = Some(literal_text(positional, source));
                }
            }
        }
    }

    Some((location, description, default))
}

/// Unwrap `Optional[T]` and `Union[..., None]` annotations into the
/// effective type and an optional flag
pub fn unwrap_optional(type_text: &str) -> (String, bool) {
    let text = type_text.trim();

    if let Some(inner) = text
        .strip_prefix("Optional[")
        .and_then(|rest| rest.strip_suffix(']'))
    {
        return (inner.trim().to_string(), true);
    }

    if let Some(inner) = text
        .strip_prefix("Union[")
        .and_then(|rest| rest.strip_suffix(']'))
    {
        let parts = split_top_level(inner);
        let non_none: Vec<&str> = parts
            .iter()
            .map(|p| p.trim())
            .filter(|p| *p != "None" && *p != "NoneType")
            .collect();
        if non_none.len() < parts.len() {
            let effective = if non_none.len() == 1 {
                non_none[0].to_string()
            } else {
                format!("Union[{}]", non_none.join(", "))
            };
            return (effective, true);
        }
    }

    (text.to_string(), false)
}

/// Split on commas that are not nested inside brackets
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        match ch {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Slice the source text covered by a node
fn node_text<'s>(node: Node, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(source: &str) -> Vec<Endpoint> {
        EndpointExtractor::new()
            .extract_file("app.py", source)
            .unwrap()
    }

    #[test]
    fn test_basic_route_with_optional_query() {
        let source = r#"
@app.get("/items/{item_id}")
def read_item(item_id: int, q: Optional[str] = None):
    return {"item_id": item_id}
"#;
        let endpoints = extract(source);
        assert_eq!(endpoints.len(), 1);

        let endpoint = &endpoints[0];
        assert_eq!(endpoint.method, HttpMethod::Get);
        assert_eq!(endpoint.path, "/items/{item_id}");
        assert_eq!(endpoint.name, "read_item");
        assert_eq!(endpoint.status_code, 200);
        assert_eq!(endpoint.parameters.len(), 2);

        let item_id = &endpoint.parameters[0];
        assert_eq!(item_id.name, "item_id");
        assert_eq!(item_id.location, ParameterLocation::Query);
        assert!(item_id.required);
        assert_eq!(item_id.type_name, "int");

        let q = &endpoint.parameters[1];
        assert_eq!(q.name, "q");
        assert_eq!(q.location, ParameterLocation::Query);
        assert!(!q.required);
        assert_eq!(q.type_name, "str");
        assert_eq!(q.default, None);
    }

    #[test]
    fn test_undecorated_function_is_not_a_route() {
        let endpoints = extract("def helper(x):\n    return x\n");
        assert!(endpoints.is_empty());

        // Decorated, but not with a route decorator
        let endpoints = extract("@lru_cache\ndef cached(n):\n    return n\n");
        assert!(endpoints.is_empty());
    }

    #[test]
    fn test_decorator_keywords() {
        let source = r#"
@router.post("/users", response_model=UserOut, status_code=201, tags=["users", "admin"])
async def create_user(payload: UserIn = Body(...)):
    """Create a user."""
    return payload
"#;
        let endpoints = extract(source);
        assert_eq!(endpoints.len(), 1);

        let endpoint = &endpoints[0];
        assert_eq!(endpoint.method, HttpMethod::Post);
        assert_eq!(endpoint.status_code, 201);
        assert_eq!(endpoint.response_model.as_deref(), Some("UserOut"));
        assert_eq!(endpoint.tags, vec!["users", "admin"]);

        // Body parameter becomes the request model, not a parameter entry
        assert!(endpoint.parameters.is_empty());
        assert_eq!(endpoint.request_model.as_deref(), Some("UserIn"));
        let details = endpoint.request_body_details.as_ref().unwrap();
        assert_eq!(details.schema_name, "UserIn");

        // Success response carries the schema reference
        let success = endpoint.responses.get("201").unwrap();
        let content = success.content.as_ref().unwrap();
        assert_eq!(
            content.get("application/json").unwrap().schema_name,
            "UserOut"
        );
    }

    #[test]
    fn test_status_constant_reduced_to_number() {
        let source = r#"
@app.delete("/items/{item_id}", status_code=status.HTTP_204_NO_CONTENT)
def delete_item(item_id: int):
    pass
"#;
        let endpoints = extract(source);
        assert_eq!(endpoints[0].status_code, 204);
    }

    #[test]
    fn test_wrapper_description_beats_docstring() {
        let source = r#"
@app.get("/search")
def search(q: str = Query("all", description="wrapper text"), limit: int = 10):
    """Search things.

    Args:
        q: docstring text
        limit: page size
    """
    pass
"#;
        let endpoints = extract(source);
        let endpoint = &endpoints[0];

        let q = endpoint.parameters.iter().find(|p| p.name == "q").unwrap();
        assert_eq!(q.description, "wrapper text");
        assert_eq!(q.default.as_deref(), Some("all"));
        assert!(!q.required);

        let limit = endpoint.parameters.iter().find(|p| p.name == "limit").unwrap();
        assert_eq!(limit.description, "page size");
        assert_eq!(limit.default.as_deref(), Some("10"));
        assert!(!limit.required);
    }

    #[test]
    fn test_explicit_path_wrapper() {
        let source = r#"
@app.get("/users/{user_id}")
def get_user(user_id: int = Path(description="the user id")):
    pass
"#;
        let endpoints = extract(source);
        let param = &endpoints[0].parameters[0];
        assert_eq!(param.location, ParameterLocation::Path);
        assert_eq!(param.description, "the user id");
        // No default resolved and not Optional
        assert!(param.required);
    }

    #[test]
    fn test_path_synthesized_from_name() {
        let source = "@app.get\ndef get_items():\n    pass\n";
        let endpoints = extract(source);
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].path, "/items");
    }

    #[test]
    fn test_summary_and_description_from_docstring() {
        let source = r#"
@app.get("/health")
def health():
    """Check liveness.

    Returns a static payload.
    """
    return {"ok": True}
"#;
        let endpoints = extract(source);
        assert_eq!(endpoints[0].summary, "Check liveness.");
        assert_eq!(endpoints[0].description, "Returns a static payload.");

        // No docstring: the function name stands in for the summary
        let endpoints = extract("@app.get(\"/x\")\ndef bare():\n    pass\n");
        assert_eq!(endpoints[0].summary, "bare");
    }

    #[test]
    fn test_methods_inside_classes_are_scanned() {
        let source = r#"
class Api:
    @app.get("/nested")
    def nested(self):
        pass
"#;
        let endpoints = extract(source);
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].path, "/nested");
        // self never appears as a parameter
        assert!(endpoints[0].parameters.is_empty());
    }

    #[test]
    fn test_unwrap_optional() {
        assert_eq!(unwrap_optional("Optional[str]"), ("str".to_string(), true));
        assert_eq!(
            unwrap_optional("Union[int, None]"),
            ("int".to_string(), true)
        );
        assert_eq!(
            unwrap_optional("Union[int, str, None]"),
            ("Union[int, str]".to_string(), true)
        );
        assert_eq!(
            unwrap_optional("Union[int, str]"),
            ("Union[int, str]".to_string(), false)
        );
        assert_eq!(
            unwrap_optional("Optional[Dict[str, int]]"),
            ("Dict[str, int]".to_string(), true)
        );
        assert_eq!(unwrap_optional("int"), ("int".to_string(), false));
    }

    #[test]
    fn test_endpoint_record_serialization() {
        let source = r#"
@app.get("/items/{item_id}", response_model=Item)
def read_item(item_id: int):
    pass
"#;
        let endpoints = extract(source);
        let json = serde_json::to_value(&endpoints[0]).unwrap();
        assert_eq!(json["method"], "GET");
        assert_eq!(json["parameters"][0]["in"], "query");
        assert_eq!(json["parameters"][0]["type"], "int");
        assert_eq!(
            json["responses"]["200"]["content"]["application/json"]["schema_name"],
            "Item"
        );
    }
}
