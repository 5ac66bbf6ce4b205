//! Method-vs-function classification heuristics.
//!
//! Both the grammar-backed and the regex fallback extractor discover function
//! candidates that are not yet known to be methods. The rules below decide
//! where a candidate belongs. They are applied in a fixed priority order and
//! the first definitive answer wins:
//!
//! 1. decorator evidence (`@classmethod`/`@staticmethod`),
//! 2. structural containment (the grammar's method query — applied by the
//!    caller before a candidate ever reaches [`classify`]),
//! 3. line-range + indentation containment in a known class,
//! 4. syntax-tree ancestor walk (grammar path only, fed in as
//!    [`Candidate::ancestor_class`]),
//! 5. the `self`/`cls` first-parameter convention.
//!
//! A candidate whose first parameter is `self`/`cls` but that no rule can
//! bind to a class is discarded rather than emitted as a standalone function
//! with a misleading signature.

use log::{debug, warn};

/// Textual extent of a known class, built by each extractor
#[derive(Debug, Clone)]
pub struct ClassRange {
    pub name: String,
    /// 1-based header line
    pub start_line: usize,
    /// 1-based last body line
    pub end_line: usize,
    /// Indentation of the class header line
    pub indent: usize,
}

/// A function candidate awaiting classification
#[derive(Debug)]
pub struct Candidate<'a> {
    pub name: &'a str,
    /// Raw parameter-list text, parentheses included
    pub params: &'a str,
    /// 1-based line of the `def`
    pub start_line: usize,
    /// Indentation of the `def` line
    pub indent: usize,
    /// A `@classmethod` or `@staticmethod` decorator was seen
    pub has_method_decorator: bool,
    /// Specifically `@classmethod` (drives `cls` normalization)
    pub is_classmethod: bool,
    /// Owning class found by walking syntax-tree ancestors, when available
    pub ancestor_class: Option<String>,
}

/// Where a candidate ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Method of the named class
    Method { class: String },
    /// Standalone module-level function
    Function,
    /// Dropped: carries a stray `self`/`cls` that no class accounts for
    Discarded,
}

/// Apply the rule list to a candidate.
///
/// `declares_method(class, name)` reports whether a class already has a
/// method of that name recorded; rule 5 uses it to recover mis-associated
/// grammar captures.
pub fn classify(
    candidate: &Candidate,
    classes: &[ClassRange],
    declares_method: &dyn Fn(&str, &str) -> bool,
) -> Placement {
    // Rule 1: decorator evidence. The decorator proves method-ness; the
    // owning class still comes from textual or tree containment.
    if candidate.has_method_decorator {
        if let Some(class) = containing_class(candidate, classes) {
            return Placement::Method { class };
        }
        if let Some(class) = &candidate.ancestor_class {
            return Placement::Method {
                class: class.clone(),
            };
        }
        debug!(
            "Decorated candidate '{}' has no containing class; continuing",
            candidate.name
        );
    }

    // Rule 3: line-range + indentation containment
    if let Some(class) = containing_class(candidate, classes) {
        return Placement::Method { class };
    }

    // Rule 4: syntax-tree ancestor walk
    if let Some(class) = &candidate.ancestor_class {
        return Placement::Method {
            class: class.clone(),
        };
    }

    // Rule 5: first-parameter convention
    match first_param(candidate.params) {
        Some(first) if first == "self" || first == "cls" => {
            for class in classes {
                if declares_method(&class.name, candidate.name) {
                    return Placement::Method {
                        class: class.name.clone(),
                    };
                }
            }
            warn!(
                "Function '{}' takes '{}' but no class accounts for it; discarding",
                candidate.name, first
            );
            Placement::Discarded
        }
        _ => {
            debug!("Candidate '{}' classified as standalone function", candidate.name);
            Placement::Function
        }
    }
}

/// The innermost class whose range strictly contains the candidate's start
/// line and whose header is less indented than the candidate
fn containing_class(candidate: &Candidate, classes: &[ClassRange]) -> Option<String> {
    classes
        .iter()
        .filter(|class| {
            candidate.start_line > class.start_line
                && candidate.start_line <= class.end_line
                && candidate.indent > class.indent
        })
        .max_by_key(|class| class.start_line)
        .map(|class| class.name.clone())
}

/// First parameter name from raw parameter-list text
pub fn first_param(params: &str) -> Option<&str> {
    let inner = params.trim().trim_start_matches('(').trim_end_matches(')');
    let first = inner.split(',').next()?.trim();
    if first.is_empty() {
        return None;
    }
    // Drop annotation and default, keep the bare name
    let name = first
        .split(|c| c == ':' || c == '=')
        .next()
        .unwrap_or(first)
        .trim()
        .trim_start_matches('*');
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Ensure a confirmed `@classmethod` records `cls` in its parameter text.
/// Certain fallback captures lose the first parameter; plain methods and
/// static methods are left untouched.
pub fn normalize_method_params(params: &str, is_classmethod: bool) -> String {
    if !is_classmethod {
        return params.to_string();
    }
    match first_param(params) {
        Some("cls") | Some("self") => params.to_string(),
        _ => {
            let inner = params.trim().trim_start_matches('(').trim_end_matches(')');
            if inner.trim().is_empty() {
                "(cls)".to_string()
            } else {
                format!("(cls, {})", inner.trim())
            }
        }
    }
}

/// Number of leading whitespace characters on a line
pub fn line_indent(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Last line (1-based) of the indented block opened at `header_line`.
///
/// Scans forward until the first non-blank line whose indentation is at or
/// below the header's, keeping the last non-blank line seen on the way. Blank
/// lines and any trailing orphan region therefore never count toward the
/// block extent; deeper-indented trailing comments do.
pub fn block_end_line(lines: &[&str], header_line: usize, header_indent: usize) -> usize {
    let mut end = header_line;
    for (idx, line) in lines.iter().enumerate().skip(header_line) {
        if line.trim().is_empty() {
            continue;
        }
        if line_indent(line) <= header_indent {
            break;
        }
        end = idx + 1;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_a() -> Vec<ClassRange> {
        vec![ClassRange {
            name: "A".to_string(),
            start_line: 1,
            end_line: 10,
            indent: 0,
        }]
    }

    fn no_known_methods(_class: &str, _name: &str) -> bool {
        false
    }

    #[test]
    fn test_containment_beats_first_param_convention() {
        // `def method(self, x)` inside class A must bind to A via rule 3,
        // not fall through to the self/cls search.
        let candidate = Candidate {
            name: "method",
            params: "(self, x)",
            start_line: 2,
            indent: 4,
            has_method_decorator: false,
            is_classmethod: false,
            ancestor_class: None,
        };
        assert_eq!(
            classify(&candidate, &class_a(), &no_known_methods),
            Placement::Method {
                class: "A".to_string()
            }
        );
    }

    #[test]
    fn test_top_level_function() {
        let candidate = Candidate {
            name: "helper",
            params: "(x, y)",
            start_line: 12,
            indent: 0,
            has_method_decorator: false,
            is_classmethod: false,
            ancestor_class: None,
        };
        assert_eq!(
            classify(&candidate, &class_a(), &no_known_methods),
            Placement::Function
        );
    }

    #[test]
    fn test_same_indent_as_class_is_not_a_method() {
        // A def on the line after a class but at the same indentation
        let candidate = Candidate {
            name: "sibling",
            params: "(x)",
            start_line: 5,
            indent: 0,
            has_method_decorator: false,
            is_classmethod: false,
            ancestor_class: None,
        };
        assert_eq!(
            classify(&candidate, &class_a(), &no_known_methods),
            Placement::Function
        );
    }

    #[test]
    fn test_decorator_evidence_binds_to_containing_class() {
        let candidate = Candidate {
            name: "make",
            params: "(cls)",
            start_line: 3,
            indent: 4,
            has_method_decorator: true,
            is_classmethod: true,
            ancestor_class: None,
        };
        assert_eq!(
            classify(&candidate, &class_a(), &no_known_methods),
            Placement::Method {
                class: "A".to_string()
            }
        );
    }

    #[test]
    fn test_ancestor_walk_when_ranges_missing() {
        let candidate = Candidate {
            name: "method",
            params: "(self)",
            start_line: 20,
            indent: 4,
            has_method_decorator: false,
            is_classmethod: false,
            ancestor_class: Some("B".to_string()),
        };
        assert_eq!(
            classify(&candidate, &[], &no_known_methods),
            Placement::Method {
                class: "B".to_string()
            }
        );
    }

    #[test]
    fn test_mis_associated_capture_recovered_by_known_methods() {
        let declares = |class: &str, name: &str| class == "A" && name == "lost";
        let candidate = Candidate {
            name: "lost",
            params: "(self, x)",
            start_line: 50,
            indent: 0,
            has_method_decorator: false,
            is_classmethod: false,
            ancestor_class: None,
        };
        assert_eq!(
            classify(&candidate, &class_a(), &declares),
            Placement::Method {
                class: "A".to_string()
            }
        );
    }

    #[test]
    fn test_stray_self_is_discarded() {
        let candidate = Candidate {
            name: "orphan",
            params: "(self)",
            start_line: 50,
            indent: 0,
            has_method_decorator: false,
            is_classmethod: false,
            ancestor_class: None,
        };
        assert_eq!(
            classify(&candidate, &class_a(), &no_known_methods),
            Placement::Discarded
        );
    }

    #[test]
    fn test_nested_class_prefers_innermost() {
        let classes = vec![
            ClassRange {
                name: "Outer".to_string(),
                start_line: 1,
                end_line: 20,
                indent: 0,
            },
            ClassRange {
                name: "Inner".to_string(),
                start_line: 3,
                end_line: 10,
                indent: 4,
            },
        ];
        let candidate = Candidate {
            name: "method",
            params: "(self)",
            start_line: 5,
            indent: 8,
            has_method_decorator: false,
            is_classmethod: false,
            ancestor_class: None,
        };
        assert_eq!(
            classify(&candidate, &classes, &no_known_methods),
            Placement::Method {
                class: "Inner".to_string()
            }
        );
    }

    #[test]
    fn test_first_param_parsing() {
        assert_eq!(first_param("(self, x)"), Some("self"));
        assert_eq!(first_param("(cls)"), Some("cls"));
        assert_eq!(first_param("(x: int = 3, y)"), Some("x"));
        assert_eq!(first_param("(*args, **kwargs)"), Some("args"));
        assert_eq!(first_param("()"), None);
    }

    #[test]
    fn test_normalize_classmethod_params() {
        assert_eq!(normalize_method_params("(cls, x)", true), "(cls, x)");
        assert_eq!(normalize_method_params("(x)", true), "(cls, x)");
        assert_eq!(normalize_method_params("()", true), "(cls)");
        assert_eq!(normalize_method_params("(x)", false), "(x)");
    }

    #[test]
    fn test_block_end_line_prefers_last_non_blank() {
        let lines: Vec<&str> = "class A:\n    x = 1\n    # tail comment\n\n\ny = 2\n"
            .lines()
            .collect();
        assert_eq!(block_end_line(&lines, 1, 0), 3);

        // Block running to end of file
        let lines: Vec<&str> = "def f():\n    pass\n".lines().collect();
        assert_eq!(block_end_line(&lines, 1, 0), 2);

        // Empty block degenerates to the header line
        let lines: Vec<&str> = "class A:\nx = 1\n".lines().collect();
        assert_eq!(block_end_line(&lines, 1, 0), 1);
    }
}
