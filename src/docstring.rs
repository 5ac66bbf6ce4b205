//! Docstring handling: normalization, parameter-section parsing, and the
//! summary/description split used by the endpoint extractor.

use std::collections::HashMap;

use regex::Regex;

/// Strip string prefixes and quote delimiters from a raw docstring literal
/// and trim the result.
///
/// Both the grammar and fallback extractors run their captures through this,
/// so `"""doc"""` and a regex-matched `doc` come out identical.
pub fn clean(raw: &str) -> String {
    let mut text = raw.trim();

    // String prefixes (r, b, u, f and combinations) before the opening quote
    let prefix_len = text
        .bytes()
        .take_while(|b| matches!(b.to_ascii_lowercase(), b'r' | b'b' | b'u' | b'f'))
        .count();
    if text[prefix_len..].starts_with('"') || text[prefix_len..].starts_with('\'') {
        text = &text[prefix_len..];
    }

    for delim in ["\"\"\"", "'''", "\"", "'"] {
        if text.len() >= delim.len() * 2 && text.starts_with(delim) && text.ends_with(delim) {
            text = &text[delim.len()..text.len() - delim.len()];
            break;
        }
    }

    text.trim().to_string()
}

/// Split a docstring into a summary (first line) and a dedented description
/// (the remainder). Either part may be empty.
pub fn split_summary(docstring: &str) -> (String, String) {
    let text = docstring.trim();
    match text.split_once('\n') {
        Some((first, rest)) => (first.trim().to_string(), dedent(rest).trim().to_string()),
        None => (text.to_string(), String::new()),
    }
}

/// Remove the common leading indentation from every non-blank line
fn dedent(text: &str) -> String {
    let min_indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    text.lines()
        .map(|line| if line.len() >= min_indent { &line[min_indent..] } else { line.trim_start() })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse the parameter section of a Google- or reST-style docstring into a
/// name → description map.
///
/// A section opens at an `Args:`/`Arguments:`/`Parameters:` header or at the
/// first `:param name:` line, and closes at a blank line or a new top-level
/// header (`Returns:`, `Raises:`, ...). Indented lines that match neither
/// pattern continue the current parameter's description. Duplicate names are
/// not expected; last write wins.
pub fn parse_params(docstring: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    if docstring.trim().is_empty() {
        return params;
    }

    let google_style = Regex::new(r"^\s*(\w+)\s*(\(.*?\))?:\s*(.*)$").unwrap();
    let rest_param = Regex::new(r"^\s*:param\s+(\w+):\s*(.*)$").unwrap();
    let section_header = Regex::new(r"^[A-Z][A-Za-z ]*:$").unwrap();

    let mut in_section = false;
    let mut current: Option<String> = None;
    let mut description_lines: Vec<String> = Vec::new();

    let flush = |current: &mut Option<String>, lines: &mut Vec<String>, params: &mut HashMap<String, String>| {
        if let Some(name) = current.take() {
            params.insert(name, lines.join(" ").trim().to_string());
        }
        lines.clear();
    };

    for line in docstring.trim().lines() {
        let stripped = line.trim();

        if matches!(stripped, "Args:" | "Arguments:" | "Parameters:") {
            flush(&mut current, &mut description_lines, &mut params);
            in_section = true;
            continue;
        }

        // Blank line or a new top-level header ends the section
        if in_section && (stripped.is_empty() || section_header.is_match(stripped)) {
            flush(&mut current, &mut description_lines, &mut params);
            in_section = false;
            continue;
        }

        if let Some(caps) = rest_param.captures(line) {
            flush(&mut current, &mut description_lines, &mut params);
            in_section = true;
            current = Some(caps[1].to_string());
            let start = caps[2].trim();
            if !start.is_empty() {
                description_lines.push(start.to_string());
            }
            continue;
        }

        if !in_section {
            continue;
        }

        if let Some(caps) = google_style.captures(line) {
            flush(&mut current, &mut description_lines, &mut params);
            current = Some(caps[1].to_string());
            let start = caps[3].trim();
            if !start.is_empty() {
                description_lines.push(start.to_string());
            }
        } else if current.is_some() && line.starts_with(char::is_whitespace) && !stripped.is_empty() {
            // Indented, non-matching line continues the current description
            description_lines.push(stripped.to_string());
        }
    }

    flush(&mut current, &mut description_lines, &mut params);
    params
}
