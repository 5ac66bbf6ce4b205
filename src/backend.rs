//! Parser backend capabilities.
//!
//! The backend is constructed once at startup and passed by reference into
//! the extractor factory, so grammar availability and the fallback switch are
//! explicit state rather than hidden globals.

use log::info;
use tree_sitter::Language as Grammar;

use crate::language::Language;

/// Environment switch forcing the regex fallback parser even when a grammar
/// is compiled in. Useful for exercising the degraded path.
pub const FORCE_FALLBACK_ENV: &str = "STRUCTURE_FROM_SOURCE_FORCE_FALLBACK";

/// Capability object describing which parsing backends are usable.
///
/// Grammars are compiled into the binary, so "unavailable" here means either
/// that no grammar is registered for a language or that the fallback parser
/// has been forced.
#[derive(Debug, Clone)]
pub struct ParserBackend {
    force_fallback: bool,
}

impl ParserBackend {
    /// Construct a backend, probing the environment for the fallback switch
    pub fn probe() -> Self {
        let force_fallback = std::env::var(FORCE_FALLBACK_ENV).as_deref() == Ok("1");
        if force_fallback {
            info!("{} is set; using fallback parser", FORCE_FALLBACK_ENV);
        }
        Self { force_fallback }
    }

    /// Construct a backend with an explicit fallback setting
    pub fn with_fallback_forced(force_fallback: bool) -> Self {
        Self { force_fallback }
    }

    /// Whether the regex fallback has been forced
    pub fn fallback_forced(&self) -> bool {
        self.force_fallback
    }

    /// The compiled-in grammar for a language, if one is registered.
    ///
    /// Grammar handles are cheap and safely shared across threads; the
    /// parse tree and cursors built from them are per-call.
    pub fn grammar(&self, language: Language) -> Option<Grammar> {
        match language {
            Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::Tsx => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
            Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            Language::Go => Some(tree_sitter_go::LANGUAGE.into()),
            Language::Java => Some(tree_sitter_java::LANGUAGE.into()),
            Language::C => Some(tree_sitter_c::LANGUAGE.into()),
            Language::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
            Language::Kotlin
            | Language::Ruby
            | Language::Php
            | Language::Swift
            | Language::Html
            | Language::Css
            | Language::Markdown
            | Language::Json
            | Language::Yaml
            | Language::Toml => None,
        }
    }

    /// Whether the grammar path can be used for a language
    pub fn grammar_usable(&self, language: Language) -> bool {
        !self.force_fallback && self.grammar(language).is_some()
    }
}

impl Default for ParserBackend {
    fn default() -> Self {
        Self::probe()
    }
}
