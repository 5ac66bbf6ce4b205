//! Structural extraction strategies.
//!
//! Two implementations share one contract: the grammar-backed extractor
//! ([`grammar::GrammarExtractor`]) parses with tree-sitter and declarative
//! queries, and the regex fallback ([`fallback::FallbackExtractor`]) covers
//! Python when no grammar path is usable. Selection happens in one place —
//! the [`for_language`] factory — rather than through availability checks
//! scattered across the codebase.

pub mod fallback;
pub mod grammar;

use log::warn;

use crate::backend::ParserBackend;
use crate::error::{Error, Result};
use crate::language::Language;
use crate::model::Module;

use fallback::FallbackExtractor;
use grammar::GrammarExtractor;

/// Trait for turning source text into a populated [`Module`].
///
/// Implementations fail with an explicit error, never a panic, when the
/// source cannot be handled.
pub trait StructuralExtractor: std::fmt::Debug {
    /// Extract the structural model from `source`. `path` is recorded in the
    /// module and used in error messages; snippets pass `<string>`.
    fn extract(&self, path: &str, source: &str) -> Result<Module>;
}

/// Select an extractor for a language.
///
/// The grammar path is preferred whenever the backend has a usable grammar;
/// Python degrades to the regex fallback, every other language fails with
/// [`Error::GrammarUnavailable`].
pub fn for_language(
    backend: &ParserBackend,
    language: Language,
) -> Result<Box<dyn StructuralExtractor>> {
    if backend.grammar_usable(language) {
        Ok(Box::new(GrammarExtractor::new(backend, language)?))
    } else if language == Language::Python {
        Ok(Box::new(FallbackExtractor::new()))
    } else {
        Err(Error::GrammarUnavailable {
            language: language.name().to_string(),
        })
    }
}

/// Extract with automatic degradation: a grammar-path failure on Python is
/// retried with the regex fallback instead of surfacing to the caller.
pub fn extract_with_fallback(
    backend: &ParserBackend,
    language: Language,
    path: &str,
    source: &str,
) -> Result<Module> {
    let extractor = for_language(backend, language)?;
    match extractor.extract(path, source) {
        Ok(module) => Ok(module),
        Err(e) if language == Language::Python => {
            warn!("Grammar extraction failed for {} ({}); using fallback parser", path, e);
            FallbackExtractor::new().extract(path, source)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_prefers_grammar_path() {
        let backend = ParserBackend::with_fallback_forced(false);
        assert!(for_language(&backend, Language::Python).is_ok());
        assert!(for_language(&backend, Language::JavaScript).is_ok());
    }

    #[test]
    fn test_factory_falls_back_for_python_only() {
        let backend = ParserBackend::with_fallback_forced(true);
        // Python degrades to the regex extractor
        let extractor = for_language(&backend, Language::Python).unwrap();
        let module = extractor.extract("<string>", "def f():\n    pass\n").unwrap();
        assert_eq!(module.functions.len(), 1);

        // Other languages fail terminally
        let err = for_language(&backend, Language::JavaScript).unwrap_err();
        assert!(matches!(err, Error::GrammarUnavailable { .. }));
    }

    #[test]
    fn test_no_grammar_no_fallback_language() {
        let backend = ParserBackend::with_fallback_forced(false);
        let err = for_language(&backend, Language::Ruby).unwrap_err();
        assert!(matches!(err, Error::GrammarUnavailable { .. }));
    }
}
