//! Public structure-extraction entry points.
//!
//! Thin orchestration over the detector, backend and extractor strategy:
//! resolve the language, pick an extractor, and hand back the serializable
//! [`ModuleRecord`] shape the documentation layer consumes. All failures are
//! explicit results; batch parsing continues past individual files.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::backend::ParserBackend;
use crate::error::{Error, Result};
use crate::extractor;
use crate::language::Language;
use crate::model::ModuleRecord;

/// Extract the complete structure of a code file.
///
/// Fails with [`Error::FileNotFound`] for missing files and
/// [`Error::UnsupportedLanguage`] for extensions outside the language table.
pub fn get_code_structure(backend: &ParserBackend, path: &Path) -> Result<ModuleRecord> {
    info!("Getting code structure for {}", path.display());

    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let Some(language) = Language::detect(path) else {
        return Err(Error::UnsupportedLanguage {
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("none")
                .to_string(),
        });
    };

    let source = fs::read_to_string(path)?;
    let module =
        extractor::extract_with_fallback(backend, language, &path.to_string_lossy(), &source)?;

    debug!("Successfully extracted structure for {}", path.display());
    Ok(ModuleRecord::from(&module))
}

/// Parse a code snippet and extract its structure. No file I/O; the module
/// path is recorded as `<string>`.
pub fn parse_code_snippet(
    backend: &ParserBackend,
    code: &str,
    language: Language,
) -> Result<ModuleRecord> {
    info!("Parsing code snippet for language: {}", language);
    if code.trim().is_empty() {
        return Err(Error::parse_failure("<string>", "no code provided"));
    }

    let module = extractor::extract_with_fallback(backend, language, "<string>", code)?;
    Ok(ModuleRecord::from(&module))
}

/// Parse many files, continuing even if some fail.
///
/// Each entry of the result corresponds to the input path at the same index;
/// failures are reported inline and never abort the batch.
pub fn parse_files(backend: &ParserBackend, paths: &[PathBuf]) -> Vec<Result<ModuleRecord>> {
    debug!("Parsing {} files", paths.len());

    let results: Vec<Result<ModuleRecord>> = paths
        .iter()
        .map(|path| match get_code_structure(backend, path) {
            Ok(record) => Ok(record),
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                Err(e)
            }
        })
        .collect();

    let success_count = results.iter().filter(|r| r.is_ok()).count();
    debug!(
        "Parsing complete: {} succeeded, {} failed",
        success_count,
        results.len() - success_count
    );

    results
}
