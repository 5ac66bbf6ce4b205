//! Whole-application FastAPI analysis.
//!
//! Starting from an entry-point file, finds the `FastAPI()` instance,
//! follows `include_router(...)` calls to their defining files, merges the
//! routers' endpoints under their path prefixes, and collects the data-model
//! schemas discovered across the repository. One file failing to read or
//! parse is logged and skipped; it never aborts the analysis.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::endpoint::{Endpoint, EndpointExtractor};
use crate::error::{Error, Result};
use crate::schema::{self, Schema, SchemaExtractor};

static APP_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+)\s*=\s*FastAPI\s*\(").unwrap());

/// Result of analyzing a FastAPI application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppAnalysis {
    pub endpoints: Vec<Endpoint>,
    pub schemas: Vec<Schema>,
}

/// Resolves a router variable (`users_router` in
/// `app.include_router(users_router, ...)`) to the file defining it.
///
/// The resolver is a collaborator of the analysis, not part of it; tests and
/// embedders can substitute their own lookup.
pub trait RouterResolver {
    /// Repo-relative path of the file containing
    /// `<variable> = APIRouter(...)`, if one can be found
    fn resolve(&self, repo_root: &Path, variable: &str) -> Option<PathBuf>;
}

/// Best-effort textual resolver: walks the repository's Python files and
/// returns the first one assigning the variable from `APIRouter(...)`
pub struct WalkdirRouterResolver;

impl RouterResolver for WalkdirRouterResolver {
    fn resolve(&self, repo_root: &Path, variable: &str) -> Option<PathBuf> {
        let pattern = Regex::new(&format!(
            r"(?m)^\s*{}\s*=\s*APIRouter\s*\(",
            regex::escape(variable)
        ))
        .ok()?;

        for path in python_files(repo_root) {
            let Ok(content) = fs::read_to_string(&path) else {
                warn!("Could not read {} during router search", path.display());
                continue;
            };
            if pattern.is_match(&content) {
                let relative = path.strip_prefix(repo_root).unwrap_or(&path).to_path_buf();
                info!(
                    "Found definition of '{}' in: {}",
                    variable,
                    relative.display()
                );
                return Some(relative);
            }
        }

        warn!("Could not find file defining '{} = APIRouter()'", variable);
        None
    }
}

/// Analyze a FastAPI application with the default router resolver
pub fn analyze_fastapi_app(repo_root: &Path, entry_point: &Path) -> Result<AppAnalysis> {
    analyze_fastapi_app_with_resolver(repo_root, entry_point, &WalkdirRouterResolver)
}

/// Analyze a FastAPI application, resolving routers through `resolver`
pub fn analyze_fastapi_app_with_resolver(
    repo_root: &Path,
    entry_point: &Path,
    resolver: &dyn RouterResolver,
) -> Result<AppAnalysis> {
    info!(
        "Starting FastAPI analysis from entry point: {}",
        entry_point.display()
    );

    let entry_full = if entry_point.is_absolute() {
        entry_point.to_path_buf()
    } else {
        repo_root.join(entry_point)
    };
    if !entry_full.exists() {
        return Err(Error::FileNotFound { path: entry_full });
    }
    let entry_source = fs::read_to_string(&entry_full)?;

    // The app instance variable; `app` is assumed when no `= FastAPI(` is
    // visible
    let app_variable = match APP_PATTERN.captures(&entry_source) {
        Some(caps) => {
            let name = caps[1].to_string();
            info!("Found FastAPI app instance variable: '{}'", name);
            name
        }
        None => {
            warn!(
                "Could not find FastAPI app instantiation in {}; assuming 'app'",
                entry_point.display()
            );
            "app".to_string()
        }
    };

    // include_router(router_var, prefix="...") calls in the entry point
    let mut routers: Vec<(String, String)> = Vec::new();
    match Regex::new(&format!(
        r#"{}\.include_router\s*\(\s*(\w+)(?:\s*,\s*prefix\s*=\s*["'](.*?)["'])?"#,
        regex::escape(&app_variable)
    )) {
        Ok(router_pattern) => {
            for caps in router_pattern.captures_iter(&entry_source) {
                let variable = caps[1].to_string();
                let prefix = caps
                    .get(2)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_else(|| "/".to_string());
                info!(
                    "Found included router variable: '{}' with prefix: '{}'",
                    variable, prefix
                );
                routers.push((variable, prefix));
            }
        }
        Err(e) => warn!("Could not build include_router pattern: {}", e),
    }

    let extractor = EndpointExtractor::new();
    let mut endpoints =
        extractor.extract_file(&entry_point.to_string_lossy(), &entry_source)?;

    // Routers contribute their endpoints under the configured prefix
    for (variable, prefix) in &routers {
        let Some(router_relative) = resolver.resolve(repo_root, variable) else {
            warn!("Could not resolve source file for router '{}'; skipping", variable);
            continue;
        };
        let router_full = repo_root.join(&router_relative);
        let router_source = match fs::read_to_string(&router_full) {
            Ok(source) => source,
            Err(e) => {
                warn!("Failed to read router file {}: {}", router_full.display(), e);
                continue;
            }
        };
        match extractor.extract_file(&router_relative.to_string_lossy(), &router_source) {
            Ok(router_endpoints) => {
                for mut endpoint in router_endpoints {
                    endpoint.path = combine_paths(prefix, &endpoint.path);
                    endpoints.push(endpoint);
                }
            }
            Err(e) => warn!(
                "Could not parse router file {}: {}",
                router_relative.display(),
                e
            ),
        }
    }

    let schemas = collect_schemas(repo_root);

    info!(
        "Finished FastAPI analysis for {}: {} endpoints, {} schemas",
        entry_point.display(),
        endpoints.len(),
        schemas.len()
    );
    Ok(AppAnalysis { endpoints, schemas })
}

/// Scan the repository for data-model classes, deduplicated by name
fn collect_schemas(repo_root: &Path) -> Vec<Schema> {
    let extractor = SchemaExtractor::new();
    let mut schemas = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for path in python_files(repo_root) {
        let relative = path.strip_prefix(repo_root).unwrap_or(&path);
        let Ok(source) = fs::read_to_string(&path) else {
            warn!("Could not read {} during schema scan", path.display());
            continue;
        };
        let candidates = match extractor.extract_file(&relative.to_string_lossy(), &source) {
            Ok(candidates) => candidates,
            Err(e) => {
                debug!("Skipping {} during schema scan: {}", relative.display(), e);
                continue;
            }
        };
        for candidate in candidates {
            if !schema::is_data_model(&candidate) {
                continue;
            }
            if seen.insert(candidate.schema.name.clone()) {
                info!(
                    "Parsed schema '{}' from {}",
                    candidate.schema.name,
                    relative.display()
                );
                schemas.push(candidate.schema);
            }
        }
    }

    schemas
}

/// All Python files under a root, skipping hidden directories and common
/// vendor/cache trees
fn python_files(root: &Path) -> impl Iterator<Item = PathBuf> {
    let root = root.to_path_buf();
    WalkDir::new(&root)
        .into_iter()
        .filter_entry(move |entry| {
            if entry.path() == root {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            let is_hidden = name.starts_with('.');
            let is_vendor = matches!(name.as_ref(), "__pycache__" | "venv" | "node_modules");
            !is_hidden && !is_vendor
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Failed to access path: {}", e);
                None
            }
        })
        .filter(|entry| {
            entry.path().is_file()
                && entry.path().extension().and_then(|s| s.to_str()) == Some("py")
        })
        .map(|entry| entry.into_path())
}

/// Join a router prefix and a route path, handling slashes
fn combine_paths(prefix: &str, path: &str) -> String {
    if prefix.is_empty() || prefix == "/" {
        return path.to_string();
    }
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        prefix.to_string()
    } else {
        format!("{}/{}", prefix, path)
    }
}
