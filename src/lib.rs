//! Structure From Source - Code structure and API extraction for documentation generation.
//!
//! This library turns source files into a normalized structural model (modules, classes,
//! functions, docstrings, line ranges) and specializes that model for Python/FastAPI code
//! into HTTP endpoint and Pydantic schema records. The records feed an external
//! documentation layer; no rendering, persistence or network code lives here.
//!
//! # Parsing Backends
//!
//! - **Grammar path**: tree-sitter grammars with declarative structure queries
//! - **Regex fallback**: a line/indentation extractor for Python, selected automatically
//!   when the grammar path is unavailable or fails
//!
//! # Architecture
//!
//! The library is organized into several modules that work together:
//!
//! 1. [`language`] - Maps file extensions to language identifiers
//! 2. [`backend`] - Describes which parsing backends are usable
//! 3. [`model`] - The shared Module/Class/Function structural model
//! 4. [`extractor`] - Structural extraction strategies (grammar and fallback)
//! 5. [`classify`] - Method-vs-function classification heuristics
//! 6. [`docstring`] - Docstring normalization and parameter-section parsing
//! 7. [`endpoint`] - FastAPI endpoint extraction
//! 8. [`schema`] - Pydantic schema field extraction
//! 9. [`analyzer`] - Whole-application FastAPI analysis
//! 10. [`api`] - File- and snippet-level structure entry points
//!
//! # Example Usage
//!
//! ```no_run
//! use structure_from_source::{
//!     analyzer::analyze_fastapi_app,
//!     api::get_code_structure,
//!     backend::ParserBackend,
//! };
//! use std::path::Path;
//!
//! // The backend is probed once and passed by reference
//! let backend = ParserBackend::probe();
//!
//! // Structure of a single file
//! let structure = get_code_structure(&backend, Path::new("src/api/app.py")).unwrap();
//! println!("{} functions", structure.functions.len());
//!
//! // Endpoints and schemas of a whole FastAPI application
//! let analysis = analyze_fastapi_app(Path::new("./my-service"), Path::new("main.py")).unwrap();
//! for endpoint in &analysis.endpoints {
//!     println!("{} {}", endpoint.method.as_str(), endpoint.path);
//! }
//! ```
//!
//! # Concurrency
//!
//! Every extraction call is synchronous and stateless; parsing N files in parallel needs
//! no coordination as long as each call runs on its own thread. The only I/O is reading
//! source files; the snippet-level entry points are pure CPU.

pub mod analyzer;
pub mod api;
pub mod backend;
pub mod classify;
pub mod docstring;
pub mod endpoint;
pub mod error;
pub mod extractor;
pub mod language;
pub mod model;
pub mod queries;
pub mod schema;
