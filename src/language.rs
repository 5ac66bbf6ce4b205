use std::fmt;
use std::path::Path;

/// Languages known to the extension table.
///
/// Knowing a language does not imply a grammar is available for it; grammar
/// availability is a property of the [`ParserBackend`](crate::backend::ParserBackend).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Rust,
    Go,
    Java,
    Kotlin,
    C,
    Cpp,
    Ruby,
    Php,
    Swift,
    Html,
    Css,
    Markdown,
    Json,
    Yaml,
    Toml,
}

impl Language {
    /// Detect the language of a file from its extension.
    ///
    /// Pure function of the fixed extension table. Unknown extensions yield
    /// `None`, which callers must treat as "unsupported", not as a failure.
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(|e| e.to_str())?;
        Self::from_extension(ext)
    }

    /// Detect the language from an extension string (without the dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "py" => Some(Self::Python),
            "js" | "jsx" => Some(Self::JavaScript),
            "ts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "rs" => Some(Self::Rust),
            "go" => Some(Self::Go),
            "java" => Some(Self::Java),
            "kt" => Some(Self::Kotlin),
            "c" | "h" => Some(Self::C),
            "cpp" | "hpp" => Some(Self::Cpp),
            "rb" => Some(Self::Ruby),
            "php" => Some(Self::Php),
            "swift" => Some(Self::Swift),
            "html" => Some(Self::Html),
            "css" => Some(Self::Css),
            "md" => Some(Self::Markdown),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// Canonical lowercase name, as used in output records
    pub fn name(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::Rust => "rust",
            Self::Go => "go",
            Self::Java => "java",
            Self::Kotlin => "kotlin",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Ruby => "ruby",
            Self::Php => "php",
            Self::Swift => "swift",
            Self::Html => "html",
            Self::Css => "css",
            Self::Markdown => "markdown",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
