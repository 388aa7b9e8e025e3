//! Backend identification.

/// Identifies the kind of backend behind a store or index.
///
/// Used as the key for health tracking and in log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// SQLite database (file-based or in-memory).
    Sqlite,
    /// Elasticsearch (search engine).
    Elasticsearch,
    /// In-process search index.
    Memory,
    /// Custom or unknown backend.
    Custom(&'static str),
}

impl BackendKind {
    /// Returns the lowercase backend name.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sqlite => "sqlite",
            BackendKind::Elasticsearch => "elasticsearch",
            BackendKind::Memory => "memory",
            BackendKind::Custom(name) => name,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
