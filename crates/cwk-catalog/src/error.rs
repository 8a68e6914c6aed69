use cwk_progress::UnmatchedLesson;
use cwk_sequence::SequenceError;

/// Coarse failure class, used by callers to pick a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidInput,
    /// Lock timeout, deadlock, lost connection. Safe to retry.
    Transient,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Transient => "transient",
            ErrorKind::Storage => "storage",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogError {
    NotFound(String),
    Conflict(String),
    InvalidInput(String),
    Storage { transient: bool, detail: String },
}

impl CatalogError {
    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        CatalogError::NotFound(format!("could not find {what} {id}"))
    }

    pub fn storage(detail: impl Into<String>) -> Self {
        CatalogError::Storage {
            transient: false,
            detail: detail.into(),
        }
    }

    pub fn transient(detail: impl Into<String>) -> Self {
        CatalogError::Storage {
            transient: true,
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::NotFound(_) => ErrorKind::NotFound,
            CatalogError::Conflict(_) => ErrorKind::Conflict,
            CatalogError::InvalidInput(_) => ErrorKind::InvalidInput,
            CatalogError::Storage {
                transient: true, ..
            } => ErrorKind::Transient,
            CatalogError::Storage { .. } => ErrorKind::Storage,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::NotFound(m) => write!(f, "NOT_FOUND: {m}"),
            CatalogError::Conflict(m) => write!(f, "CONFLICT: {m}"),
            CatalogError::InvalidInput(m) => write!(f, "INVALID_INPUT: {m}"),
            CatalogError::Storage {
                transient: true,
                detail,
            } => write!(f, "STORAGE_TRANSIENT: {detail}"),
            CatalogError::Storage { detail, .. } => write!(f, "STORAGE: {detail}"),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<SequenceError> for CatalogError {
    fn from(e: SequenceError) -> Self {
        CatalogError::NotFound(e.to_string())
    }
}

impl From<UnmatchedLesson> for CatalogError {
    fn from(e: UnmatchedLesson) -> Self {
        CatalogError::storage(e.to_string())
    }
}
