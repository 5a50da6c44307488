use thiserror::Error;

/// The error taxonomy from §7, used internally by every component in this
/// crate. `longbox-server` maps each variant onto an HTTP status.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Unreadable/unsupported archive or missing metadata document. Scan
    /// code must catch this and fold it into the scan summary's error
    /// count; it must never propagate out of the pipeline as a failure.
    #[error("bad archive: {0}")]
    BadArchive(String),

    /// Database lock contention or an interrupted syscall. Retried a
    /// bounded number of times by the caller before being treated as fatal.
    #[error("transient error: {0}")]
    Transient(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::de::DeError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// True for anything worth retrying: an explicit `Transient`, or a
    /// `Database` error that slipped through `?`'s blanket `From` conversion
    /// carrying a lock-timeout/serialization-failure SQLSTATE (§5: "all
    /// writes must be retry-wrapped on transient lock errors").
    pub fn is_transient(&self) -> bool {
        match self {
            CoreError::Transient(_) => true,
            CoreError::Database(sqlx::Error::Database(db_err)) => {
                matches!(db_err.code().as_deref(), Some("40001") | Some("55P03"))
            }
            _ => false,
        }
    }

    /// Best-effort classification of a raw sqlx error as retryable. Postgres
    /// reports lock timeouts and serialization failures with these SQLSTATE
    /// codes; anything else is treated as fatal.
    pub fn from_sqlx_retryable(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if let Some(code) = db_err.code() {
                if code == "40001" || code == "55P03" {
                    return CoreError::Transient(db_err.message().to_string());
                }
            }
        }
        CoreError::Database(err)
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
