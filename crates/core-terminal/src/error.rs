//! The library's public error taxonomy. Internal crates (`core-term`,
//! `core-input`) keep their own narrower error types and `From`-convert at
//! this boundary, the same layering the teacher draws between its
//! `core-config`/`core-state` errors and the `anyhow::Result` it only
//! reaches for at the binary boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TermError {
    #[error("terminal already initialized")]
    InitAlready,
    #[error("terminal not initialized")]
    Uninit,
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("operation interrupted")]
    Interrupted,
}

impl From<core_term::BackendError> for TermError {
    fn from(e: core_term::BackendError) -> Self {
        match e {
            core_term::BackendError::Io(e) => TermError::Io(e),
            core_term::BackendError::Unsupported(msg) => TermError::Unsupported(msg),
        }
    }
}
