// Shared error type for Chronyx core

/// Crate-wide error. Input rejection and processing failure are deliberately
/// separate variants: rejection happens before any parsing and is surfaced as
/// a transient notice, processing failure invites a retry.
#[derive(Debug, thiserror::Error)]
pub enum ChronyxError {
    #[error("input rejected: {0}")]
    InputRejected(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChronyxError {
    /// True for errors raised before any parsing began (wrong file type or
    /// oversized file: exactly one notification, no extraction attempted).
    pub fn is_rejection(&self) -> bool {
        matches!(self, ChronyxError::InputRejected(_))
    }
}

pub type Result<T> = std::result::Result<T, ChronyxError>;
