use thiserror::Error;

#[derive(Error, Debug)]
pub enum SealError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Malformed trailer: {0}")]
    MalformedTrailer(String),

    #[error("Invalid object syntax: {0}")]
    SyntaxError(String),

    #[error("Object {0} not found")]
    ObjectNotFound(u32),

    #[error("Pages not found")]
    PagesNotFound,

    #[error("No pages found")]
    NoPages,

    #[error("Page {requested} not found. Total pages: {total}")]
    PageNotFound { requested: u32, total: u32 },

    #[error("QR encoding failed: {0}")]
    QrError(String),

    #[error("Document already carries a seal marker")]
    AlreadySealed,
}
