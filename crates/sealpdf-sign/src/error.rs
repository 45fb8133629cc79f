use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignError {
    #[error(transparent)]
    Pdf(#[from] sealpdf_core::SealError),

    #[error("invalid content hash: {0}")]
    InvalidHash(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("no embedded signature data found")]
    NoEmbeddedData,

    #[error("embedded signature data is incomplete or malformed")]
    InvalidEmbeddedData,

    #[error("signer: {0}")]
    Signer(String),

    #[error("verifier: {0}")]
    Verifier(String),
}
