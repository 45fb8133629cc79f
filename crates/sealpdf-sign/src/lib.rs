//! Signing and verification flows over the `sealpdf-core` engine.
//!
//! Two modes share the same sealing mechanics. Hybrid mode embeds the
//! signature in the document itself, next to a QR URL carrying every
//! signed field; verifying needs only the file and the certificate
//! authority. Full-onchain mode registers the content hash externally
//! and embeds nothing but the QR, so the document stays free of
//! personal data.
//!
//! Signing backends are injected through the [`CertificateSigner`],
//! [`HashRegistrar`], [`CertificateVerifier`] and [`HashVerifier`]
//! traits.

pub mod batch;
pub mod error;
pub mod hash;
pub mod payload;
pub mod sign;
pub mod verify;

pub use batch::{sign_batch, BatchItem, BatchOptions, BatchOutcome, BatchRecord, BatchStats, StopFlag};
pub use error::SignError;
pub use hash::content_hash;
pub use payload::ExtractedData;
pub use sign::{
    seal_document, seal_document_at, sign_document, sign_document_at, CertificateSigner,
    HashRegistrar, SealedDocument, SignRequest, SignedDocument,
};
pub use verify::{
    verify_document, verify_sealed_document, CertificateVerifier, HashVerifier, OnchainRecord,
    OnchainReport, Verdict, VerificationReport,
};
