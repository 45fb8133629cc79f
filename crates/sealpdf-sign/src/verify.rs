//! Verification flows, mirroring the two signing modes.

use sealpdf_core::detach;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::SignError;
use crate::hash::{content_hash, is_valid_signature};
use crate::payload::{extract_fields, nfc, ExtractedData};

/// Outcome of checking one signature against the certificate authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_valid: bool,
    /// Address recovered from the signature.
    pub recovered_signer: String,
    /// Display name the signer held at signing time, when known.
    pub signer_name_at_time: Option<String>,
}

/// Checks a signature over the document fields. Implementations wrap
/// the verification contract or a local key registry.
pub trait CertificateVerifier {
    fn verify(
        &self,
        date: i64,
        hash: &str,
        number: &str,
        recipient: &str,
        title: &str,
        signature: &str,
    ) -> Result<Verdict, SignError>;
}

/// What a full-onchain lookup returns for a hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnchainRecord {
    pub is_valid: bool,
    pub date: i64,
    pub number: String,
    pub recipient: String,
    pub title: String,
    pub signer: String,
    pub signer_name_at_time: Option<String>,
}

/// Looks a content hash up in external storage.
pub trait HashVerifier {
    fn lookup(&self, hash: &str) -> Result<OnchainRecord, SignError>;
}

/// Full result of a hybrid verification.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub verdict: Verdict,
    pub extracted: ExtractedData,
    pub recalculated_hash: String,
    /// The file carried bytes past the seal; the hash check ran over
    /// the original plus those bytes, so a tampered file cannot pass.
    pub modified_after_signing: bool,
}

/// Full result of a full-onchain verification.
#[derive(Debug, Clone, Serialize)]
pub struct OnchainReport {
    pub record: OnchainRecord,
    pub recalculated_hash: String,
    pub modified_after_signing: bool,
}

/// Hybrid verification: detach, parse the embedded fields, rehash the
/// restored bytes, and hand everything to the verifier.
pub fn verify_document(
    input: &[u8],
    verifier: &dyn CertificateVerifier,
) -> Result<VerificationReport, SignError> {
    let detached = detach(input);
    let text = detached.embedded_text.ok_or(SignError::NoEmbeddedData)?;
    let extracted = extract_fields(&nfc(&text)).ok_or(SignError::InvalidEmbeddedData)?;
    if !is_valid_signature(&extracted.signature) {
        return Err(SignError::InvalidSignature(extracted.signature));
    }

    let recalculated_hash = content_hash(&detached.restored);
    info!(
        hash = %recalculated_hash,
        modified = detached.modified_after_signing,
        "verifying embedded signature"
    );

    let verdict = verifier.verify(
        extracted.date,
        &recalculated_hash,
        &extracted.number,
        &extracted.recipient,
        &extracted.title,
        &extracted.signature,
    )?;

    Ok(VerificationReport {
        verdict,
        extracted,
        recalculated_hash,
        modified_after_signing: detached.modified_after_signing,
    })
}

/// Full-onchain verification: detach, rehash, look the hash up.
pub fn verify_sealed_document(
    input: &[u8],
    verifier: &dyn HashVerifier,
) -> Result<OnchainReport, SignError> {
    let detached = detach(input);
    let recalculated_hash = content_hash(&detached.restored);
    let record = verifier.lookup(&recalculated_hash)?;
    Ok(OnchainReport {
        record,
        recalculated_hash,
        modified_after_signing: detached.modified_after_signing,
    })
}
