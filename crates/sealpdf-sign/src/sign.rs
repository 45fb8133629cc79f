//! Signing flows: hybrid (signature in the document) and full-onchain
//! (hash registered externally, QR only).

use chrono::Utc;
use sealpdf_core::{embed, normalize, Anchor, EmbedRequest};
use serde::Serialize;
use tracing::info;

use crate::error::SignError;
use crate::hash::{content_hash, is_valid_signature};
use crate::payload::{
    encode_attachment, hybrid_verify_url, nfc, onchain_verify_url, ExtractedData,
};

/// Produces a recoverable ECDSA signature over the document fields.
/// Implementations wrap a wallet, an HSM, or a test key.
pub trait CertificateSigner {
    fn sign(
        &self,
        timestamp: i64,
        hash: &str,
        number: &str,
        recipient: &str,
        title: &str,
    ) -> Result<String, SignError>;
}

/// Registers a document hash with external storage (contract, registry)
/// for full-onchain mode.
pub trait HashRegistrar {
    fn register(
        &self,
        timestamp: i64,
        hash: &str,
        number: &str,
        recipient: &str,
        title: &str,
    ) -> Result<(), SignError>;
}

/// Document metadata and placement for a signing run.
pub struct SignRequest<'a> {
    pub number: &'a str,
    pub recipient: &'a str,
    pub title: &'a str,
    /// 1-based page the QR lands on.
    pub page: u32,
    pub anchor: Anchor,
    /// Origin of the verifier frontend, no trailing slash.
    pub base_url: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignedDocument {
    #[serde(skip)]
    pub signed_pdf: Vec<u8>,
    pub hash: String,
    pub signature: String,
    pub qr_url: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SealedDocument {
    #[serde(skip)]
    pub sealed_pdf: Vec<u8>,
    pub hash: String,
    pub qr_url: String,
    pub timestamp: i64,
}

/// Hybrid signing: normalize, hash, obtain a signature, then embed both
/// the QR (verify URL with all signed fields) and the signature
/// attachment.
pub fn sign_document(
    input: &[u8],
    req: &SignRequest,
    signer: &dyn CertificateSigner,
) -> Result<SignedDocument, SignError> {
    sign_document_at(input, req, signer, Utc::now().timestamp())
}

/// [`sign_document`] with an explicit timestamp, for deterministic runs.
pub fn sign_document_at(
    input: &[u8],
    req: &SignRequest,
    signer: &dyn CertificateSigner,
    timestamp: i64,
) -> Result<SignedDocument, SignError> {
    let norm = normalize(input)?;
    let hash = content_hash(&norm.bytes);

    let number = nfc(req.number);
    let recipient = nfc(req.recipient);
    let title = nfc(req.title);

    let signature = signer.sign(timestamp, &hash, &number, &recipient, &title)?;
    if !is_valid_signature(&signature) {
        return Err(SignError::InvalidSignature(signature));
    }

    let data = ExtractedData {
        date: timestamp,
        signature: signature.clone(),
        number,
        recipient,
        title,
    };
    let qr_url = hybrid_verify_url(req.base_url, &data, &hash);
    let attachment = encode_attachment(&data);

    let signed_pdf = embed(
        &norm.bytes,
        &norm.pages,
        &EmbedRequest {
            qr_text: &qr_url,
            attachment: Some(&attachment),
            page: req.page,
            anchor: req.anchor,
        },
    )?;

    info!(%hash, timestamp, bytes = signed_pdf.len(), "document signed");
    Ok(SignedDocument {
        signed_pdf,
        hash,
        signature,
        qr_url,
        timestamp,
    })
}

/// Full-onchain signing: register the hash externally, then embed only
/// the QR. No signature travels with the document.
pub fn seal_document(
    input: &[u8],
    req: &SignRequest,
    registrar: &dyn HashRegistrar,
) -> Result<SealedDocument, SignError> {
    seal_document_at(input, req, registrar, Utc::now().timestamp())
}

pub fn seal_document_at(
    input: &[u8],
    req: &SignRequest,
    registrar: &dyn HashRegistrar,
    timestamp: i64,
) -> Result<SealedDocument, SignError> {
    let norm = normalize(input)?;
    let hash = content_hash(&norm.bytes);

    registrar.register(
        timestamp,
        &hash,
        &nfc(req.number),
        &nfc(req.recipient),
        &nfc(req.title),
    )?;

    let qr_url = onchain_verify_url(req.base_url, &hash);
    let sealed_pdf = embed(
        &norm.bytes,
        &norm.pages,
        &EmbedRequest {
            qr_text: &qr_url,
            attachment: None,
            page: req.page,
            anchor: req.anchor,
        },
    )?;

    info!(%hash, timestamp, "document sealed for onchain verification");
    Ok(SealedDocument {
        sealed_pdf,
        hash,
        qr_url,
        timestamp,
    })
}
