//! Sequential batch signing with a cooperative stop flag.
//!
//! Documents are processed strictly in order. A failing document is
//! recorded and skipped, never aborting the rest of the batch. The
//! stop flag is checked between documents, so an in-flight signature
//! always completes and no document is left half-sealed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::sign::{sign_document, CertificateSigner, SignRequest, SignedDocument};

/// Shared cancellation handle. Cloneable; any holder can request a stop.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One document to sign.
pub struct BatchItem {
    pub name: String,
    pub pdf: Vec<u8>,
    pub number: String,
    pub recipient: String,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub enum BatchOutcome {
    Signed(SignedDocument),
    Failed(String),
}

#[derive(Debug, Serialize)]
pub struct BatchRecord {
    pub name: String,
    pub outcome: BatchOutcome,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub signed: usize,
    pub failed: usize,
    /// Items never attempted because the flag was raised.
    pub remaining: usize,
    pub stopped_early: bool,
    pub total_ms: u64,
}

/// Placement and destination shared by every document in a batch.
pub struct BatchOptions<'a> {
    pub page: u32,
    pub anchor: sealpdf_core::Anchor,
    pub base_url: &'a str,
}

pub fn sign_batch(
    items: &[BatchItem],
    opts: &BatchOptions,
    signer: &dyn CertificateSigner,
    stop: &StopFlag,
) -> (Vec<BatchRecord>, BatchStats) {
    let batch_start = Instant::now();
    let mut records = Vec::with_capacity(items.len());
    let mut signed = 0;
    let mut failed = 0;
    let mut stopped_early = false;

    for (idx, item) in items.iter().enumerate() {
        if stop.is_stopped() {
            warn!(processed = idx, total = items.len(), "batch stopped");
            stopped_early = true;
            break;
        }

        let start = Instant::now();
        let req = SignRequest {
            number: &item.number,
            recipient: &item.recipient,
            title: &item.title,
            page: opts.page,
            anchor: opts.anchor,
            base_url: opts.base_url,
        };
        let outcome = match sign_document(&item.pdf, &req, signer) {
            Ok(doc) => {
                signed += 1;
                BatchOutcome::Signed(doc)
            }
            Err(e) => {
                warn!(name = %item.name, error = %e, "skipping document");
                failed += 1;
                BatchOutcome::Failed(e.to_string())
            }
        };
        records.push(BatchRecord {
            name: item.name.clone(),
            outcome,
            elapsed_ms: start.elapsed().as_millis() as u64,
        });
    }

    let stats = BatchStats {
        signed,
        failed,
        remaining: items.len() - records.len(),
        stopped_early,
        total_ms: batch_start.elapsed().as_millis() as u64,
    };
    info!(
        signed = stats.signed,
        failed = stats.failed,
        remaining = stats.remaining,
        total_ms = stats.total_ms,
        "batch finished"
    );
    (records, stats)
}
