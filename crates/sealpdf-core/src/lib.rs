//! PDF sealing engine: QR overlays via incremental update.
//!
//! The engine never rewrites a document it seals. Input is first
//! normalized through [`normalize`] so classic objects and xref tables
//! are visible in the byte stream, then [`embed`](embed::embed) appends
//! an update section containing the QR Form XObject, a per-page overlay
//! stream, the patched page, a classic xref table, and a trailer
//! chained with `/Prev`. A `% ORIGLEN=<n>` comment records the original
//! length so [`detach`](detach::detach) can restore the exact bytes
//! that were hashed at signing time.

pub mod detach;
pub mod draw;
pub mod embed;
pub mod error;
pub mod layout;
pub mod normalize;
pub mod object;
pub mod pages;
pub mod patch;
pub mod qr;
pub mod scan;
pub mod trailer;

pub use detach::{detach, Detached};
pub use embed::{embed, EmbedRequest};
pub use error::SealError;
pub use layout::{Anchor, PageDimensions};
pub use normalize::{normalize, NormalizedPdf};
