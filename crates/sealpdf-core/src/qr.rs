//! QR encoding: URL text to a module matrix.

use qrcode::{EcLevel, QrCode};

use crate::error::SealError;

/// A rendered QR symbol: `modules[row][col]`, `true` for dark, row 0 at
/// the top.
#[derive(Debug, Clone)]
pub struct QrMatrix {
    pub size: usize,
    pub modules: Vec<Vec<bool>>,
}

/// Encode `text` at error-correction level M, the level scanners expect
/// for codes that may be printed and rescanned.
pub fn encode(text: &str) -> Result<QrMatrix, SealError> {
    let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::M)
        .map_err(|e| SealError::QrError(e.to_string()))?;
    let size = code.width();
    let colors = code.to_colors();
    let modules = (0..size)
        .map(|row| {
            (0..size)
                .map(|col| colors[row * size + col] == qrcode::Color::Dark)
                .collect()
        })
        .collect();
    Ok(QrMatrix { size, modules })
}
