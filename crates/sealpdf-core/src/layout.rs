//! QR placement: size selection and anchor positioning.

/// Width and height of a page in PDF points, taken from its `/MediaBox`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDimensions {
    pub width: f64,
    pub height: f64,
}

/// The nine page positions a QR code can be anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    #[default]
    UpperLeft,
    UpperCenter,
    UpperRight,
    MiddleLeft,
    MiddleCenter,
    MiddleRight,
    LowerLeft,
    LowerCenter,
    LowerRight,
}

impl Anchor {
    /// Parse a position name, defaulting to the upper-left corner for
    /// anything unrecognized.
    pub fn from_name(name: &str) -> Anchor {
        match name {
            "upper-center" => Anchor::UpperCenter,
            "upper-right" => Anchor::UpperRight,
            "middle-left" => Anchor::MiddleLeft,
            "middle-center" => Anchor::MiddleCenter,
            "middle-right" => Anchor::MiddleRight,
            "lower-left" => Anchor::LowerLeft,
            "lower-center" => Anchor::LowerCenter,
            "lower-right" => Anchor::LowerRight,
            _ => Anchor::UpperLeft,
        }
    }
}

const EDGE_MARGIN: f64 = 20.0;
const MIN_SIZE: f64 = 100.0;
const MAX_SIZE: f64 = 1500.0;

/// Pick the rendered QR size for a page. Scaled from the shorter page
/// edge, with larger pages getting a proportionally larger code so it
/// stays scannable when printed.
pub fn target_qr_size(dims: PageDimensions) -> f64 {
    let m = dims.width.min(dims.height);
    let pct = if m > 3000.0 {
        0.25
    } else if m > 1500.0 {
        0.22
    } else {
        0.20
    };
    (m * pct).clamp(MIN_SIZE, MAX_SIZE)
}

/// Lower-left corner of a square of side `size` at `anchor`, inset 20pt
/// from the page edges. PDF user space has its origin at the lower left.
pub fn anchor_position(dims: PageDimensions, anchor: Anchor, size: f64) -> (f64, f64) {
    let left = EDGE_MARGIN;
    let right = dims.width - EDGE_MARGIN - size;
    let center_x = (dims.width - size) / 2.0;
    let bottom = EDGE_MARGIN;
    let top = dims.height - EDGE_MARGIN - size;
    let middle_y = (dims.height - size) / 2.0;

    match anchor {
        Anchor::UpperLeft => (left, top),
        Anchor::UpperCenter => (center_x, top),
        Anchor::UpperRight => (right, top),
        Anchor::MiddleLeft => (left, middle_y),
        Anchor::MiddleCenter => (center_x, middle_y),
        Anchor::MiddleRight => (right, middle_y),
        Anchor::LowerLeft => (left, bottom),
        Anchor::LowerCenter => (center_x, bottom),
        Anchor::LowerRight => (right, bottom),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    const ANCHORS: [Anchor; 9] = [
        Anchor::UpperLeft,
        Anchor::UpperCenter,
        Anchor::UpperRight,
        Anchor::MiddleLeft,
        Anchor::MiddleCenter,
        Anchor::MiddleRight,
        Anchor::LowerLeft,
        Anchor::LowerCenter,
        Anchor::LowerRight,
    ];

    proptest! {
        /// Any anchor keeps the square inside the page whenever the page
        /// is large enough to hold it plus both margins.
        #[test]
        fn square_stays_on_page(
            w in 300.0f64..5000.0,
            h in 300.0f64..5000.0,
            idx in 0usize..9,
        ) {
            let dims = PageDimensions { width: w, height: h };
            let size = target_qr_size(dims);
            prop_assume!(size + 2.0 * 20.0 <= w && size + 2.0 * 20.0 <= h);
            let (x, y) = anchor_position(dims, ANCHORS[idx], size);
            prop_assert!(x >= 20.0 - 1e-9);
            prop_assert!(y >= 20.0 - 1e-9);
            prop_assert!(x + size <= w - 20.0 + 1e-9);
            prop_assert!(y + size <= h - 20.0 + 1e-9);
        }
    }
}
