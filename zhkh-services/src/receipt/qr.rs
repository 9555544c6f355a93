/// QR codes for receipts
///
/// The payload is encoded once into a [`QrGrid`]. The grid is drawn onto the
/// PDF receipt and also saved as a standalone black-on-white PNG with
/// 10 pixel modules and a 4 module quiet zone.

use super::ReceiptError;
use image::{ImageBuffer, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};
use std::io::Cursor;

/// Pixels per module in the PNG
pub const MODULE_PIXELS: u32 = 10;

/// Quiet zone width in modules
pub const QUIET_ZONE: u32 = 4;

/// Square matrix of QR modules, `true` for dark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrGrid {
    width: usize,
    modules: Vec<bool>,
}

impl QrGrid {
    /// Encodes a payload with low error correction and the smallest version that fits
    pub fn encode(payload: &str) -> Result<Self, ReceiptError> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::L)?;
        Ok(Self {
            width: code.width(),
            modules: code
                .to_colors()
                .into_iter()
                .map(|color| color == Color::Dark)
                .collect(),
        })
    }

    /// Modules per side, quiet zone excluded
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the module at column `x`, row `y` is dark
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.modules[y * self.width + x]
    }

    /// Renders the grid as PNG bytes
    pub fn to_png(&self) -> Result<Vec<u8>, ReceiptError> {
        let side = (self.width as u32 + 2 * QUIET_ZONE) * MODULE_PIXELS;

        let image = ImageBuffer::from_fn(side, side, |px, py| {
            let x = (px / MODULE_PIXELS) as usize;
            let y = (py / MODULE_PIXELS) as usize;
            let quiet = QUIET_ZONE as usize;
            let inside = (quiet..quiet + self.width).contains(&x)
                && (quiet..quiet + self.width).contains(&y);

            if inside && self.is_dark(x - quiet, y - quiet) {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        });

        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

/// File name of the QR image for an account and a `YYYYMM` period
pub fn qr_file_name(account_id: i64, period: &str) -> String {
    format!("ACC{:03}_{}_qr.png", account_id, period)
}
