/// PDF receipts
///
/// - `pdf`: Minimal PDF writer (Helvetica, text, lines)
/// - `layout`: Receipt layout and Cyrillic transliteration
/// - `qr`: QR encoding and PNG output
///
/// Receipts are written to `<receipts dir>/ACC<account id, 3 digits>_<YYYYMM>.pdf`.
/// The QR payload `<account id>:<total>` is drawn on the receipt as a QR code,
/// printed under it, and saved as `<qrcodes dir>/ACC<id>_<YYYYMM>_qr.png`.

pub mod layout;
pub mod pdf;
pub mod qr;

pub use qr::{qr_file_name, QrGrid};

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::info;

/// Error writing a receipt
#[derive(Debug, thiserror::Error)]
pub enum ReceiptError {
    #[error("failed to write receipt {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode QR payload: {0}")]
    QrEncode(#[from] qrcode::types::QrError),

    #[error("failed to encode QR image: {0}")]
    Image(#[from] image::ImageError),
}

/// Everything printed on a receipt
#[derive(Debug, Clone)]
pub struct ReceiptData {
    pub account_number: String,
    pub address: String,
    pub area: f64,
    pub residents: i64,
    pub management_company: String,

    /// Billing month as `YYYY-MM`
    pub period_label: String,

    pub charges: Vec<ReceiptLine>,
    pub total: f64,
    pub payments: Vec<ReceiptPayment>,
    pub qr_payload: String,
    pub qr: QrGrid,
}

/// One charges table row
#[derive(Debug, Clone)]
pub struct ReceiptLine {
    pub service: String,
    pub amount: f64,
}

/// One payments table row
#[derive(Debug, Clone)]
pub struct ReceiptPayment {
    pub date: NaiveDate,
    pub amount: f64,
    pub method: String,
}

/// File name of the receipt for an account and a `YYYYMM` period
pub fn receipt_file_name(account_id: i64, period: &str) -> String {
    format!("ACC{:03}_{}.pdf", account_id, period)
}

/// Payload encoded in the receipt QR code
pub fn qr_payload(account_id: i64, total: f64) -> String {
    format!("{}:{:.2}", account_id, total)
}

/// Renders the receipt and writes it into `dir`, replacing an older version
///
/// # Returns
///
/// Path of the written file
pub async fn write_receipt(
    dir: &Path,
    file_name: &str,
    data: &ReceiptData,
) -> Result<PathBuf, ReceiptError> {
    let bytes = layout::render_receipt(data);
    let path = write_file(dir, file_name, &bytes).await?;

    info!(path = %path.display(), bytes = bytes.len(), "Receipt written");
    Ok(path)
}

/// Writes the QR code as a PNG into `dir`, replacing an older version
pub async fn write_qr_image(
    dir: &Path,
    file_name: &str,
    grid: &QrGrid,
) -> Result<PathBuf, ReceiptError> {
    let bytes = grid.to_png()?;
    let path = write_file(dir, file_name, &bytes).await?;

    info!(path = %path.display(), bytes = bytes.len(), "QR image written");
    Ok(path)
}

async fn write_file(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ReceiptError> {
    let path = dir.join(file_name);

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| ReceiptError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

    tokio::fs::write(&path, bytes)
        .await
        .map_err(|source| ReceiptError::Io {
            path: path.clone(),
            source,
        })?;

    Ok(path)
}
