/// Receipt page layout
///
/// Lays out a [`ReceiptData`] on A4 pages: title, account table, charges
/// table with total, payments table, then the QR code with its payload. Tables continue
/// on a new page when the current one is full.
///
/// The built-in PDF fonts carry no Cyrillic glyphs, so all text is
/// transliterated to Latin first.

use super::pdf::{Font, PdfDocument, PAGE_HEIGHT, PAGE_WIDTH};
use super::{QrGrid, ReceiptData};

const MARGIN: f32 = 50.0;
const ROW_HEIGHT: f32 = 20.0;
const BODY_SIZE: f32 = 11.0;
const HEADING_SIZE: f32 = 14.0;
const TITLE_SIZE: f32 = 18.0;
const CELL_PADDING: f32 = 5.0;
const QR_MODULE_SIZE: f32 = 3.0;

/// Helvetica averages a little over half the font size per character
const AVG_CHAR_WIDTH: f32 = 0.55;

/// Renders a receipt into PDF bytes
pub fn render_receipt(data: &ReceiptData) -> Vec<u8> {
    let mut page = PageWriter::new();

    page.title("Payment receipt");
    page.paragraph(&format!("Billing period: {}", data.period_label));
    page.gap(10.0);

    let content_width = PAGE_WIDTH - 2.0 * MARGIN;

    page.table(
        &[content_width * 0.4, content_width * 0.6],
        None,
        &[
            vec!["Account number".to_string(), data.account_number.clone()],
            vec!["Address".to_string(), data.address.clone()],
            vec!["Area".to_string(), format!("{:.1} sq.m", data.area)],
            vec!["Residents".to_string(), data.residents.to_string()],
            vec!["Management company".to_string(), data.management_company.clone()],
        ],
    );
    page.gap(15.0);

    page.heading("Charges");
    let mut charge_rows: Vec<Vec<String>> = data
        .charges
        .iter()
        .map(|line| vec![capitalize(&line.service), format!("{:.2}", line.amount)])
        .collect();
    charge_rows.push(vec!["Total".to_string(), format!("{:.2}", data.total)]);
    page.table(
        &[content_width * 0.7, content_width * 0.3],
        Some(&["Service", "Amount"]),
        &charge_rows,
    );
    page.gap(15.0);

    page.heading("Payments");
    if data.payments.is_empty() {
        page.paragraph("No payments recorded");
    } else {
        let payment_rows: Vec<Vec<String>> = data
            .payments
            .iter()
            .map(|p| {
                vec![
                    p.date.format("%Y-%m-%d").to_string(),
                    format!("{:.2}", p.amount),
                    p.method.clone(),
                ]
            })
            .collect();
        page.table(
            &[content_width * 0.3, content_width * 0.25, content_width * 0.45],
            Some(&["Date", "Amount", "Method"]),
            &payment_rows,
        );
    }
    page.gap(15.0);

    page.heading("QR code data");
    page.qr_code(&data.qr);
    page.paragraph(&data.qr_payload);

    page.doc.finish()
}

/// Tracks the vertical cursor and breaks pages
struct PageWriter {
    doc: PdfDocument,
    y: f32,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            doc: PdfDocument::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn ensure_space(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.doc.new_page();
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn title(&mut self, text: &str) {
        self.ensure_space(TITLE_SIZE + 10.0);
        self.y -= TITLE_SIZE;
        self.doc.text(MARGIN, self.y, TITLE_SIZE, Font::Bold, &transliterate(text));
        self.y -= 12.0;
    }

    fn heading(&mut self, text: &str) {
        // keep a heading together with at least one table row
        self.ensure_space(HEADING_SIZE + 8.0 + 2.0 * ROW_HEIGHT);
        self.y -= HEADING_SIZE;
        self.doc
            .text(MARGIN, self.y, HEADING_SIZE, Font::Bold, &transliterate(text));
        self.y -= 8.0;
    }

    /// Draws the dark modules as filled squares, left aligned
    fn qr_code(&mut self, grid: &QrGrid) {
        let side = grid.width() as f32 * QR_MODULE_SIZE;
        self.ensure_space(side + 8.0);
        self.y -= 4.0;

        let top = self.y;
        for row in 0..grid.width() {
            for col in 0..grid.width() {
                if grid.is_dark(col, row) {
                    self.doc.fill_rect(
                        MARGIN + col as f32 * QR_MODULE_SIZE,
                        top - (row + 1) as f32 * QR_MODULE_SIZE,
                        QR_MODULE_SIZE,
                        QR_MODULE_SIZE,
                        0.0,
                    );
                }
            }
        }
        self.y -= side + 4.0;
    }

    fn paragraph(&mut self, text: &str) {
        self.ensure_space(BODY_SIZE + 6.0);
        self.y -= BODY_SIZE;
        let width = PAGE_WIDTH - 2.0 * MARGIN;
        self.doc.text(
            MARGIN,
            self.y,
            BODY_SIZE,
            Font::Regular,
            &fit(&transliterate(text), width, BODY_SIZE),
        );
        self.y -= 6.0;
    }

    fn table(&mut self, widths: &[f32], header: Option<&[&str]>, rows: &[Vec<String>]) {
        let total_width: f32 = widths.iter().sum();

        if let Some(header) = header {
            self.ensure_space(2.0 * ROW_HEIGHT);
            let top = self.y;
            self.doc
                .fill_rect(MARGIN, top - ROW_HEIGHT, total_width, ROW_HEIGHT, 0.85);
            let cells: Vec<String> = header.iter().map(|h| h.to_string()).collect();
            self.row(widths, &cells, Font::Bold);
        }

        for cells in rows {
            self.ensure_space(ROW_HEIGHT);
            self.row(widths, cells, Font::Regular);
        }
    }

    /// Draws one bordered row and moves the cursor below it
    fn row(&mut self, widths: &[f32], cells: &[String], font: Font) {
        let top = self.y;
        let bottom = top - ROW_HEIGHT;
        let total_width: f32 = widths.iter().sum();

        self.doc.line(MARGIN, top, MARGIN + total_width, top, 0.5);
        self.doc.line(MARGIN, bottom, MARGIN + total_width, bottom, 0.5);

        let mut x = MARGIN;
        self.doc.line(x, top, x, bottom, 0.5);
        for (width, cell) in widths.iter().zip(cells) {
            let text = fit(&transliterate(cell), width - 2.0 * CELL_PADDING, BODY_SIZE);
            self.doc
                .text(x + CELL_PADDING, bottom + 6.0, BODY_SIZE, font, &text);
            x += width;
            self.doc.line(x, top, x, bottom, 0.5);
        }

        self.y = bottom;
    }
}

/// Truncates text that would overflow `width` points
fn fit(text: &str, width: f32, size: f32) -> String {
    let max_chars = (width / (size * AVG_CHAR_WIDTH)).floor().max(4.0) as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars - 3).collect();
    truncated.push_str("...");
    truncated
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Transliterates Russian Cyrillic to Latin; other characters pass through
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let lower = c.to_lowercase().next().unwrap_or(c);
        let latin = match lower {
            'а' => "a",
            'б' => "b",
            'в' => "v",
            'г' => "g",
            'д' => "d",
            'е' => "e",
            'ё' => "e",
            'ж' => "zh",
            'з' => "z",
            'и' => "i",
            'й' => "y",
            'к' => "k",
            'л' => "l",
            'м' => "m",
            'н' => "n",
            'о' => "o",
            'п' => "p",
            'р' => "r",
            'с' => "s",
            'т' => "t",
            'у' => "u",
            'ф' => "f",
            'х' => "kh",
            'ц' => "ts",
            'ч' => "ch",
            'ш' => "sh",
            'щ' => "shch",
            'ъ' => "",
            'ы' => "y",
            'ь' => "",
            'э' => "e",
            'ю' => "yu",
            'я' => "ya",
            '«' | '»' => "\"",
            '№' => "No.",
            '—' | '–' => "-",
            _ => {
                out.push(c);
                continue;
            }
        };

        if c != lower {
            let mut letters = latin.chars();
            if let Some(first) = letters.next() {
                out.extend(first.to_uppercase());
                out.push_str(letters.as_str());
            }
        } else {
            out.push_str(latin);
        }
    }
    out
}
