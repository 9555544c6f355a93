/// Minimal PDF 1.4 writer
///
/// Produces uncompressed documents with the two built-in Helvetica faces,
/// positioned text and straight lines. That is all a receipt needs, and it
/// keeps the output byte-for-byte predictable.
///
/// Coordinates are PDF points with the origin in the bottom-left corner.
/// Text must already be representable in WinAnsi; anything outside printable
/// ASCII is written as `?`.
///
/// # Example
///
/// ```
/// use zhkh_services::receipt::pdf::{Font, PdfDocument};
///
/// let mut doc = PdfDocument::new();
/// doc.text(50.0, 780.0, 18.0, Font::Bold, "Payment receipt");
/// doc.line(50.0, 770.0, 545.0, 770.0, 1.0);
/// let bytes = doc.finish();
/// assert!(bytes.starts_with(b"%PDF-1.4"));
/// ```

use std::fmt::Write as _;

/// A4 width in points
pub const PAGE_WIDTH: f32 = 595.0;

/// A4 height in points
pub const PAGE_HEIGHT: f32 = 842.0;

/// Built-in font faces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Document under construction
#[derive(Debug, Default)]
pub struct PdfDocument {
    /// Finished page content streams
    pages: Vec<String>,

    /// Content stream of the current page
    current: String,
}

impl PdfDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes one line of text with its baseline at `(x, y)`
    pub fn text(&mut self, x: f32, y: f32, size: f32, font: Font, text: &str) {
        let _ = writeln!(
            self.current,
            "BT /{} {} Tf {:.2} {:.2} Td ({}) Tj ET",
            font.resource(),
            size,
            x,
            y,
            escape_text(text)
        );
    }

    /// Strokes a straight line
    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32) {
        let _ = writeln!(
            self.current,
            "{:.2} w {:.2} {:.2} m {:.2} {:.2} l S",
            width, x1, y1, x2, y2
        );
    }

    /// Fills a rectangle with a grey level (0 = black, 1 = white)
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, gray: f32) {
        let _ = writeln!(
            self.current,
            "q {:.2} g {:.2} {:.2} {:.2} {:.2} re f Q",
            gray, x, y, width, height
        );
    }

    /// Closes the current page and starts a new one
    pub fn new_page(&mut self) {
        let page = std::mem::take(&mut self.current);
        self.pages.push(page);
    }

    /// Number of pages, counting the one being written
    pub fn page_count(&self) -> usize {
        self.pages.len() + 1
    }

    /// Serializes the document
    pub fn finish(mut self) -> Vec<u8> {
        self.new_page();

        // 1 catalog, 2 page tree, 3-4 fonts, then a page + content pair per page
        let page_ids: Vec<usize> = (0..self.pages.len()).map(|i| 5 + i * 2).collect();

        let mut objects: Vec<Vec<u8>> = Vec::with_capacity(4 + self.pages.len() * 2);
        objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());

        let kids = page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        objects.push(
            format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, page_ids.len()).into_bytes(),
        );

        objects.push(font_object("Helvetica"));
        objects.push(font_object("Helvetica-Bold"));

        for (index, content) in self.pages.iter().enumerate() {
            let content_id = page_ids[index] + 1;
            objects.push(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                     /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                    PAGE_WIDTH, PAGE_HEIGHT, content_id
                )
                .into_bytes(),
            );

            let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
            stream.extend_from_slice(content.as_bytes());
            stream.extend_from_slice(b"endstream");
            objects.push(stream);
        }

        let mut out: Vec<u8> = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        let mut offsets = Vec::with_capacity(objects.len());
        for (index, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_offset = out.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            let _ = write!(xref, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        );
        out.extend_from_slice(xref.as_bytes());

        out
    }
}

fn font_object(base_font: &str) -> Vec<u8> {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
        base_font
    )
    .into_bytes()
}

/// Escapes a string for a PDF literal string
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            ' '..='~' => escaped.push(c),
            _ => escaped.push('?'),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    // one char per byte so string offsets equal file offsets
    fn as_text(bytes: &[u8]) -> String {
        bytes
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { '?' })
            .collect()
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a(b)c\\"), "a\\(b\\)c\\\\");
        assert_eq!(escape_text("Цена"), "????");
    }

    #[test]
    fn test_single_page_structure() {
        let mut doc = PdfDocument::new();
        doc.text(10.0, 20.0, 12.0, Font::Regular, "Hello");
        let bytes = doc.finish();
        let text = as_text(&bytes);

        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.contains("/Count 1"));
        assert!(text.contains("(Hello) Tj"));
        assert!(text.trim_end().ends_with("%%EOF"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let mut doc = PdfDocument::new();
        doc.text(10.0, 20.0, 12.0, Font::Bold, "Page one");
        doc.new_page();
        doc.line(0.0, 0.0, 100.0, 100.0, 1.0);
        assert_eq!(doc.page_count(), 2);
        let bytes = doc.finish();
        let text = as_text(&bytes);

        let startxref = text.rfind("startxref\n").unwrap() + "startxref\n".len();
        let xref_offset: usize = text[startxref..].lines().next().unwrap().parse().unwrap();
        assert!(text[xref_offset..].starts_with("xref"));

        let entries: Vec<&str> = text[xref_offset..]
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .collect();
        // catalog, pages, 2 fonts, 2 x (page + content)
        assert_eq!(entries.len(), 8);

        for (index, entry) in entries.iter().enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            assert!(text[offset..].starts_with(&format!("{} 0 obj", index + 1)));
        }
        assert!(text.contains("/Count 2"));
    }

    #[test]
    fn test_stream_length_matches_content() {
        let mut doc = PdfDocument::new();
        doc.text(1.0, 2.0, 3.0, Font::Regular, "x");
        let text = as_text(&doc.finish());

        let start = text.find("/Length ").unwrap() + "/Length ".len();
        let length: usize = text[start..].split_whitespace().next().unwrap().parse().unwrap();
        let body_start = text.find("stream\n").unwrap() + "stream\n".len();
        let body_end = text.find("endstream").unwrap();
        assert_eq!(body_end - body_start, length);
    }
}
