//! PDF output for a laid-out report.
//!
//! One A4 page per document page, set in the built-in Courier face so the
//! column alignment of the layout survives. Text is written in
//! WinAnsiEncoding; characters outside it are substituted.

use super::document::{Page, ReportDocument, ReportRenderer};

// ---

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN: u32 = 40;
const FONT_SIZE: u32 = 8;
const LEADING: u32 = 13;

// Fixed objects; pages follow as (page, content) pairs.
const CATALOG: usize = 1;
const PAGES: usize = 2;
const FONT: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl ReportRenderer for PdfRenderer {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn render(&self, document: &ReportDocument) -> Vec<u8> {
        // ---
        let count = document.pages.len();
        let kids: Vec<String> = (0..count).map(|i| format!("{} 0 R", page_object(i))).collect();

        let mut pdf = PdfWriter::new();
        pdf.object(CATALOG, format!("<< /Type /Catalog /Pages {PAGES} 0 R >>").as_bytes());
        pdf.object(
            PAGES,
            format!("<< /Type /Pages /Kids [{}] /Count {count} >>", kids.join(" ")).as_bytes(),
        );
        pdf.object(
            FONT,
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Courier /Encoding /WinAnsiEncoding >>",
        );

        for (i, page) in document.pages.iter().enumerate() {
            let id = page_object(i);
            pdf.object(
                id,
                format!(
                    "<< /Type /Page /Parent {PAGES} 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                     /Resources << /Font << /F1 {FONT} 0 R >> >> /Contents {} 0 R >>",
                    id + 1
                )
                .as_bytes(),
            );
            pdf.stream(id + 1, &page_content(page));
        }

        pdf.finish()
    }
}

fn page_object(index: usize) -> usize {
    FONT + 1 + 2 * index
}

/// Body from the top margin down, footer anchored to the bottom margin.
fn page_content(page: &Page) -> Vec<u8> {
    // ---
    let footer_top = MARGIN + LEADING * page.footer.len().saturating_sub(1) as u32;
    let mut out = Vec::new();
    text_block(&mut out, PAGE_HEIGHT - MARGIN, &page.body);
    text_block(&mut out, footer_top, &page.footer);
    out
}

fn text_block(out: &mut Vec<u8>, top: u32, lines: &[String]) {
    // ---
    out.extend_from_slice(
        format!("BT\n/F1 {FONT_SIZE} Tf\n{LEADING} TL\n{MARGIN} {top} Td\n").as_bytes(),
    );
    for line in lines {
        out.extend_from_slice(&encode_line(line));
        out.extend_from_slice(b" Tj T*\n");
    }
    out.extend_from_slice(b"ET\n");
}

/// A PDF string literal in WinAnsiEncoding.
fn encode_line(line: &str) -> Vec<u8> {
    // ---
    let mut out = Vec::with_capacity(line.len() + 2);
    out.push(b'(');
    for c in line.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            ' '..='~' => out.push(c as u8),
            // Latin-1 supplement shares its code points with WinAnsi
            '\u{a0}'..='\u{ff}' => out.push(c as u32 as u8),
            '═' => out.push(b'='),
            '─' => out.push(b'-'),
            _ => out.push(b'?'),
        }
    }
    out.push(b')');
    out
}

/// Sequential object writer that keeps the byte offsets for the xref table.
struct PdfWriter {
    out: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        Self {
            out: b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n".to_vec(),
            offsets: Vec::new(),
        }
    }

    /// Objects must be written in id order, starting at 1.
    fn begin(&mut self, id: usize) {
        debug_assert_eq!(id, self.offsets.len() + 1);
        self.offsets.push(self.out.len());
        self.out.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
    }

    fn object(&mut self, id: usize, body: &[u8]) {
        self.begin(id);
        self.out.extend_from_slice(body);
        self.out.extend_from_slice(b"\nendobj\n");
    }

    fn stream(&mut self, id: usize, content: &[u8]) {
        // ---
        self.begin(id);
        self.out
            .extend_from_slice(format!("<< /Length {} >>\nstream\n", content.len()).as_bytes());
        self.out.extend_from_slice(content);
        self.out.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn finish(mut self) -> Vec<u8> {
        // ---
        let xref = self.out.len();
        let size = self.offsets.len() + 1;
        self.out
            .extend_from_slice(format!("xref\n0 {size}\n0000000000 65535 f \n").as_bytes());
        for offset in &self.offsets {
            self.out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        self.out.extend_from_slice(
            format!("trailer\n<< /Size {size} /Root {CATALOG} 0 R >>\nstartxref\n{xref}\n%%EOF\n")
                .as_bytes(),
        );
        self.out
    }
}
