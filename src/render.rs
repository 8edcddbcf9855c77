//! PDF writer – turns a [`LayoutConfig`] into PDF bytes using `printpdf`
//! (v0.8 ops-based API) and the builtin Helvetica faces.

use printpdf::*;

use crate::error::EngineError;
use crate::layout_config::*;

/// Gutter between a list marker and the item box, in points.
const MARKER_GUTTER: f32 = 14.0;

/// Marker drawn as a filled dot rather than a glyph.
const BULLET: &str = "\u{2022}";

/// Render a LayoutConfig into PDF bytes.
pub fn render_pdf(config: &LayoutConfig) -> Result<Vec<u8>, EngineError> {
    if config.page_width_pt <= 0.0 || config.page_height_pt <= 0.0 {
        return Err(EngineError::InvalidConfig(format!(
            "page size {}x{}pt",
            config.page_width_pt, config.page_height_pt
        )));
    }
    let page_w = Mm(config.page_width_pt * 0.352778); // pt → mm
    let page_h = Mm(config.page_height_pt * 0.352778);

    let mut doc = PdfDocument::new(&config.title);

    let mut pages: Vec<PdfPage> = config
        .pages
        .iter()
        .map(|page_layout| {
            let mut ops = Vec::new();
            for lbox in &page_layout.boxes {
                render_box(&mut ops, lbox, config.page_height_pt);
            }
            PdfPage::new(page_w, page_h, ops)
        })
        .collect();

    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }
    let page_count = pages.len();

    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());
    log::debug!("Wrote {page_count} PDF pages ({} bytes)", bytes.len());
    Ok(bytes)
}

/// Latin-1 letters U+00C0..=U+00FF folded to their unaccented base.
const LATIN1_FOLD: &[u8; 64] = b"AAAAAAACEEEEIIIIDNOOOOOxOUUUUYTsaaaaaaaceeeeiiiidnooooo/ouuuuyty";

/// Append an ASCII rendition of `c`. printpdf copies builtin-font text into
/// the content stream byte for byte, and ASCII is the range where UTF-8 and
/// WinAnsiEncoding agree.
fn push_ascii(out: &mut String, c: char) {
    match c {
        c if c.is_ascii() => out.push(c),
        '\u{2018}' | '\u{2019}' | '\u{201A}' => out.push('\''),
        '\u{201C}' | '\u{201D}' | '\u{201E}' => out.push('"'),
        '\u{2013}' | '\u{2014}' | '\u{2022}' => out.push('-'),
        '\u{2026}' => out.push_str("..."),
        '\u{20AC}' => out.push_str("EUR"),
        '\u{00A0}' => out.push(' '),
        '\u{00C0}'..='\u{00FF}' => out.push(char::from(LATIN1_FOLD[c as usize - 0xC0])),
        _ => out.push('?'),
    }
}

fn to_ascii(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        push_ascii(&mut out, c);
    }
    out
}

fn rgb(c: [f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn corner(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

fn builtin_font(bold: bool, italic: bool) -> BuiltinFont {
    match (bold, italic) {
        (true, true) => BuiltinFont::HelveticaBoldOblique,
        (true, false) => BuiltinFont::HelveticaBold,
        (false, true) => BuiltinFont::HelveticaOblique,
        (false, false) => BuiltinFont::Helvetica,
    }
}

/// One positioned run of builtin-font text; `y` is the PDF baseline.
fn push_text(ops: &mut Vec<Op>, text: &str, x: f32, y: f32, size: f32, font: BuiltinFont, color: [f32; 4]) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point { x: Pt(x), y: Pt(y) },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(size),
        font,
    });
    ops.push(Op::SetFillColor { col: rgb(color) });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(to_ascii(text))],
        font,
    });
    ops.push(Op::EndTextSection);
}

/// Round list bullet whose centre sits at x-height above the baseline.
fn push_bullet(ops: &mut Vec<Op>, x: f32, baseline: f32, size: f32, color: [f32; 4]) {
    let r = size * 0.17;
    let (cx, cy) = (x + r, baseline + size * 0.27);
    let points = (0..8)
        .map(|k| {
            let angle = std::f32::consts::FRAC_PI_4 * (k as f32 + 0.5);
            corner(cx + r * angle.cos(), cy + r * angle.sin())
        })
        .collect();
    ops.push(Op::SetFillColor { col: rgb(color) });
    ops.push(Op::DrawPolygon {
        polygon: Polygon {
            rings: vec![PolygonRing { points }],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        },
    });
}

/// Recursively render a LayoutBox and its children into PDF ops.
fn render_box(ops: &mut Vec<Op>, lbox: &LayoutBox, page_height: f32) {
    // PDF origin is bottom-left, layout origin is top-left.
    let pdf_y = page_height - lbox.y;

    if let Some(bg) = lbox.background_color {
        let (x1, y1) = (lbox.x, pdf_y - lbox.height);
        let (x2, y2) = (lbox.x + lbox.width, pdf_y);
        ops.push(Op::SetFillColor { col: rgb(bg) });
        ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing {
                    points: vec![corner(x1, y1), corner(x2, y1), corner(x2, y2), corner(x1, y2)],
                }],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        });
    }

    if let Some(text) = &lbox.text {
        let font = builtin_font(text.bold, text.italic);
        // Baseline ≈ top of line + ascender (0.75 em for Helvetica).
        let ascender = text.font_size * 0.75;

        for tline in text.lines.iter().filter(|l| !l.text.is_empty()) {
            let x = lbox.x + tline.x_offset;
            let baseline = pdf_y - tline.y_offset - ascender;
            if tline.spans.is_empty() {
                push_text(ops, &tline.text, x, baseline, text.font_size, font, text.color);
            }
            for span in tline.spans.iter().filter(|s| !s.text.trim().is_empty()) {
                push_text(
                    ops,
                    &span.text,
                    x + span.x_offset,
                    baseline,
                    text.font_size,
                    builtin_font(span.bold, span.italic),
                    span.color,
                );
            }
        }

        if let Some(marker) = &text.list_marker {
            let x = lbox.x - MARKER_GUTTER;
            if marker == BULLET {
                push_bullet(ops, x, pdf_y - ascender, text.font_size, text.color);
            } else {
                push_text(ops, marker, x, pdf_y - ascender, text.font_size, BuiltinFont::Helvetica, text.color);
            }
        }
    }

    for child in &lbox.children {
        render_box(ops, child, page_height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_empty_document() {
        let config = LayoutConfig::new("empty", 595.28, 841.89);
        let bytes = render_pdf(&config).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let config = LayoutConfig::new("bad", 0.0, 841.89);
        assert!(matches!(
            render_pdf(&config),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn text_is_folded_to_ascii() {
        assert_eq!(to_ascii("Plain (text) 42"), "Plain (text) 42");
        assert_eq!(to_ascii("caf\u{e9} \u{c0}la \u{fc}ber"), "cafe Ala uber");
        assert_eq!(to_ascii("\u{201C}a\u{201D} \u{2013} b\u{2026}"), "\"a\" - b...");
        assert_eq!(to_ascii("\u{2022} item"), "- item");
        assert_eq!(to_ascii("\u{4E2D}"), "?");
        assert!(to_ascii("\u{e7}\u{f1}\u{df}\u{ff}").is_ascii());
    }

    #[test]
    fn styled_spans_and_bullets_render() {
        let mut config = LayoutConfig::new("spans", 595.28, 841.89);
        let mut item = LayoutBox::new(60.0, 40.0, 200.0, 20.0);
        let mut line = TextLine::new("Uses Rust", 0.0, 0.0);
        for (text, x, bold) in [("Uses ", 0.0, false), ("Rust", 27.5, true)] {
            line.spans.push(TextSpan {
                text: text.into(),
                x_offset: x,
                bold,
                italic: false,
                color: [0.1, 0.2, 0.4, 1.0],
            });
        }
        item.text = Some(TextContent {
            lines: vec![line],
            font_family: "Helvetica".into(),
            font_size: 11.0,
            bold: false,
            italic: false,
            color: [0.0, 0.0, 0.0, 1.0],
            line_height: 16.5,
            list_marker: Some(BULLET.into()),
        });
        config.pages.push(PageLayout {
            page_index: 0,
            boxes: vec![item],
        });

        let mut ops = Vec::new();
        render_box(&mut ops, &config.pages[0].boxes[0], config.page_height_pt);
        let texts = ops
            .iter()
            .filter(|op| matches!(op, Op::WriteTextBuiltinFont { .. }))
            .count();
        let polygons = ops
            .iter()
            .filter(|op| matches!(op, Op::DrawPolygon { .. }))
            .count();
        assert_eq!(texts, 2);
        assert_eq!(polygons, 1);
        assert_eq!(&render_pdf(&config).unwrap()[0..5], b"%PDF-");
    }
}
