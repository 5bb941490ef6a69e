//! SVG serialization of a laid-out [`Frame`].

use crate::error::Result;
use crate::glyph::{GlyphClass, GlyphResolver, ResolvedGlyph};

use super::{Frame, Item, TextItem};

/// Write `frame` as a standalone SVG document.
///
/// Text runs are set in `family`, falling back to the generic sans-serif.
/// Emoji and clusters the font cannot draw are handed to `resolver` in
/// document order.
pub(super) async fn write<R>(frame: &Frame, family: &str, resolver: &R) -> Result<String>
where
    R: GlyphResolver + Sync,
{
    let mut svg = String::with_capacity(8192);
    svg.push_str(&format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"##,
        w = frame.width,
        h = frame.height,
    ));

    let font = format!("{}, sans-serif", escape(family));

    for item in &frame.items {
        match item {
            Item::Rect {
                x,
                y,
                width,
                height,
                fill,
            } => svg.push_str(&format!(
                r##"<rect x="{x}" y="{y}" width="{width}" height="{height}" fill="{fill}"/>"##,
                fill = fill.0,
            )),
            Item::Image {
                x,
                y,
                width,
                height,
                href,
            } => svg.push_str(&image(*x, *y, *width, *height, href)),
            Item::Text(text) => write_text(&mut svg, text, &font, resolver).await?,
        }
    }

    svg.push_str("</svg>");
    Ok(svg)
}

async fn write_text<R>(svg: &mut String, item: &TextItem, font: &str, resolver: &R) -> Result<()>
where
    R: GlyphResolver + Sync,
{
    let weight = if item.bold { "bold" } else { "normal" };

    for (index, line) in item.lines.iter().enumerate() {
        let top = item.y + index as f32 * item.line_height;
        let baseline = top + item.baseline;
        let mut x = item.x;
        let mut run = String::new();
        let mut run_x = x;

        for cluster in &line.clusters {
            let resolved = match cluster.class {
                GlyphClass::Text => None,
                class => Some(resolver.resolve(class, &cluster.text).await?),
            };

            match resolved {
                Some(ResolvedGlyph::Image(href)) => {
                    flush(svg, &mut run, run_x, baseline, font, item, weight);
                    let size = item.font_size;
                    let y = top + (item.line_height - size) / 2.0;
                    svg.push_str(&image(x, y, cluster.width, size, &href));
                    x += cluster.width;
                    run_x = x;
                }
                Some(ResolvedGlyph::Text(text)) => {
                    run.push_str(&text);
                    x += cluster.width;
                }
                None => {
                    run.push_str(&cluster.text);
                    x += cluster.width;
                }
            }
        }

        flush(svg, &mut run, run_x, baseline, font, item, weight);
    }

    Ok(())
}

fn flush(
    svg: &mut String,
    run: &mut String,
    x: f32,
    y: f32,
    font: &str,
    item: &TextItem,
    weight: &str,
) {
    if run.is_empty() {
        return;
    }
    svg.push_str(&format!(
        r##"<text x="{x}" y="{y}" xml:space="preserve" font-family="{font}" font-size="{size}" font-weight="{weight}" fill="{fill}">{text}</text>"##,
        size = item.font_size,
        fill = item.color.0,
        text = escape(run),
    ));
    run.clear();
}

fn image(x: f32, y: f32, width: f32, height: f32, href: &str) -> String {
    format!(
        r##"<image x="{x}" y="{y}" width="{width}" height="{height}" preserveAspectRatio="xMidYMid meet" href="{href}"/>"##,
        href = escape(href),
    )
}

/// Escape text for use in XML content and attribute values.
///
/// Characters XML 1.0 does not allow anywhere in a document are dropped.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if !is_xml_char(c) => {}
            c => out.push(c),
        }
    }
    out
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}
