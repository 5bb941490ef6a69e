//! Font metrics, line breaking and line clamping.

use icu_segmenter::options::LineBreakOptions;
use icu_segmenter::{GraphemeClusterSegmenter, LineSegmenter};
use ttf_parser::{Face, GlyphId, name_id};

use crate::error::{Error, Result};
use crate::glyph::{self, GlyphClass};

const ELLIPSIS: &str = "\u{2026}";

/// A parsed font face with the measurements the layout pass needs.
pub struct FontFace<'a> {
    face: Face<'a>,
    family: String,
}

impl<'a> FontFace<'a> {
    /// Parse the first face in `data`.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let face = Face::parse(data, 0).map_err(|e| Error::Font(e.to_string()))?;
        let family = family_name(&face)
            .ok_or_else(|| Error::Font("font has no family name".to_string()))?;
        Ok(Self { face, family })
    }

    /// Family name as written in the font's `name` table.
    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn has_glyph(&self, c: char) -> bool {
        self.face.glyph_index(c).is_some()
    }

    fn scale(&self, font_size: f32) -> f32 {
        font_size / f32::from(self.face.units_per_em())
    }

    /// Horizontal advance of `c` at `font_size`; unmapped characters use `.notdef`.
    pub fn advance(&self, c: char, font_size: f32) -> f32 {
        let glyph = self.face.glyph_index(c).unwrap_or(GlyphId(0));
        let units = self.face.glyph_hor_advance(glyph).unwrap_or(0);
        f32::from(units) * self.scale(font_size)
    }

    /// Distance from the top of a line box to the baseline, for a line of
    /// `line_height` pixels. The glyph box is centered in the line box.
    pub fn baseline_offset(&self, font_size: f32, line_height: f32) -> f32 {
        let ascent = f32::from(self.face.ascender()) * self.scale(font_size);
        let descent = f32::from(self.face.descender()) * self.scale(font_size);
        (line_height - (ascent - descent)) / 2.0 + ascent
    }
}

fn family_name(face: &Face<'_>) -> Option<String> {
    let names: Vec<_> = face.names().into_iter().filter(|n| n.is_unicode()).collect();
    [name_id::TYPOGRAPHIC_FAMILY, name_id::FAMILY]
        .into_iter()
        .find_map(|id| {
            names
                .iter()
                .filter(|n| n.name_id == id)
                .find_map(|n| n.to_string())
        })
}

/// One grapheme cluster placed on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub text: String,
    pub width: f32,
    pub class: GlyphClass,
}

impl Cluster {
    fn is_space(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }
}

/// A laid-out line of clusters, left to right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    pub clusters: Vec<Cluster>,
}

impl Line {
    /// Visible width, ignoring trailing spaces.
    pub fn width(&self) -> f32 {
        let end = self
            .clusters
            .iter()
            .rposition(|c| !c.is_space())
            .map_or(0, |i| i + 1);
        self.clusters[..end].iter().map(|c| c.width).sum()
    }

    pub fn text(&self) -> String {
        self.clusters.iter().map(|c| c.text.as_str()).collect()
    }

    fn trim_end(&mut self) {
        while self.clusters.last().is_some_and(Cluster::is_space) {
            self.clusters.pop();
        }
    }
}

/// Measures clusters for a given font and size.
pub struct Shaper<'f, 'a> {
    font: &'f FontFace<'a>,
    font_size: f32,
}

impl<'f, 'a> Shaper<'f, 'a> {
    pub fn new(font: &'f FontFace<'a>, font_size: f32) -> Self {
        Self { font, font_size }
    }

    fn cluster(&self, text: &str) -> Cluster {
        let class = glyph::classify(text, |c| self.font.has_glyph(c));
        let width = match class {
            GlyphClass::Emoji => self.font_size,
            GlyphClass::Text | GlyphClass::Missing => text
                .chars()
                .filter(|c| !is_zero_width(*c))
                .map(|c| self.font.advance(c, self.font_size))
                .sum(),
        };
        Cluster {
            text: text.to_string(),
            width,
            class,
        }
    }

    fn clusters(&self, text: &str) -> Vec<Cluster> {
        let bounds: Vec<usize> = GraphemeClusterSegmenter::new().segment_str(text).collect();
        bounds
            .windows(2)
            .map(|pair| self.cluster(&text[pair[0]..pair[1]]))
            .collect()
    }

    /// Break `text` into lines no wider than `max_width`, keeping at most
    /// `max_lines`. When lines are dropped the last kept line ends in an
    /// ellipsis.
    pub fn break_lines(&self, text: &str, max_width: f32, max_lines: usize) -> Vec<Line> {
        let text = collapse_whitespace(text);
        if text.is_empty() || max_lines == 0 {
            return Vec::new();
        }

        let segmenter = LineSegmenter::new_for_non_complex_scripts(LineBreakOptions::default());
        let breaks: Vec<usize> = segmenter.segment_str(&text).collect();

        let mut lines = Vec::new();
        let mut current = Line::default();

        for pair in breaks.windows(2) {
            let word = self.clusters(&text[pair[0]..pair[1]]);
            let word_line = Line {
                clusters: word.clone(),
            };
            let fits = current.clusters.is_empty()
                || current_width(&current) + word_line.width() <= max_width;

            if fits && word_line.width() <= max_width {
                current.clusters.extend(word);
                continue;
            }

            if !current.clusters.is_empty() {
                current.trim_end();
                lines.push(std::mem::take(&mut current));
            }

            if word_line.width() <= max_width {
                current.clusters = word;
            } else {
                // A single word wider than the line: break between clusters.
                for cluster in word {
                    if !current.clusters.is_empty()
                        && current_width(&current) + cluster.width > max_width
                        && !cluster.is_space()
                    {
                        current.trim_end();
                        lines.push(std::mem::take(&mut current));
                    }
                    current.clusters.push(cluster);
                }
            }
        }

        current.trim_end();
        if !current.clusters.is_empty() {
            lines.push(current);
        }

        if lines.len() > max_lines {
            lines.truncate(max_lines);
            if let Some(last) = lines.last_mut() {
                self.ellipsize(last, max_width);
            }
        }

        lines
    }

    fn ellipsize(&self, line: &mut Line, max_width: f32) {
        let ellipsis = self.cluster(ELLIPSIS);
        line.trim_end();
        while !line.clusters.is_empty() && line.width() + ellipsis.width > max_width {
            line.clusters.pop();
            line.trim_end();
        }
        line.clusters.push(ellipsis);
    }
}

/// Width including trailing spaces, used while a line is still being filled.
fn current_width(line: &Line) -> f32 {
    line.clusters.iter().map(|c| c.width).sum()
}

fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}'..='\u{200D}' | '\u{FE00}'..='\u{FE0F}' | '\u{2060}')
}

/// Collapse runs of whitespace into single spaces and trim the ends,
/// like `white-space: normal`.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
