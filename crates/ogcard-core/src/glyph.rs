//! Glyph segment classification and asset resolution.
//!
//! The layout engine splits text into grapheme clusters and hands every
//! cluster that the loaded font cannot draw by itself to a [`GlyphResolver`].
//! Emoji come back as inline images; anything else passes through as text.

use icu_properties::CodePointSetData;
use icu_properties::props::{EmojiPresentation, ExtendedPictographic, RegionalIndicator};

use crate::error::Result;

const KEYCAP: char = '\u{20E3}';
const VS16: char = '\u{FE0F}';
const ZWJ: char = '\u{200D}';

/// How the layout engine classified a grapheme cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphClass {
    /// Ordinary text the font can draw.
    Text,
    /// An emoji cluster (pictograph, flag, keycap).
    Emoji,
    /// Text the font has no glyph for.
    Missing,
}

/// Outcome of resolving a glyph segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedGlyph {
    /// Draw this image (a `data:` URI) in place of the segment.
    Image(String),
    /// Draw the segment as text.
    Text(String),
}

/// Resolves glyph segments the font cannot draw on its own.
///
/// Called once per occurrence, in document order, while the SVG is written.
pub trait GlyphResolver {
    fn resolve(
        &self,
        class: GlyphClass,
        segment: &str,
    ) -> impl Future<Output = Result<ResolvedGlyph>> + Send;
}

/// Resolver that never substitutes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl GlyphResolver for Passthrough {
    async fn resolve(&self, _class: GlyphClass, segment: &str) -> Result<ResolvedGlyph> {
        Ok(ResolvedGlyph::Text(segment.to_string()))
    }
}

/// Whether a grapheme cluster is an emoji.
///
/// Pictographs that default to text presentation (©, ™, ↔) only count when
/// followed by U+FE0F or joined with U+200D.
pub fn is_emoji(cluster: &str) -> bool {
    let Some(first) = cluster.chars().next() else {
        return false;
    };
    if CodePointSetData::new::<EmojiPresentation>().contains(first) || cluster.contains(KEYCAP) {
        return true;
    }
    if cluster.contains(VS16) || cluster.contains(ZWJ) {
        return CodePointSetData::new::<ExtendedPictographic>().contains(first);
    }
    let regional = CodePointSetData::new::<RegionalIndicator>();
    cluster.chars().filter(|&c| regional.contains(c)).count() >= 2
}

/// Classify a grapheme cluster against a glyph-coverage predicate.
pub fn classify(cluster: &str, has_glyph: impl Fn(char) -> bool) -> GlyphClass {
    if is_emoji(cluster) {
        GlyphClass::Emoji
    } else if cluster
        .chars()
        .any(|c| !c.is_whitespace() && !c.is_control() && !has_glyph(c))
    {
        GlyphClass::Missing
    } else {
        GlyphClass::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_emoji() {
        assert!(is_emoji("😀"));
        assert!(is_emoji("🇯🇵"));
        assert!(is_emoji("👨\u{200D}👩\u{200D}👧"));
        assert!(is_emoji("™\u{FE0F}"));
        assert!(is_emoji("#\u{FE0F}\u{20E3}"));
        assert!(!is_emoji("a"));
        assert!(!is_emoji("日"));
        assert!(!is_emoji("1"));
        assert!(!is_emoji(""));
    }

    #[test]
    fn test_text_presentation_pictographs_are_text() {
        for symbol in ["©", "®", "™", "‼", "↔", "☺"] {
            assert!(!is_emoji(symbol), "{symbol}");
        }
        assert!(is_emoji("©\u{FE0F}"));
        assert!(is_emoji("☺\u{FE0F}"));
        assert_eq!(classify("©", |_| true), GlyphClass::Text);
    }

    #[test]
    fn test_classify() {
        let ascii_only = |c: char| c.is_ascii();
        assert_eq!(classify("a", ascii_only), GlyphClass::Text);
        assert_eq!(classify(" ", ascii_only), GlyphClass::Text);
        assert_eq!(classify("😀", ascii_only), GlyphClass::Emoji);
        assert_eq!(classify("日", ascii_only), GlyphClass::Missing);
    }

    #[tokio::test]
    async fn test_passthrough_returns_input() {
        let resolved = Passthrough.resolve(GlyphClass::Emoji, "😀").await.unwrap();
        assert_eq!(resolved, ResolvedGlyph::Text("😀".to_string()));
    }
}
