//! Codepoint sequence extraction for emoji asset lookup.
//!
//! Emoji asset repositories name their files after the hexadecimal codepoints
//! of the glyph cluster, joined with `-` (e.g. `1f468-200d-1f469-200d-1f467`).
//! These helpers turn a grapheme cluster into that key.

/// Zero-width joiner.
pub const ZWJ: char = '\u{200D}';

/// Variation selector 16 (emoji presentation).
pub const VS16: char = '\u{FE0F}';

/// Build the dash-joined, lowercase-hex codepoint sequence for a glyph cluster.
///
/// When the cluster contains no zero-width joiner, VS16 selectors are dropped
/// first: `"™\u{FE0F}"` becomes `"2122"`. ZWJ sequences keep their selectors
/// because asset repositories key them with the selector included.
///
/// ```
/// use ogcard_core::codepoint::codepoint_sequence;
///
/// assert_eq!(codepoint_sequence("😀"), "1f600");
/// assert_eq!(codepoint_sequence(""), "");
/// ```
pub fn codepoint_sequence(segment: &str) -> String {
    join_scalars(segment.chars(), segment.contains(ZWJ))
}

/// Same as [`codepoint_sequence`], for text held as UTF-16 code units.
///
/// Surrogate pairs decode to a single scalar value. Unpaired surrogates do not
/// form a scalar value and are skipped.
pub fn codepoint_sequence_utf16(units: &[u16]) -> String {
    let has_zwj = units.contains(&(ZWJ as u16));
    let scalars = char::decode_utf16(units.iter().copied()).filter_map(Result::ok);
    join_scalars(scalars, has_zwj)
}

fn join_scalars(scalars: impl Iterator<Item = char>, keep_selectors: bool) -> String {
    scalars
        .filter(|&c| keep_selectors || c != VS16)
        .map(|c| format!("{:x}", u32::from(c)))
        .collect::<Vec<_>>()
        .join("-")
}
