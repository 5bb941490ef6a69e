//! Card model and composition.
//!
//! A card is described as a plain tree of styled boxes ([`BoxNode`]) with a
//! fixed canvas size. The tree is consumed by [`crate::layout`], which runs a
//! flexbox pass over it and writes SVG.
//!
//! Three layout variants exist. One is chosen per deployment; canvas sizes and
//! clamp limits are constants of the variant, never derived from content.

use std::fmt;
use std::str::FromStr;

/// Title used when the page has no `og:title`.
pub const DEFAULT_TITLE: &str = "Default Title";

/// Description used when the page has no `og:description`.
pub const DEFAULT_DESCRIPTION: &str =
    "Default description text that can wrap around to multiple lines if necessary.";

/// Text shown in the image region when the page has no `og:image`.
pub const NO_IMAGE_TEXT: &str = "No Image";

const BACKGROUND: Color = Color("#ADD8E6");
const TITLE_COLOR: Color = Color("#000000");
const DESCRIPTION_COLOR: Color = Color("#555555");
const PLACEHOLDER_BACKGROUND: Color = Color("#DDDDDD");
const PLACEHOLDER_COLOR: Color = Color("#666666");

/// Open Graph fields extracted from a page. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardMetadata {
    /// `og:title`.
    pub title: Option<String>,
    /// `og:description`.
    pub description: Option<String>,
    /// Absolute `og:image` URL.
    pub image_url: Option<String>,
}

/// Card layout variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CardVariant {
    /// 1200×630, text column on the left, image on the right.
    #[default]
    Landscape,
    /// 600×800, image on top, text below.
    Portrait,
    /// 600×500, image on top, short text below.
    Compact,
}

impl CardVariant {
    /// Canvas width in pixels.
    pub const fn width(self) -> u32 {
        match self {
            Self::Landscape => 1200,
            Self::Portrait | Self::Compact => 600,
        }
    }

    /// Canvas height in pixels.
    pub const fn height(self) -> u32 {
        match self {
            Self::Landscape => 630,
            Self::Portrait => 800,
            Self::Compact => 500,
        }
    }

    /// Maximum number of title lines.
    pub const fn title_lines(self) -> usize {
        2
    }

    /// Maximum number of description lines.
    pub const fn description_lines(self) -> usize {
        match self {
            Self::Landscape => 3,
            Self::Portrait => 5,
            Self::Compact => 2,
        }
    }

    /// Size of the image region along the main axis (width for landscape,
    /// height for the stacked variants).
    const fn image_extent(self) -> f32 {
        match self {
            Self::Landscape => 600.0,
            Self::Portrait => 360.0,
            Self::Compact => 250.0,
        }
    }

    /// Variant name as used in configuration.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
            Self::Compact => "compact",
        }
    }
}

impl fmt::Display for CardVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "landscape" => Ok(Self::Landscape),
            "portrait" => Ok(Self::Portrait),
            "compact" => Ok(Self::Compact),
            other => Err(format!(
                "unknown card variant '{other}' (expected landscape, portrait or compact)"
            )),
        }
    }
}

/// A CSS-like hex color (`#RRGGBB`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub &'static str);

/// A box dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Length {
    /// Sized by content and flex rules.
    #[default]
    Auto,
    /// Absolute pixels.
    Px(f32),
    /// Fraction of the parent (0.0..=1.0).
    Percent(f32),
}

/// Main axis of a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Row,
    Column,
}

/// Alignment along either axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Start,
    Center,
    End,
    Stretch,
}

/// Box styling. A small subset of flexbox is enough for the card layouts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxStyle {
    pub direction: Direction,
    pub width: Length,
    pub height: Length,
    pub flex_grow: f32,
    /// Boxes never shrink below their basis unless this is set.
    pub flex_shrink: f32,
    pub padding: f32,
    pub margin_bottom: f32,
    pub align_items: Option<Align>,
    pub justify_content: Option<Align>,
    pub background: Option<Color>,
}

/// A run of text with a line clamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub text: String,
    pub font_size: f32,
    pub bold: bool,
    pub color: Color,
    /// Lines beyond this are dropped and the last kept line gets an ellipsis.
    pub max_lines: usize,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
}

/// What a box holds.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Children(Vec<BoxNode>),
    Text(TextBlock),
    /// An image scaled to fit the box (`object-fit: contain`).
    Image { src: String },
    Empty,
}

/// One styled rectangular region.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxNode {
    pub style: BoxStyle,
    pub content: Content,
}

impl BoxNode {
    fn container(style: BoxStyle, children: Vec<BoxNode>) -> Self {
        Self {
            style,
            content: Content::Children(children),
        }
    }

    fn text(style: BoxStyle, block: TextBlock) -> Self {
        Self {
            style,
            content: Content::Text(block),
        }
    }

    /// Depth-first iterator over this node and its descendants.
    pub fn descendants(&self) -> impl Iterator<Item = &BoxNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            if let Content::Children(children) = &node.content {
                stack.extend(children.iter().rev());
            }
            Some(node)
        })
    }

    /// Mutable references to every image source in the tree.
    pub fn image_sources_mut(&mut self) -> Vec<&mut String> {
        let mut sources = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match &mut node.content {
                Content::Children(children) => stack.extend(children.iter_mut()),
                Content::Image { src } => sources.push(src),
                Content::Text(_) | Content::Empty => {}
            }
        }
        sources
    }
}

/// A complete card: canvas size plus the box tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CardDescription {
    pub width: u32,
    pub height: u32,
    pub root: BoxNode,
}

impl CardDescription {
    /// All text blocks in document order.
    pub fn text_blocks(&self) -> impl Iterator<Item = &TextBlock> {
        self.root.descendants().filter_map(|node| match &node.content {
            Content::Text(block) => Some(block),
            _ => None,
        })
    }
}

/// Build the card description for the given metadata and variant.
///
/// Missing title and description fall back to [`DEFAULT_TITLE`] and
/// [`DEFAULT_DESCRIPTION`]; a missing image becomes a grey "No Image" block.
pub fn compose(metadata: &CardMetadata, variant: CardVariant) -> CardDescription {
    let title = non_empty(metadata.title.as_deref()).unwrap_or(DEFAULT_TITLE);
    let description = non_empty(metadata.description.as_deref()).unwrap_or(DEFAULT_DESCRIPTION);

    let text_column = BoxNode::container(
        BoxStyle {
            direction: Direction::Column,
            flex_grow: 1.0,
            flex_shrink: 1.0,
            padding: 40.0,
            justify_content: Some(Align::Center),
            ..Default::default()
        },
        vec![
            BoxNode::text(
                BoxStyle {
                    margin_bottom: 16.0,
                    ..Default::default()
                },
                TextBlock {
                    text: title.to_string(),
                    font_size: 36.0,
                    bold: true,
                    color: TITLE_COLOR,
                    max_lines: variant.title_lines(),
                    line_height: 1.2,
                },
            ),
            BoxNode::text(
                BoxStyle::default(),
                TextBlock {
                    text: description.to_string(),
                    font_size: 24.0,
                    bold: false,
                    color: DESCRIPTION_COLOR,
                    max_lines: variant.description_lines(),
                    line_height: 1.4,
                },
            ),
        ],
    );

    let (direction, image_width, image_height) = match variant {
        CardVariant::Landscape => (
            Direction::Row,
            Length::Px(variant.image_extent()),
            Length::Percent(1.0),
        ),
        CardVariant::Portrait | CardVariant::Compact => (
            Direction::Column,
            Length::Percent(1.0),
            Length::Px(variant.image_extent()),
        ),
    };

    let image_region = BoxNode::container(
        BoxStyle {
            width: image_width,
            height: image_height,
            align_items: Some(Align::Center),
            justify_content: Some(Align::Center),
            ..Default::default()
        },
        vec![image_content(metadata.image_url.as_deref())],
    );

    let children = match variant {
        CardVariant::Landscape => vec![text_column, image_region],
        CardVariant::Portrait | CardVariant::Compact => vec![image_region, text_column],
    };

    let root = BoxNode::container(
        BoxStyle {
            direction,
            width: Length::Px(variant.width() as f32),
            height: Length::Px(variant.height() as f32),
            background: Some(BACKGROUND),
            ..Default::default()
        },
        children,
    );

    CardDescription {
        width: variant.width(),
        height: variant.height(),
        root,
    }
}

fn image_content(image_url: Option<&str>) -> BoxNode {
    let fill = BoxStyle {
        width: Length::Percent(1.0),
        height: Length::Percent(1.0),
        ..Default::default()
    };

    match non_empty(image_url) {
        Some(src) => BoxNode {
            style: fill,
            content: Content::Image {
                src: src.to_string(),
            },
        },
        None => BoxNode::container(
            BoxStyle {
                background: Some(PLACEHOLDER_BACKGROUND),
                align_items: Some(Align::Center),
                justify_content: Some(Align::Center),
                ..fill
            },
            vec![BoxNode::text(
                BoxStyle::default(),
                TextBlock {
                    text: NO_IMAGE_TEXT.to_string(),
                    font_size: 20.0,
                    bold: false,
                    color: PLACEHOLDER_COLOR,
                    max_lines: 1,
                    line_height: 1.2,
                },
            )],
        ),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(desc: &CardDescription) -> Vec<String> {
        desc.text_blocks().map(|b| b.text.clone()).collect()
    }

    #[test]
    fn test_compose_uses_metadata() {
        let meta = CardMetadata {
            title: Some("Hello".to_string()),
            description: Some("World".to_string()),
            image_url: Some("https://example.com/a.png".to_string()),
        };
        let desc = compose(&meta, CardVariant::Landscape);
        assert_eq!(texts(&desc), vec!["Hello", "World"]);
        assert_eq!(desc.width, 1200);
        assert_eq!(desc.height, 630);
    }

    #[test]
    fn test_compose_default_title() {
        let meta = CardMetadata {
            description: Some("Only a description".to_string()),
            ..Default::default()
        };
        let desc = compose(&meta, CardVariant::Landscape);
        assert_eq!(texts(&desc)[0], DEFAULT_TITLE);
    }

    #[test]
    fn test_compose_blank_title_is_default() {
        let meta = CardMetadata {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        let desc = compose(&meta, CardVariant::Compact);
        assert_eq!(texts(&desc)[0], DEFAULT_TITLE);
        assert_eq!(texts(&desc)[1], DEFAULT_DESCRIPTION);
    }

    #[test]
    fn test_compose_placeholder_without_image() {
        let desc = compose(&CardMetadata::default(), CardVariant::Landscape);
        assert!(texts(&desc).contains(&NO_IMAGE_TEXT.to_string()));
        let mut desc = desc;
        assert!(desc.root.image_sources_mut().is_empty());
    }

    #[test]
    fn test_compose_image_source() {
        let meta = CardMetadata {
            image_url: Some("https://example.com/a.png".to_string()),
            ..Default::default()
        };
        let mut desc = compose(&meta, CardVariant::Portrait);
        let sources = desc.root.image_sources_mut();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].as_str(), "https://example.com/a.png");
        assert!(!texts(&desc).contains(&NO_IMAGE_TEXT.to_string()));
    }

    #[test]
    fn test_clamp_limits_follow_variant() {
        for variant in [
            CardVariant::Landscape,
            CardVariant::Portrait,
            CardVariant::Compact,
        ] {
            let desc = compose(&CardMetadata::default(), variant);
            let blocks: Vec<_> = desc.text_blocks().collect();
            assert_eq!(blocks[0].max_lines, 2);
            assert_eq!(blocks[1].max_lines, variant.description_lines());
            assert_eq!(desc.width, variant.width());
            assert_eq!(desc.height, variant.height());
        }
    }

    #[test]
    fn test_canvas_does_not_depend_on_content() {
        let long = CardMetadata {
            title: Some("x".repeat(5000)),
            ..Default::default()
        };
        let a = compose(&long, CardVariant::Portrait);
        let b = compose(&CardMetadata::default(), CardVariant::Portrait);
        assert_eq!((a.width, a.height), (b.width, b.height));
    }

    #[test]
    fn test_variant_from_str() {
        assert_eq!("Portrait".parse::<CardVariant>(), Ok(CardVariant::Portrait));
        assert_eq!(" compact ".parse::<CardVariant>(), Ok(CardVariant::Compact));
        assert!("square".parse::<CardVariant>().is_err());
        assert_eq!(CardVariant::default().to_string(), "landscape");
    }
}
