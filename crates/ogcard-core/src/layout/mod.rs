//! Flexbox layout of a [`CardDescription`] into SVG.
//!
//! The box tree is mirrored into a `taffy` tree. Text blocks are leaves whose
//! size comes from a measure function that wraps and clamps the text with the
//! loaded font. After layout the tree is flattened into a [`Frame`] of
//! absolutely positioned items, which [`svg`] writes out, asking the
//! [`GlyphResolver`] for emoji as it goes.

mod svg;
pub mod text;

use taffy::prelude::*;
use taffy::{Overflow, Point};

use crate::card::{Align, BoxNode, CardDescription, Color, Content, Direction, Length, TextBlock};
use crate::error::Result;
use crate::glyph::GlyphResolver;

pub use text::{Cluster, FontFace, Line, Shaper};

/// Rounding slack when re-breaking text at its final (rounded) width.
const WIDTH_TOLERANCE: f32 = 1.0;

/// An absolutely positioned drawing primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Color,
    },
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        href: String,
    },
    Text(TextItem),
}

/// A laid-out text block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub bold: bool,
    pub color: Color,
    /// Line box height in pixels.
    pub line_height: f32,
    /// Offset from a line box's top to its baseline.
    pub baseline: f32,
    pub lines: Vec<Line>,
}

/// The flattened result of a layout pass, in paint order.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub items: Vec<Item>,
}

/// Lay out `desc` and write it as an SVG document.
pub async fn render_svg<R>(desc: &CardDescription, font_data: &[u8], resolver: &R) -> Result<String>
where
    R: GlyphResolver + Sync,
{
    let (frame, family) = {
        let font = FontFace::parse(font_data)?;
        (compute(desc, &font)?, font.family().to_string())
    };
    svg::write(&frame, &family, resolver).await
}

/// Run the flexbox pass and flatten the result.
pub fn compute(desc: &CardDescription, font: &FontFace<'_>) -> Result<Frame> {
    let mut tree: TaffyTree<&TextBlock> = TaffyTree::new();
    let root = build(&mut tree, &desc.root)?;

    let available = Size {
        width: AvailableSpace::Definite(desc.width as f32),
        height: AvailableSpace::Definite(desc.height as f32),
    };
    tree.compute_layout_with_measure(root, available, |known, available, _node, block, _style| {
        match block {
            Some(block) => measure(font, block, known, available),
            None => Size::ZERO,
        }
    })?;

    let mut items = Vec::new();
    flatten(&tree, root, &desc.root, (0.0, 0.0), font, &mut items)?;

    Ok(Frame {
        width: desc.width,
        height: desc.height,
        items,
    })
}

fn build<'d>(tree: &mut TaffyTree<&'d TextBlock>, node: &'d BoxNode) -> Result<NodeId> {
    let style = to_taffy(node);
    let id = match &node.content {
        Content::Children(children) => {
            let ids = children
                .iter()
                .map(|child| build(tree, child))
                .collect::<Result<Vec<_>>>()?;
            tree.new_with_children(style, &ids)?
        }
        Content::Text(block) => tree.new_leaf_with_context(style, block)?,
        Content::Image { .. } | Content::Empty => tree.new_leaf(style)?,
    };
    Ok(id)
}

fn to_taffy(node: &BoxNode) -> Style {
    let s = &node.style;
    let overflow = match node.content {
        Content::Children(_) => Overflow::Hidden,
        _ => Overflow::Visible,
    };

    Style {
        display: Display::Flex,
        flex_direction: match s.direction {
            Direction::Row => FlexDirection::Row,
            Direction::Column => FlexDirection::Column,
        },
        size: Size {
            width: dimension(s.width),
            height: dimension(s.height),
        },
        flex_grow: s.flex_grow,
        flex_shrink: s.flex_shrink,
        padding: Rect {
            left: LengthPercentage::length(s.padding),
            right: LengthPercentage::length(s.padding),
            top: LengthPercentage::length(s.padding),
            bottom: LengthPercentage::length(s.padding),
        },
        margin: Rect {
            left: LengthPercentageAuto::length(0.0),
            right: LengthPercentageAuto::length(0.0),
            top: LengthPercentageAuto::length(0.0),
            bottom: LengthPercentageAuto::length(s.margin_bottom),
        },
        align_items: s.align_items.map(|a| match a {
            Align::Start => AlignItems::FlexStart,
            Align::Center => AlignItems::Center,
            Align::End => AlignItems::FlexEnd,
            Align::Stretch => AlignItems::Stretch,
        }),
        justify_content: s.justify_content.map(|a| match a {
            Align::Start => JustifyContent::FlexStart,
            Align::Center => JustifyContent::Center,
            Align::End => JustifyContent::FlexEnd,
            Align::Stretch => JustifyContent::Stretch,
        }),
        overflow: Point {
            x: overflow,
            y: overflow,
        },
        ..Default::default()
    }
}

fn dimension(length: Length) -> Dimension {
    match length {
        Length::Auto => Dimension::auto(),
        Length::Px(px) => Dimension::length(px),
        Length::Percent(fraction) => Dimension::percent(fraction),
    }
}

fn measure(
    font: &FontFace<'_>,
    block: &TextBlock,
    known: Size<Option<f32>>,
    available: Size<AvailableSpace>,
) -> Size<f32> {
    let max_width = known.width.unwrap_or(match available.width {
        AvailableSpace::Definite(width) => width,
        AvailableSpace::MinContent => 0.0,
        AvailableSpace::MaxContent => f32::INFINITY,
    });

    let lines = Shaper::new(font, block.font_size).break_lines(&block.text, max_width, block.max_lines);
    let widest = lines.iter().map(Line::width).fold(0.0, f32::max);

    Size {
        width: known.width.unwrap_or(widest.ceil()),
        height: known
            .height
            .unwrap_or(lines.len() as f32 * block.font_size * block.line_height),
    }
}

fn flatten(
    tree: &TaffyTree<&TextBlock>,
    id: NodeId,
    node: &BoxNode,
    origin: (f32, f32),
    font: &FontFace<'_>,
    items: &mut Vec<Item>,
) -> Result<()> {
    let layout = tree.layout(id)?;
    let x = origin.0 + layout.location.x;
    let y = origin.1 + layout.location.y;
    let (width, height) = (layout.size.width, layout.size.height);

    if let Some(fill) = node.style.background {
        items.push(Item::Rect {
            x,
            y,
            width,
            height,
            fill,
        });
    }

    match &node.content {
        Content::Children(children) => {
            for (child_id, child) in tree.children(id)?.into_iter().zip(children) {
                flatten(tree, child_id, child, (x, y), font, items)?;
            }
        }
        Content::Text(block) => {
            let line_height = block.font_size * block.line_height;
            let lines = Shaper::new(font, block.font_size).break_lines(
                &block.text,
                width + WIDTH_TOLERANCE,
                block.max_lines,
            );
            items.push(Item::Text(TextItem {
                x: x + layout.padding.left,
                y: y + layout.padding.top,
                font_size: block.font_size,
                bold: block.bold,
                color: block.color,
                line_height,
                baseline: font.baseline_offset(block.font_size, line_height),
                lines,
            }));
        }
        Content::Image { src } => items.push(Item::Image {
            x,
            y,
            width,
            height,
            href: src.clone(),
        }),
        Content::Empty => {}
    }

    Ok(())
}
