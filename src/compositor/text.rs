//! Pre-formatted text layout inside an element box.
//!
//! Source line breaks are authoritative: nothing is re-wrapped. The block of
//! lines is centered vertically in the box and each line is anchored
//! according to the element's alignment.

use serde::Serialize;

use crate::template::{TextAlign, TextContent};

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.1;

/// Baseline position within a line box, as a fraction of the line height.
const BASELINE_RATIO: f64 = 0.8;

/// Inner padding of a text box in page units.
pub const TEXT_PADDING: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub text: String,
    /// Baseline offset from the top of the element box (screen units).
    pub baseline: f64,
}

/// Screen-space layout of a text element, relative to its box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLayout {
    pub font_family: String,
    pub font_size: f64,
    pub line_height: f64,
    pub align: TextAlign,
    /// Horizontal anchor offset from the left of the box (screen units).
    pub anchor_x: f64,
    pub lines: Vec<TextLine>,
}

impl TextLayout {
    /// Lay out `text` in a box of `box_width` x `box_height` screen units.
    pub fn new(
        text: &TextContent,
        align: TextAlign,
        box_width: f64,
        box_height: f64,
        scale: f64,
    ) -> Self {
        let font_size = text.font_size * scale;
        let line_height = font_size * LINE_HEIGHT;
        let padding = TEXT_PADDING * scale;

        let raw_lines: Vec<&str> = text
            .content
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();

        let block_height = raw_lines.len() as f64 * line_height;
        let first_top = (box_height - block_height) / 2.0;

        let lines = raw_lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| TextLine {
                text: line.to_string(),
                baseline: first_top + i as f64 * line_height + line_height * BASELINE_RATIO,
            })
            .collect();

        let anchor_x = match align {
            TextAlign::Left => padding,
            TextAlign::Center => box_width / 2.0,
            TextAlign::Right => box_width - padding,
        };

        Self {
            font_family: text.font_family.clone(),
            font_size,
            line_height,
            align,
            anchor_x,
            lines,
        }
    }
}
