//! Mapping recognised tokens back onto page geometry.
//!
//! The page text is indexed as one whitespace-free string; every char keeps
//! the span it came from and its position inside that span's clean text, so
//! a match range decomposes into exact per-span sub-rectangles.

use std::ops::Range;

use crate::model::{Rect, TextSpan};
use crate::sanitize::sanitize;

/// Padding around the union of a token's rectangles used for placement.
pub const DETECTION_PADDING: f32 = 1.5;
/// Extra slack when looking for the table cell a token sits in.
pub const CELL_SEARCH_MARGIN: (f32, f32) = (18.0, 12.0);

#[derive(Clone, Debug, PartialEq)]
pub struct SpanRecord {
    pub rect: Rect,
    pub raw_text: String,
    pub clean_text: String,
    clean_len: usize,
    /// Position of the originating span in the page's span list.
    pub source: usize,
}

#[derive(Clone, Debug, Default)]
pub struct PageTextIndex {
    pub concatenated_clean: String,
    pub char_to_span: Vec<usize>,
    pub char_to_pos_in_span: Vec<usize>,
    pub spans: Vec<SpanRecord>,
}

/// Font family, size and unit-range color of the text a field replaces.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f32,
    pub color: [f32; 3],
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle {
            font_family: "Helvetica".to_string(),
            font_size: 12.0,
            color: [0.0, 0.0, 0.0],
        }
    }
}

pub fn unpack_color(packed: u32) -> [f32; 3] {
    let r = (packed >> 16) & 0xFF;
    let g = (packed >> 8) & 0xFF;
    let b = packed & 0xFF;
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
}

impl TextStyle {
    pub fn from_span(span: &TextSpan) -> Self {
        TextStyle {
            font_family: span.font_family.clone(),
            font_size: span.font_size,
            color: unpack_color(span.color),
        }
    }
}

/// Where a field goes and what text it erases.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementRegion {
    /// Padded union of the token's rectangles.
    pub detection_rect: Rect,
    /// Unpadded per-span rectangles covering only the token text.
    pub redact_rects: Vec<Rect>,
    pub is_table_cell: bool,
    /// Table cell when one was found, otherwise `detection_rect`.
    pub placement_rect: Rect,
}

/// Index the spans of one page.
pub fn build_index(spans: &[TextSpan]) -> PageTextIndex {
    let mut index = PageTextIndex::default();
    for (source, span) in spans.iter().enumerate() {
        let clean_text: String = sanitize(&span.text)
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if clean_text.is_empty() {
            continue;
        }
        let span_idx = index.spans.len();
        let mut clean_len = 0;
        for (pos, c) in clean_text.chars().enumerate() {
            index.concatenated_clean.push(c);
            index.char_to_span.push(span_idx);
            index.char_to_pos_in_span.push(pos);
            clean_len += 1;
        }
        index.spans.push(SpanRecord {
            rect: span.rect,
            raw_text: span.text.clone(),
            clean_text,
            clean_len,
            source,
        });
    }
    index
}

/// Sub-rectangle of a span covering clean chars `start..end`, by proportional
/// char width. Interior edges move half a char inwards so neighbouring text
/// that stays on the page is not clipped.
pub fn partial_span_rect(rect: Rect, total_chars: usize, start: usize, end: usize) -> Rect {
    if total_chars == 0 || (start == 0 && end >= total_chars) {
        return rect;
    }
    let char_width = rect.width() / total_chars as f32;
    let margin = char_width * 0.5;

    let mut x0 = rect.x0 + start as f32 * char_width;
    let mut x1 = rect.x0 + end as f32 * char_width;
    if start > 0 {
        x0 += margin;
    }
    if end < total_chars {
        x1 -= margin;
    }
    if x1 <= x0 {
        x1 = x0 + char_width;
    }
    Rect::new(x0, rect.y0, x1, rect.y1)
}

fn union_all(rects: &[Rect]) -> Option<Rect> {
    let (first, rest) = rects.split_first()?;
    Some(rest.iter().fold(*first, |acc, r| acc.union(r)))
}

impl PageTextIndex {
    pub fn is_empty(&self) -> bool {
        self.concatenated_clean.is_empty()
    }

    /// Per-span (span index, first pos, end pos) in first-seen order.
    fn span_ranges(&self, range: Range<usize>) -> Vec<(usize, usize, usize)> {
        let mut ranges: Vec<(usize, usize, usize)> = Vec::new();
        for i in range {
            let (Some(&span), Some(&pos)) = (self.char_to_span.get(i), self.char_to_pos_in_span.get(i))
            else {
                continue;
            };
            match ranges.iter_mut().find(|(s, _, _)| *s == span) {
                Some(entry) => {
                    entry.1 = entry.1.min(pos);
                    entry.2 = entry.2.max(pos + 1);
                }
                None => ranges.push((span, pos, pos + 1)),
            }
        }
        ranges
    }

    /// Rectangles for the clean-text char range `range`. `None` when no char
    /// of the range maps onto a span.
    pub fn resolve(&self, range: Range<usize>, padding: f32) -> Option<PlacementRegion> {
        let redact_rects: Vec<Rect> = self
            .span_ranges(range)
            .into_iter()
            .filter_map(|(span, start, end)| {
                let record = self.spans.get(span)?;
                Some(partial_span_rect(record.rect, record.clean_len, start, end))
            })
            .collect();
        let detection_rect = union_all(&redact_rects)?.expand(padding, padding);
        Some(PlacementRegion {
            detection_rect,
            redact_rects,
            is_table_cell: false,
            placement_rect: detection_rect,
        })
    }

    /// Index into the page's span list of the span holding clean char `offset`.
    pub fn source_span(&self, offset: usize) -> Option<usize> {
        let span = *self.char_to_span.get(offset)?;
        self.spans.get(span).map(|r| r.source)
    }
}

/// Pick the table cell overlapping the (margin-expanded) detection rectangle
/// the most. Equal areas keep the first cell seen.
pub fn best_cell(detection_rect: Rect, cells: &[Rect], margin: (f32, f32)) -> Option<Rect> {
    let search = detection_rect.expand(margin.0, margin.1);
    let mut best: Option<(Rect, f32)> = None;
    for cell in cells {
        let Some(overlap) = cell.intersect(&search) else { continue };
        let area = overlap.area();
        if area > best.map_or(0.0, |(_, a)| a) {
            best = Some((*cell, area));
        }
    }
    best.map(|(cell, _)| cell)
}

impl PlacementRegion {
    /// Snap the placement onto the best table cell, if any.
    pub fn reconcile(mut self, cells: &[Rect], margin: (f32, f32)) -> Self {
        match best_cell(self.detection_rect, cells, margin) {
            Some(cell) => {
                self.placement_rect = cell;
                self.is_table_cell = true;
            }
            None => {
                self.placement_rect = self.detection_rect;
                self.is_table_cell = false;
            }
        }
        self
    }
}
